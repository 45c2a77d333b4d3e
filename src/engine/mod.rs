//! LITEKV - Store Module
//! Top-level module for the key-value store and its components.

pub mod codec;
pub mod concurrent;
pub mod merge;
pub mod metrics;
pub mod storage;
pub mod ttl;
pub mod txn;

use std::path::{Path, PathBuf};

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Number;

use crate::config::{Config, JournalMode};
use crate::error::{LiteKvError, Result};
use crate::types::{add_numbers, Object, StoreInfo, Value};

use self::metrics::StoreMetrics;
use self::storage::SqliteStorage;
use self::ttl::ReadAction;
use self::txn::{TxnCoordinator, TxnState, WriteScope};

/// The LiteKv key-value store.
///
/// Coordinates the SQLite adapter, the merge rules, the expiry/one-time
/// policy and the transaction state for one connection.
///
/// ## Write path
/// read current row -> merge -> encode -> upsert -> commit (per policy)
///
/// ## Read path
/// read row -> expired? delete : one-time? delete after decode -> decode
pub struct LiteKv {
    /// `None` once the store has been closed.
    storage: Option<SqliteStorage>,
    txn: TxnCoordinator,
    metrics: StoreMetrics,
    config: Config,
}

impl LiteKv {
    /// Open or create a store as described by `config`.
    pub fn open(config: Config) -> Result<Self> {
        let storage = SqliteStorage::open(&config)?;

        log::info!(
            "LiteKv store opened at {} (table '{}', {} entries)",
            storage
                .path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| ":memory:".to_string()),
            storage.table(),
            storage.count()?
        );

        Ok(Self {
            storage: Some(storage),
            txn: TxnCoordinator::new(config.auto_commit),
            metrics: StoreMetrics::new(),
            config,
        })
    }

    /// Open an in-memory store with default settings.
    pub fn open_in_memory() -> Result<Self> {
        Self::open(Config::memory())
    }

    fn storage(&self) -> Result<&SqliteStorage> {
        self.storage.as_ref().ok_or(LiteKvError::NotInitialized)
    }

    /// Run one mutating call under the transaction policy.
    ///
    /// With auto-commit and no open transaction the call gets its own
    /// BEGIN/COMMIT and is rolled back if it fails. Otherwise it joins (or
    /// opens) the pending transaction and leaves it open.
    fn write<T>(
        &mut self,
        op: impl FnOnce(&SqliteStorage, &StoreMetrics) -> Result<T>,
    ) -> Result<T> {
        let storage = self.storage.as_ref().ok_or(LiteKvError::NotInitialized)?;

        let scope = self.txn.write_scope();
        if scope != WriteScope::Joined {
            if let Err(e) = storage.begin() {
                self.txn.abort_scope(scope);
                return Err(e);
            }
        }

        let result = op(storage, &self.metrics);

        if scope == WriteScope::AutoCommit {
            let finished = match &result {
                Ok(_) => storage.commit().map(|()| self.metrics.record_commit()),
                Err(_) => storage.rollback(),
            };
            if let Err(e) = finished {
                // COMMIT can fail with the transaction still open (SQLITE_BUSY)
                let _ = storage.rollback();
                return Err(e);
            }
        }

        result
    }

    /// Current value of `key` for the write path. Expired rows read as
    /// absent; one-time rows are read without being consumed.
    fn current_value(storage: &SqliteStorage, key: &str) -> Result<Option<Value>> {
        match storage.get_raw(key)? {
            Some(row) if !ttl::is_expired(row.expiry, ttl::now_ms()) => {
                Ok(Some(codec::decode(&row.value)?))
            }
            _ => Ok(None),
        }
    }

    /// Merge `incoming` into `existing`, then upsert the result with fresh
    /// metadata. Returns the stored value.
    fn store_merged(
        storage: &SqliteStorage,
        metrics: &StoreMetrics,
        key: &str,
        existing: Option<Value>,
        incoming: Value,
        expiry: Option<i64>,
        one_time: bool,
    ) -> Result<Value> {
        let merged = merge::resolve(existing, incoming);
        let encoded = codec::encode(&merged)?;
        storage.put_raw(key, &encoded, expiry, one_time)?;
        metrics.record_set(key.len(), encoded.len());
        Ok(merged)
    }

    fn write_entry(
        &mut self,
        key: &str,
        incoming: Value,
        expiry: Option<i64>,
        one_time: bool,
    ) -> Result<Value> {
        self.write(|storage, metrics| {
            let existing = Self::current_value(storage, key)?;
            Self::store_merged(storage, metrics, key, existing, incoming, expiry, one_time)
        })
    }

    /// Store `value` under `key`, merged with what is already there.
    ///
    /// Arrays append, objects shallow-merge (new keys win), everything else
    /// replaces. Any previous expiry is cleared. A one-time entry is deleted
    /// by the first `get` that returns it.
    pub fn set(&mut self, key: &str, value: impl Into<Value>, one_time: bool) -> Result<bool> {
        self.write_entry(key, value.into(), None, one_time)?;
        Ok(true)
    }

    /// Like [`set`](Self::set), expiring `ttl_secs` seconds from now.
    /// Zero or negative TTLs produce an entry that is already (or about to
    /// be) expired.
    pub fn setex(
        &mut self,
        key: &str,
        ttl_secs: i64,
        value: impl Into<Value>,
        one_time: bool,
    ) -> Result<bool> {
        let expiry = ttl::expiry_from_ttl(ttl_secs, ttl::now_ms());
        self.write_entry(key, value.into(), Some(expiry), one_time)?;
        Ok(true)
    }

    /// Read a value.
    ///
    /// An expired row is deleted and reported absent. A one-time row is
    /// deleted before its value is returned; if another connection deleted
    /// it first, this read reports absent.
    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        let storage = self.storage()?;

        let Some(row) = storage.get_raw(key)? else {
            self.metrics.record_get(None);
            return Ok(None);
        };

        match ttl::evaluate(&row, ttl::now_ms()) {
            ReadAction::Expire => {
                storage.delete_raw(key)?;
                log::debug!("Key '{}' expired on read", key);
                self.metrics.record_expirations(1);
                self.metrics.record_get(None);
                Ok(None)
            }
            ReadAction::Consume => {
                let value = codec::decode(&row.value)?;
                if !storage.delete_raw(key)? {
                    self.metrics.record_get(None);
                    return Ok(None);
                }
                self.txn.note_consumed(key);
                log::debug!("One-time key '{}' consumed", key);
                self.metrics.record_one_time_read();
                self.metrics.record_get(Some(row.value.len()));
                Ok(Some(value))
            }
            ReadAction::Keep => {
                let value = codec::decode(&row.value)?;
                self.metrics.record_get(Some(row.value.len()));
                Ok(Some(value))
            }
        }
    }

    /// Read a value and deserialize it into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key)? {
            Some(value) => Ok(Some(serde_json::from_value(value.into())?)),
            None => Ok(None),
        }
    }

    /// Serialize `value` and [`set`](Self::set) it.
    pub fn set_as<T: Serialize>(&mut self, key: &str, value: &T, one_time: bool) -> Result<bool> {
        let value = Value::try_from(serde_json::to_value(value)?)?;
        self.set(key, value, one_time)
    }

    /// Read several keys. The result is aligned with `keys`; absent keys
    /// yield `None` at their position.
    pub fn mget<I, K>(&self, keys: I) -> Result<Vec<Option<Value>>>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        keys.into_iter().map(|key| self.get(key.as_ref())).collect()
    }

    /// Delete a key. Returns `false` if it was missing or already expired.
    pub fn delete(&mut self, key: &str) -> Result<bool> {
        self.write(|storage, metrics| {
            let live = storage
                .get_raw(key)?
                .map_or(false, |row| !ttl::is_expired(row.expiry, ttl::now_ms()));
            let removed = storage.delete_raw(key)? && live;
            if removed {
                metrics.record_delete();
            }
            Ok(removed)
        })
    }

    /// Whether a live entry exists. Deletes the row if it has expired;
    /// never consumes a one-time entry.
    pub fn exists(&self, key: &str) -> Result<bool> {
        let storage = self.storage()?;
        match storage.get_raw(key)? {
            Some(row) if ttl::is_expired(row.expiry, ttl::now_ms()) => {
                storage.delete_raw(key)?;
                self.metrics.record_expirations(1);
                Ok(false)
            }
            Some(_) => Ok(true),
            None => Ok(false),
        }
    }

    /// Live keys in ascending order, optionally filtered by a SQL `LIKE`
    /// pattern (`%` matches any run, `_` a single character).
    pub fn keys(&self, pattern: Option<&str>) -> Result<Vec<String>> {
        let storage = self.storage()?;
        self.purge_expired(storage)?;
        storage.scan_keys(pattern)
    }

    /// Remaining lifetime in milliseconds, `None` if the key is missing,
    /// has no expiry or has already expired. Never deletes.
    pub fn ttl(&self, key: &str) -> Result<Option<u64>> {
        let row = self.storage()?.get_raw(key)?;
        Ok(row.and_then(|row| ttl::remaining_ttl(row.expiry, ttl::now_ms())))
    }

    /// Add `amount` to a numeric value and return the new value.
    ///
    /// Missing, expired and non-numeric keys are left untouched and yield
    /// `None`. The new value is written like a plain [`set`](Self::set), so
    /// any expiry or one-time flag is cleared.
    pub fn increment(&mut self, key: &str, amount: impl Into<Number>) -> Result<Option<Value>> {
        let amount = amount.into();
        self.write(|storage, metrics| {
            let Some(Value::Number(current)) = Self::current_value(storage, key)? else {
                return Ok(None);
            };
            let sum = add_numbers(&current, &amount).ok_or_else(|| {
                LiteKvError::Serialization(format!(
                    "{} + {} is not a finite number",
                    current, amount
                ))
            })?;
            let stored = Self::store_merged(
                storage,
                metrics,
                key,
                Some(Value::Number(current)),
                Value::Number(sum),
                None,
                false,
            )?;
            Ok(Some(stored))
        })
    }

    /// Rewrite an object value with `f` and return what was stored.
    ///
    /// The result goes through the object merge rule, so the stored object
    /// is `existing` overlaid with `f(existing)`: keys that `f` removes are
    /// kept. Missing or non-object values yield `None` without calling `f`.
    pub fn update_json<F>(&mut self, key: &str, f: F) -> Result<Option<Value>>
    where
        F: FnOnce(Object) -> Object,
    {
        self.write(|storage, metrics| {
            let Some(Value::Object(current)) = Self::current_value(storage, key)? else {
                return Ok(None);
            };
            let updated = f(current.clone());
            let stored = Self::store_merged(
                storage,
                metrics,
                key,
                Some(Value::Object(current)),
                Value::Object(updated),
                None,
                false,
            )?;
            Ok(Some(stored))
        })
    }

    /// Delete every entry.
    pub fn clear(&mut self) -> Result<bool> {
        let removed = self.write(|storage, _| storage.clear_all())?;
        log::info!("Cleared {} entries", removed);
        Ok(true)
    }

    /// Number of live entries.
    pub fn size(&self) -> Result<usize> {
        let storage = self.storage()?;
        self.purge_expired(storage)?;
        storage.count()
    }

    fn purge_expired(&self, storage: &SqliteStorage) -> Result<()> {
        let purged = storage.purge_expired(ttl::now_ms())?;
        if purged > 0 {
            log::debug!("Removed {} expired entries", purged);
            self.metrics.record_expirations(purged);
        }
        Ok(())
    }

    /// Export every live entry as one JSON object to `path` (default: the
    /// database path with a `.json` extension, or `<table>.json` in the
    /// working directory for in-memory stores). One-time entries are
    /// exported without being consumed.
    ///
    /// Returns `false` instead of an error if anything goes wrong.
    pub fn convert_to_json(&self, path: Option<&Path>) -> bool {
        match self.export_json(path) {
            Ok(target) => {
                log::info!("Exported store to {}", target.display());
                true
            }
            Err(e) => {
                log::error!("JSON export failed: {}", e);
                false
            }
        }
    }

    fn export_json(&self, path: Option<&Path>) -> Result<PathBuf> {
        let storage = self.storage()?;
        self.purge_expired(storage)?;

        let mut document = serde_json::Map::new();
        for (key, row) in storage.scan_rows()? {
            document.insert(key, codec::decode(&row.value)?.into());
        }

        let target = match path {
            Some(path) => path.to_path_buf(),
            None => match storage.path() {
                Some(db) => db.with_extension("json"),
                None => PathBuf::from(format!("{}.json", storage.table())),
            },
        };
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, serde_json::to_string_pretty(&document)?)?;
        Ok(target)
    }

    /// Open a caller-managed transaction. Writes stop committing on their
    /// own until [`commit_transaction`](Self::commit_transaction).
    ///
    /// With auto-commit off, writes already pending in the implicit batch
    /// become part of this transaction. Fails with
    /// [`LiteKvError::TransactionAlreadyOpen`] if one is already open.
    pub fn begin_transaction(&mut self) -> Result<()> {
        let storage = self.storage.as_ref().ok_or(LiteKvError::NotInitialized)?;
        if self.txn.begin()? {
            if let Err(e) = storage.begin() {
                self.txn.finish();
                return Err(e);
            }
        }
        Ok(())
    }

    /// Commit the open transaction, if any.
    pub fn commit_transaction(&mut self) -> Result<()> {
        let storage = self.storage.as_ref().ok_or(LiteKvError::NotInitialized)?;
        if self.txn.is_open() {
            storage.commit()?;
            self.txn.finish();
            self.metrics.record_commit();
        }
        Ok(())
    }

    /// Discard the open transaction, if any.
    ///
    /// One-time keys read inside the transaction stay consumed: the
    /// rollback restores their rows, so they are deleted again afterwards
    /// in SQLite autocommit mode.
    pub fn rollback_transaction(&mut self) -> Result<()> {
        let storage = self.storage.as_ref().ok_or(LiteKvError::NotInitialized)?;
        if self.txn.is_open() {
            storage.rollback()?;
            let consumed = self.txn.take_consumed();
            self.txn.finish();
            for key in &consumed {
                storage.delete_raw(key)?;
            }
            if !consumed.is_empty() {
                log::debug!("Re-deleted {} one-time keys after rollback", consumed.len());
            }
        }
        Ok(())
    }

    pub fn journal_mode(&self) -> Result<JournalMode> {
        self.storage()?.journal_mode()
    }

    /// Switch journal mode; returns the mode SQLite actually applied.
    pub fn set_journal_mode(&mut self, mode: JournalMode) -> Result<JournalMode> {
        let applied = self.storage()?.set_journal_mode(mode)?;
        if applied != mode {
            log::warn!("Requested journal mode {} but SQLite kept {}", mode, applied);
        } else {
            log::info!("Journal mode set to {}", applied);
        }
        Ok(applied)
    }

    pub fn info(&self) -> Result<StoreInfo> {
        let storage = self.storage()?;
        let path = storage.path().map(Path::to_path_buf);
        Ok(StoreInfo {
            journal_mode: storage.journal_mode()?,
            filename: path
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|name| name.to_string_lossy().into_owned()),
            path,
            table_name: storage.table().to_string(),
            size_bytes: storage.file_size()?,
            key_count: self.size()?,
        })
    }

    /// Release the connection. A still-open transaction is committed first.
    /// Later operations fail with [`LiteKvError::NotInitialized`]; closing
    /// again is a no-op. The returned buffer is always empty.
    pub fn close(&mut self) -> Result<Bytes> {
        let Some(storage) = self.storage.take() else {
            return Ok(Bytes::new());
        };

        if self.txn.finish() {
            log::warn!("Closing store with an open transaction; committing it");
            storage.commit()?;
            self.metrics.record_commit();
        }
        storage.close()?;

        log::info!("LiteKv store closed");
        Ok(Bytes::new())
    }

    pub fn is_open(&self) -> bool {
        self.storage.is_some()
    }

    pub fn transaction_state(&self) -> TxnState {
        self.txn.state()
    }

    pub fn metrics(&self) -> &StoreMetrics {
        &self.metrics
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for LiteKv {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::error!("Failed to close store cleanly: {}", e);
        }
    }
}
