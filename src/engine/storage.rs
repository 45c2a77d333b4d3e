//! LITEKV - SQLite Storage Adapter
//! Thin layer over a single SQLite connection and the entries table.
//!
//! ## Schema
//! ```text
//! CREATE TABLE <table> (
//!     key      TEXT PRIMARY KEY,
//!     value    TEXT NOT NULL,       -- JSON-encoded value
//!     expiry   INTEGER,             -- ms since epoch, NULL = never
//!     one_time INTEGER NOT NULL DEFAULT 0
//! )
//! ```
//!
//! The adapter knows nothing about merging or expiry rules; it stores and
//! returns raw rows. Transactions are plain `BEGIN IMMEDIATE` / `COMMIT`
//! statements so that the open transaction can outlive a single call.

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};

use crate::config::{Config, JournalMode};
use crate::error::Result;
use crate::types::StoredRow;

pub struct SqliteStorage {
    conn: Connection,
    table: String,
    path: Option<PathBuf>,
    log_queries: bool,
}

impl SqliteStorage {
    /// Open the database described by `config` and create the table.
    pub fn open(config: &Config) -> Result<Self> {
        config.validate()?;
        config.ensure_dirs()?;

        let path = config.db_path();
        let conn = match &path {
            Some(path) => Connection::open(path)?,
            None => Connection::open_in_memory()?,
        };
        conn.busy_timeout(config.busy_timeout)?;

        let storage = Self {
            conn,
            table: config.table_name.clone(),
            path,
            log_queries: config.log_queries,
        };
        storage.set_journal_mode(config.journal_mode)?;
        storage.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} (\
                key TEXT PRIMARY KEY, \
                value TEXT NOT NULL, \
                expiry INTEGER, \
                one_time INTEGER NOT NULL DEFAULT 0)",
            storage.table
        ))?;

        Ok(storage)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn log_sql(&self, sql: &str) {
        if self.log_queries {
            log::debug!("[sql] {}", sql);
        }
    }

    fn execute_batch(&self, sql: &str) -> Result<()> {
        self.log_sql(sql);
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    /// Fetch the raw row for `key`.
    pub fn get_raw(&self, key: &str) -> Result<Option<StoredRow>> {
        let sql = format!(
            "SELECT value, expiry, one_time FROM {} WHERE key = ?1",
            self.table
        );
        self.log_sql(&sql);
        let row = self
            .conn
            .prepare_cached(&sql)?
            .query_row(params![key], |row| {
                Ok(StoredRow {
                    value: row.get(0)?,
                    expiry: row.get(1)?,
                    one_time: row.get(2)?,
                })
            })
            .optional()?;
        Ok(row)
    }

    /// Insert or replace the row for `key`.
    pub fn put_raw(
        &self,
        key: &str,
        value: &str,
        expiry: Option<i64>,
        one_time: bool,
    ) -> Result<()> {
        let sql = format!(
            "INSERT INTO {} (key, value, expiry, one_time) VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT(key) DO UPDATE SET \
             value = excluded.value, expiry = excluded.expiry, one_time = excluded.one_time",
            self.table
        );
        self.log_sql(&sql);
        self.conn
            .prepare_cached(&sql)?
            .execute(params![key, value, expiry, one_time])?;
        Ok(())
    }

    /// Delete the row for `key`. Returns whether a row was removed.
    pub fn delete_raw(&self, key: &str) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE key = ?1", self.table);
        self.log_sql(&sql);
        let removed = self.conn.prepare_cached(&sql)?.execute(params![key])?;
        Ok(removed > 0)
    }

    /// Keys in ascending order, optionally filtered by a `LIKE` pattern
    /// (`%` any run, `_` one character; ASCII case-insensitive).
    pub fn scan_keys(&self, pattern: Option<&str>) -> Result<Vec<String>> {
        let sql = match pattern {
            Some(_) => format!("SELECT key FROM {} WHERE key LIKE ?1 ORDER BY key", self.table),
            None => format!("SELECT key FROM {} ORDER BY key", self.table),
        };
        self.log_sql(&sql);
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let keys = match pattern {
            Some(pattern) => stmt
                .query_map(params![pattern], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?,
            None => stmt
                .query_map([], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?,
        };
        Ok(keys)
    }

    /// Every row, ordered by key.
    pub fn scan_rows(&self) -> Result<Vec<(String, StoredRow)>> {
        let sql = format!(
            "SELECT key, value, expiry, one_time FROM {} ORDER BY key",
            self.table
        );
        self.log_sql(&sql);
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get(0)?,
                    StoredRow {
                        value: row.get(1)?,
                        expiry: row.get(2)?,
                        one_time: row.get(3)?,
                    },
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Remove every row whose expiry is before `now`. Returns the count.
    pub fn purge_expired(&self, now: i64) -> Result<usize> {
        let sql = format!(
            "DELETE FROM {} WHERE expiry IS NOT NULL AND expiry < ?1",
            self.table
        );
        self.log_sql(&sql);
        Ok(self.conn.prepare_cached(&sql)?.execute(params![now])?)
    }

    pub fn count(&self) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);
        self.log_sql(&sql);
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Delete every row. Returns the number removed.
    pub fn clear_all(&self) -> Result<usize> {
        let sql = format!("DELETE FROM {}", self.table);
        self.log_sql(&sql);
        Ok(self.conn.execute(&sql, [])?)
    }

    pub fn begin(&self) -> Result<()> {
        self.execute_batch("BEGIN IMMEDIATE")
    }

    pub fn commit(&self) -> Result<()> {
        self.execute_batch("COMMIT")
    }

    pub fn rollback(&self) -> Result<()> {
        self.execute_batch("ROLLBACK")
    }

    /// Current journal mode as reported by SQLite.
    pub fn journal_mode(&self) -> Result<JournalMode> {
        let sql = "PRAGMA journal_mode";
        self.log_sql(sql);
        let mode: String = self.conn.query_row(sql, [], |row| row.get(0))?;
        mode.parse()
    }

    /// Request a journal mode and return the one SQLite actually applied.
    /// In-memory databases only accept MEMORY and OFF.
    pub fn set_journal_mode(&self, mode: JournalMode) -> Result<JournalMode> {
        let sql = format!("PRAGMA journal_mode = {}", mode.as_str());
        self.log_sql(&sql);
        let applied: String = self.conn.query_row(&sql, [], |row| row.get(0))?;
        applied.parse()
    }

    /// Size of the main database file in bytes, 0 when there is none.
    pub fn file_size(&self) -> Result<u64> {
        match &self.path {
            Some(path) => match std::fs::metadata(path) {
                Ok(meta) => Ok(meta.len()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
                Err(e) => Err(e.into()),
            },
            None => Ok(0),
        }
    }

    /// Close the connection, rolling back anything uncommitted.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| e.into())
    }
}
