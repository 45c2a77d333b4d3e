//! LITEKV - Shared Store Wrapper
//! Thread-safe handle around a LiteKv store using Arc + Mutex.
//!
//! ## Concurrency Model
//! A SQLite connection cannot be used from two threads at once, so every
//! call takes the same lock. Individual calls are serialized but a
//! read-modify-write spread over several calls is not; use
//! [`SharedLiteKv::transaction`] to run such a sequence under one lock
//! and one SQLite transaction.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Number;

use crate::config::Config;
use crate::error::Result;
use crate::types::Value;

use super::LiteKv;

/// Cloneable, thread-safe handle to a LiteKv store.
///
/// ## Example
/// ```no_run
/// use litekv::engine::concurrent::SharedLiteKv;
/// use litekv::config::Config;
/// use std::thread;
///
/// let store = SharedLiteKv::open(Config::memory()).unwrap();
/// store.set("hits", 0, false).unwrap();
///
/// let worker = store.clone();
/// thread::spawn(move || {
///     worker.increment("hits", 1).unwrap();
/// })
/// .join()
/// .unwrap();
///
/// assert_eq!(store.get("hits").unwrap(), Some(1.into()));
/// ```
#[derive(Clone)]
pub struct SharedLiteKv {
    inner: Arc<Mutex<LiteKv>>,
}

impl SharedLiteKv {
    /// Open a store and wrap it.
    pub fn open(config: Config) -> Result<Self> {
        Ok(Self::new(LiteKv::open(config)?))
    }

    pub fn new(store: LiteKv) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// A panic in another holder leaves the store itself consistent
    /// (SQLite rolls back), so a poisoned lock is recovered.
    fn lock(&self) -> MutexGuard<'_, LiteKv> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set(&self, key: &str, value: impl Into<Value>, one_time: bool) -> Result<bool> {
        self.lock().set(key, value, one_time)
    }

    pub fn setex(
        &self,
        key: &str,
        ttl_secs: i64,
        value: impl Into<Value>,
        one_time: bool,
    ) -> Result<bool> {
        self.lock().setex(key, ttl_secs, value, one_time)
    }

    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        self.lock().get(key)
    }

    pub fn delete(&self, key: &str) -> Result<bool> {
        self.lock().delete(key)
    }

    pub fn exists(&self, key: &str) -> Result<bool> {
        self.lock().exists(key)
    }

    pub fn increment(&self, key: &str, amount: impl Into<Number>) -> Result<Option<Value>> {
        self.lock().increment(key, amount)
    }

    pub fn size(&self) -> Result<usize> {
        self.lock().size()
    }

    /// Run `f` inside one transaction while holding the lock.
    /// Commits if `f` succeeds, rolls back otherwise.
    pub fn transaction<T>(&self, f: impl FnOnce(&mut LiteKv) -> Result<T>) -> Result<T> {
        let mut store = self.lock();
        store.begin_transaction()?;
        match f(&mut *store) {
            Ok(value) => {
                store.commit_transaction()?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = store.rollback_transaction() {
                    log::error!("Rollback after failed transaction also failed: {}", rollback);
                }
                Err(e)
            }
        }
    }

    /// Run `f` with the locked store.
    pub fn with_store<R>(&self, f: impl FnOnce(&mut LiteKv) -> R) -> R {
        f(&mut *self.lock())
    }
}
