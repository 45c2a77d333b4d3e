//! LITEKV - Store Configuration
//! Defines construction-time parameters for the key-value store.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{LiteKvError, Result};

/// SQLite journal mode (`PRAGMA journal_mode`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalMode {
    Delete,
    Truncate,
    Persist,
    Memory,
    Wal,
    Off,
}

impl JournalMode {
    /// The pragma value understood by SQLite.
    pub fn as_str(&self) -> &'static str {
        match self {
            JournalMode::Delete => "DELETE",
            JournalMode::Truncate => "TRUNCATE",
            JournalMode::Persist => "PERSIST",
            JournalMode::Memory => "MEMORY",
            JournalMode::Wal => "WAL",
            JournalMode::Off => "OFF",
        }
    }
}

impl fmt::Display for JournalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JournalMode {
    type Err = LiteKvError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "DELETE" => Ok(JournalMode::Delete),
            "TRUNCATE" => Ok(JournalMode::Truncate),
            "PERSIST" => Ok(JournalMode::Persist),
            "MEMORY" => Ok(JournalMode::Memory),
            "WAL" => Ok(JournalMode::Wal),
            "OFF" => Ok(JournalMode::Off),
            other => Err(LiteKvError::Config(format!(
                "unknown journal mode '{}'",
                other
            ))),
        }
    }
}

/// Where the database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageMode {
    /// A database file at the given path.
    Disk(PathBuf),
    /// An in-memory database, gone when the store is closed.
    Memory,
    /// A fixed file inside the system temp directory.
    Temp,
}

/// Configuration for the LiteKv store.
#[derive(Debug, Clone)]
pub struct Config {
    /// Where the database is stored.
    pub storage: StorageMode,

    /// Name of the table holding the entries. Must be a plain SQL identifier.
    pub table_name: String,

    /// Commit every mutating call immediately unless a transaction is open.
    pub auto_commit: bool,

    /// Journal mode applied when the store is opened.
    pub journal_mode: JournalMode,

    /// Log every SQL statement at debug level.
    pub log_queries: bool,

    /// How long to wait for another connection's lock before failing.
    pub busy_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageMode::Disk(PathBuf::from("./data/litekv.sqlite")),
            table_name: "litekv".to_string(),
            auto_commit: true,
            journal_mode: JournalMode::Wal,
            log_queries: false,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

impl Config {
    /// Create a new Config backed by a database file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            storage: StorageMode::Disk(path.into()),
            ..Default::default()
        }
    }

    /// Create a Config for an in-memory database.
    pub fn memory() -> Self {
        Self {
            storage: StorageMode::Memory,
            ..Default::default()
        }
    }

    /// Create a Config for the fixed temp-directory database.
    pub fn temp() -> Self {
        Self {
            storage: StorageMode::Temp,
            ..Default::default()
        }
    }

    /// Set the table name.
    pub fn with_table_name(mut self, name: impl Into<String>) -> Self {
        self.table_name = name.into();
        self
    }

    /// Enable or disable auto-commit.
    pub fn with_auto_commit(mut self, auto_commit: bool) -> Self {
        self.auto_commit = auto_commit;
        self
    }

    /// Set the journal mode applied at open.
    pub fn with_journal_mode(mut self, mode: JournalMode) -> Self {
        self.journal_mode = mode;
        self
    }

    /// Enable or disable SQL statement logging.
    pub fn with_log_queries(mut self, enabled: bool) -> Self {
        self.log_queries = enabled;
        self
    }

    /// Set the busy timeout.
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Resolved database file path, `None` for in-memory storage.
    pub fn db_path(&self) -> Option<PathBuf> {
        match &self.storage {
            StorageMode::Disk(path) => Some(path.clone()),
            StorageMode::Memory => None,
            StorageMode::Temp => Some(std::env::temp_dir().join("litekv").join("litekv.sqlite")),
        }
    }

    /// Reject configurations the store cannot open.
    pub fn validate(&self) -> Result<()> {
        if !is_identifier(&self.table_name) {
            return Err(LiteKvError::Config(format!(
                "table name '{}' is not a valid identifier",
                self.table_name
            )));
        }
        if let StorageMode::Disk(path) = &self.storage {
            if path.as_os_str().is_empty() {
                return Err(LiteKvError::Config("empty database path".to_string()));
            }
        }
        Ok(())
    }

    /// Ensure the directory holding the database file exists.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        match self.db_path().as_deref().and_then(Path::parent) {
            Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
            _ => Ok(()),
        }
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`; the table name is interpolated into SQL.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.auto_commit);
        assert_eq!(config.journal_mode, JournalMode::Wal);
        assert_eq!(config.table_name, "litekv");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_journal_mode_parse() {
        assert_eq!("wal".parse::<JournalMode>().unwrap(), JournalMode::Wal);
        assert_eq!("Truncate".parse::<JournalMode>().unwrap(), JournalMode::Truncate);
        assert_eq!(JournalMode::Persist.to_string(), "PERSIST");
        assert!("journal".parse::<JournalMode>().is_err());
    }

    #[test]
    fn test_table_name_validation() {
        assert!(Config::memory().with_table_name("kv_2").validate().is_ok());
        assert!(Config::memory().with_table_name("_cache").validate().is_ok());
        assert!(Config::memory().with_table_name("2kv").validate().is_err());
        assert!(Config::memory().with_table_name("kv; DROP").validate().is_err());
        assert!(Config::memory().with_table_name("").validate().is_err());
    }

    #[test]
    fn test_db_path() {
        assert_eq!(Config::memory().db_path(), None);
        assert_eq!(
            Config::new("/tmp/x/db.sqlite").db_path(),
            Some(PathBuf::from("/tmp/x/db.sqlite"))
        );
        let temp = Config::temp().db_path().unwrap();
        assert!(temp.starts_with(std::env::temp_dir()));
    }

    #[test]
    fn test_ensure_dirs_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(dir.path().join("nested").join("db.sqlite"));
        config.ensure_dirs().unwrap();
        assert!(dir.path().join("nested").is_dir());
    }
}
