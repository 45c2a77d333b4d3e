//! LITEKV - Custom Error Types
//! Defines the error hierarchy for the key-value store.

use thiserror::Error;

/// Custom Result type for the LiteKv store.
pub type Result<T> = std::result::Result<T, LiteKvError>;

/// Error types for the LiteKv store.
#[derive(Error, Debug)]
pub enum LiteKvError {
    /// The storage handle is not open (the store was closed).
    #[error("Store is not initialized")]
    NotInitialized,

    /// A value could not be encoded or a stored blob could not be decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// `begin_transaction` was called while a caller transaction is open.
    #[error("A transaction is already open")]
    TransactionAlreadyOpen,

    /// Errors reported by the SQLite engine.
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// I/O errors from file operations (data directory, export).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for LiteKvError {
    fn from(err: serde_json::Error) -> Self {
        LiteKvError::Serialization(err.to_string())
    }
}
