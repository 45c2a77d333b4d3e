//! LITEKV - Key-Value Store on embedded SQLite
//!
//! A persistent map without a database server: JSON values in a single
//! SQLite table, with merge-on-write, expiring keys and read-once keys.
//!
//! ## Features
//! - **Typed values**: strings, numbers, booleans, arrays and objects keep
//!   their type through storage
//! - **Merge-on-write**: arrays append, objects shallow-merge, the rest replaces
//! - **TTL Support**: Redis-like `setex` with lazy expiry on read
//! - **One-time keys**: deleted by the first read that returns them
//! - **Transactions**: auto-commit per call, or caller-managed batches
//! - **Metrics**: Lock-free atomic counters for observability
//! - **Concurrency**: Thread-safe Arc + Mutex wrapper
//!
//! ## Example
//! ```no_run
//! use litekv::{config::Config, engine::LiteKv, Value};
//!
//! let mut store = LiteKv::open(Config::new("./data/app.sqlite")).unwrap();
//!
//! store.set("tags", Value::Array(vec!["a".into()]), false).unwrap();
//! store.set("tags", Value::Array(vec!["b".into()]), false).unwrap();
//! assert_eq!(
//!     store.get("tags").unwrap(),
//!     Some(Value::Array(vec!["a".into(), "b".into()]))
//! );
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod types;

pub use config::{Config, JournalMode, StorageMode};
pub use engine::LiteKv;
pub use error::{LiteKvError, Result};
pub use types::{StoreInfo, Value};
