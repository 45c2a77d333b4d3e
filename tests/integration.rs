//! LITEKV - Integration Tests
//! End-to-end tests against on-disk stores:
//! open → set/merge → get → expiry → one-time → transactions → export → close.

use std::thread;
use std::time::Duration;

use litekv::config::{Config, JournalMode, StorageMode};
use litekv::engine::LiteKv;
use litekv::error::LiteKvError;
use litekv::types::Value;
use serde_json::json;

mod common {
    /// Create a Config pointing at a database inside a temporary directory.
    pub fn temp_config(dir: &std::path::Path) -> litekv::config::Config {
        litekv::config::Config::new(dir.join("store.sqlite"))
    }
}

fn value(json: serde_json::Value) -> Value {
    Value::try_from(json).unwrap()
}

#[test]
fn test_basic_set_get_delete() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = LiteKv::open(common::temp_config(dir.path())).unwrap();

    assert!(store.set("name", "litekv", false).unwrap());
    assert!(store.set("version", 1, false).unwrap());

    assert_eq!(store.get("name").unwrap(), Some("litekv".into()));
    assert_eq!(store.get("version").unwrap(), Some(1.into()));
    assert_eq!(store.get("missing").unwrap(), None);
    assert!(!store.exists("missing").unwrap());

    assert!(store.delete("name").unwrap());
    assert_eq!(store.get("name").unwrap(), None);
    assert_eq!(store.get("version").unwrap(), Some(1.into()));
}

#[test]
fn test_values_persist_across_reopen() {
    let dir = tempfile::tempdir().unwrap();

    {
        let mut store = LiteKv::open(common::temp_config(dir.path())).unwrap();
        store.set("profile", value(json!({"name": "ann"})), false).unwrap();
        store.set("profile", value(json!({"age": 31})), false).unwrap();
        store.set("scores", value(json!([1.5, 2])), false).unwrap();
        store.close().unwrap();
    }

    let store = LiteKv::open(common::temp_config(dir.path())).unwrap();
    assert_eq!(
        store.get("profile").unwrap(),
        Some(value(json!({"name": "ann", "age": 31})))
    );
    assert_eq!(store.get("scores").unwrap(), Some(value(json!([1.5, 2]))));
}

#[test]
fn test_drop_commits_pending_batch() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::temp_config(dir.path()).with_auto_commit(false);

    {
        let mut store = LiteKv::open(config.clone()).unwrap();
        store.set("pending", true, false).unwrap();
    }

    let store = LiteKv::open(config).unwrap();
    assert_eq!(store.get("pending").unwrap(), Some(true.into()));
}

#[test]
fn test_expiry_after_sleep() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = LiteKv::open(common::temp_config(dir.path())).unwrap();

    store.setex("session", 0, "token", false).unwrap();
    store.setex("long", 60, "token", false).unwrap();
    thread::sleep(Duration::from_millis(20));

    assert_eq!(store.get("session").unwrap(), None);
    assert!(!store.exists("session").unwrap());
    assert_eq!(store.get("long").unwrap(), Some("token".into()));

    let remaining = store.ttl("long").unwrap().unwrap();
    assert!(remaining > 59_000 && remaining <= 60_000);
    assert_eq!(store.ttl("missing").unwrap(), None);
}

#[test]
fn test_ttl_does_not_delete() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = LiteKv::open(common::temp_config(dir.path())).unwrap();

    store.set("plain", 1, false).unwrap();
    assert_eq!(store.ttl("plain").unwrap(), None);

    store.setex("old", -1, 1, false).unwrap();
    // ttl is a probe: the row is still there for exists() to expire
    assert_eq!(store.ttl("old").unwrap(), None);
    assert!(!store.exists("old").unwrap());
}

#[test]
fn test_one_time_survives_reopen_until_read() {
    let dir = tempfile::tempdir().unwrap();

    {
        let mut store = LiteKv::open(common::temp_config(dir.path())).unwrap();
        store.set("otp", 123456, true).unwrap();
    }

    let store = LiteKv::open(common::temp_config(dir.path())).unwrap();
    assert_eq!(store.get("otp").unwrap(), Some(123456.into()));
    assert_eq!(store.get("otp").unwrap(), None);
}

#[test]
fn test_one_time_consumed_by_only_one_connection() {
    let dir = tempfile::tempdir().unwrap();
    let mut writer = LiteKv::open(common::temp_config(dir.path())).unwrap();
    let reader = LiteKv::open(common::temp_config(dir.path())).unwrap();

    writer.set("otp", "secret", true).unwrap();
    assert_eq!(reader.get("otp").unwrap(), Some("secret".into()));
    assert_eq!(writer.get("otp").unwrap(), None);
}

#[test]
fn test_uncommitted_writes_invisible_to_other_connection() {
    let dir = tempfile::tempdir().unwrap();
    let mut writer = LiteKv::open(common::temp_config(dir.path()).with_auto_commit(false)).unwrap();
    let reader = LiteKv::open(common::temp_config(dir.path())).unwrap();

    writer.set("draft", "v1", false).unwrap();
    assert_eq!(writer.get("draft").unwrap(), Some("v1".into()));
    assert_eq!(reader.get("draft").unwrap(), None);

    writer.commit_transaction().unwrap();
    assert_eq!(reader.get("draft").unwrap(), Some("v1".into()));
}

#[test]
fn test_explicit_transaction_visibility() {
    let dir = tempfile::tempdir().unwrap();
    let mut writer = LiteKv::open(common::temp_config(dir.path())).unwrap();
    let reader = LiteKv::open(common::temp_config(dir.path())).unwrap();

    writer.begin_transaction().unwrap();
    writer.set("a", 1, false).unwrap();
    writer.set("b", 2, false).unwrap();
    assert_eq!(reader.mget(["a", "b"]).unwrap(), vec![None, None]);

    writer.commit_transaction().unwrap();
    assert_eq!(
        reader.mget(["a", "b", "c"]).unwrap(),
        vec![Some(1.into()), Some(2.into()), None]
    );
}

#[test]
fn test_auto_commit_visible_immediately() {
    let dir = tempfile::tempdir().unwrap();
    let mut writer = LiteKv::open(common::temp_config(dir.path())).unwrap();
    let reader = LiteKv::open(common::temp_config(dir.path())).unwrap();

    writer.set("k", value(json!([1])), false).unwrap();
    assert_eq!(reader.get("k").unwrap(), Some(value(json!([1]))));
}

#[test]
fn test_export_json() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = LiteKv::open(common::temp_config(dir.path())).unwrap();

    store.set("b", value(json!({"x": 1})), false).unwrap();
    store.set("a", "text", false).unwrap();
    store.set("once", 7, true).unwrap();
    store.setex("gone", -1, 0, false).unwrap();

    let target = dir.path().join("out").join("dump.json");
    assert!(store.convert_to_json(Some(&target)));

    let exported: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&target).unwrap()).unwrap();
    assert_eq!(exported, json!({"a": "text", "b": {"x": 1}, "once": 7}));

    // export does not consume one-time keys
    assert_eq!(store.get("once").unwrap(), Some(7.into()));
}

#[test]
fn test_export_default_path() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = LiteKv::open(common::temp_config(dir.path())).unwrap();
    store.set("k", 1, false).unwrap();

    assert!(store.convert_to_json(None));
    assert!(dir.path().join("store.json").is_file());
}

#[test]
fn test_export_failure_returns_false() {
    let dir = tempfile::tempdir().unwrap();
    let store = LiteKv::open(common::temp_config(dir.path())).unwrap();

    // a directory cannot be written as a file
    assert!(!store.convert_to_json(Some(dir.path())));
}

#[test]
fn test_info_and_journal_mode() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::temp_config(dir.path()).with_table_name("settings");
    let mut store = LiteKv::open(config).unwrap();
    store.set("theme", "dark", false).unwrap();

    let info = store.info().unwrap();
    assert_eq!(info.journal_mode, JournalMode::Wal);
    assert_eq!(info.table_name, "settings");
    assert_eq!(info.filename.as_deref(), Some("store.sqlite"));
    assert_eq!(info.path, Some(dir.path().join("store.sqlite")));
    assert_eq!(info.key_count, 1);

    assert_eq!(store.set_journal_mode(JournalMode::Truncate).unwrap(), JournalMode::Truncate);
    assert_eq!(store.journal_mode().unwrap(), JournalMode::Truncate);
    assert!(store.info().unwrap().size_bytes > 0);
}

#[test]
fn test_tables_are_independent() {
    let dir = tempfile::tempdir().unwrap();
    let mut first =
        LiteKv::open(common::temp_config(dir.path()).with_table_name("first")).unwrap();
    let mut second =
        LiteKv::open(common::temp_config(dir.path()).with_table_name("second")).unwrap();

    first.set("k", 1, false).unwrap();
    second.set("k", 2, false).unwrap();

    assert_eq!(first.get("k").unwrap(), Some(1.into()));
    assert_eq!(second.get("k").unwrap(), Some(2.into()));
}

#[test]
fn test_invalid_table_name_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let result = LiteKv::open(common::temp_config(dir.path()).with_table_name("bad name"));
    assert!(matches!(result, Err(LiteKvError::Config(_))));
}

#[test]
fn test_memory_store_is_not_persisted() {
    let mut store = LiteKv::open(Config::memory()).unwrap();
    store.set("k", 1, false).unwrap();

    let info = store.info().unwrap();
    assert_eq!(info.path, None);
    assert_eq!(info.size_bytes, 0);
    assert_eq!(info.journal_mode, JournalMode::Memory);

    let other = LiteKv::open(Config::memory()).unwrap();
    assert_eq!(other.get("k").unwrap(), None);
}

#[test]
fn test_temp_mode_uses_temp_dir() {
    let config = Config::temp().with_table_name("integration_temp");
    assert_eq!(config.storage, StorageMode::Temp);

    let mut store = LiteKv::open(config).unwrap();
    store.clear().unwrap();
    store.set("k", "v", false).unwrap();

    let path = store.info().unwrap().path.unwrap();
    assert!(path.starts_with(std::env::temp_dir()));
    store.clear().unwrap();
}

#[test]
fn test_clear_and_size() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = LiteKv::open(common::temp_config(dir.path())).unwrap();

    for i in 0..100 {
        store.set(&format!("key_{:04}", i), i, false).unwrap();
    }
    assert_eq!(store.size().unwrap(), 100);
    assert_eq!(store.keys(Some("key_009_")).unwrap().len(), 10);

    assert!(store.clear().unwrap());
    assert_eq!(store.size().unwrap(), 0);
    assert!(store.keys(None).unwrap().is_empty());
}

#[test]
fn test_unicode_keys() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = LiteKv::open(common::temp_config(dir.path())).unwrap();

    store.set("café", "coffee", false).unwrap();
    store.set("日本語", "japanese", false).unwrap();
    store.set("🦀", "crab", false).unwrap();

    assert_eq!(store.get("café").unwrap(), Some("coffee".into()));
    assert_eq!(store.get("日本語").unwrap(), Some("japanese".into()));
    assert_eq!(store.get("🦀").unwrap(), Some("crab".into()));
}

#[test]
fn test_operations_after_close_fail() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = LiteKv::open(common::temp_config(dir.path())).unwrap();
    store.close().unwrap();

    assert!(matches!(store.get("k"), Err(LiteKvError::NotInitialized)));
    assert!(matches!(store.keys(None), Err(LiteKvError::NotInitialized)));
    assert!(matches!(store.info(), Err(LiteKvError::NotInitialized)));
    assert!(matches!(store.increment("k", 1), Err(LiteKvError::NotInitialized)));
}
