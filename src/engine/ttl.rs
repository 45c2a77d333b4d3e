//! LITEKV - Expiry & One-Time Policy
//! Decides what a read does with a stored row, similar to Redis EXPIRE
//! plus read-once keys.
//!
//! Expiry is lazy: nothing sweeps in the background. A row whose expiry
//! lies in the past is removed by the first read that sees it.
//!
//! Expiry timestamps are absolute Unix epoch milliseconds. A row is expired
//! once `expiry < now`; at `expiry == now` it is still readable.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::StoredRow;

/// What a read must do with the row it fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadAction {
    /// Row is past its expiry: delete it and report absent.
    Expire,
    /// Row is one-time: return its value, then delete it.
    Consume,
    /// Return the value and leave the row alone.
    Keep,
}

/// Decide the read outcome for `row` at time `now`. Expiry is checked first.
pub fn evaluate(row: &StoredRow, now: i64) -> ReadAction {
    if is_expired(row.expiry, now) {
        ReadAction::Expire
    } else if row.one_time {
        ReadAction::Consume
    } else {
        ReadAction::Keep
    }
}

/// Returns `true` if an expiry is set and has passed.
pub fn is_expired(expiry: Option<i64>, now: i64) -> bool {
    match expiry {
        Some(expires_at) => expires_at < now,
        None => false,
    }
}

/// Remaining lifetime in milliseconds.
/// Returns `None` if there is no expiry or it has already passed.
pub fn remaining_ttl(expiry: Option<i64>, now: i64) -> Option<u64> {
    let expires_at = expiry?;
    if expires_at < now {
        None
    } else {
        Some((expires_at - now) as u64)
    }
}

/// Absolute expiry for a TTL given in seconds. Negative TTLs yield a past
/// timestamp.
pub fn expiry_from_ttl(ttl_secs: i64, now: i64) -> i64 {
    now.saturating_add(ttl_secs.saturating_mul(1000))
}

/// Get current time in milliseconds since Unix epoch.
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
