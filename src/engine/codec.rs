//! LITEKV - Value Codec
//! Encodes values into the JSON text stored in the `value` column and back.

use crate::error::Result;
use crate::types::Value;

/// Encode a value for storage.
pub fn encode(value: &Value) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Decode a stored blob. Fails on corrupted text or on `null`.
pub fn decode(raw: &str) -> Result<Value> {
    Ok(serde_json::from_str(raw)?)
}
