//! LITEKV - Merge-on-Write
//! Decides what a write to an existing key actually stores.
//!
//! ## Rules (first match wins)
//! 1. No existing value: store the incoming value.
//! 2. Incoming string: replace.
//! 3. Array over array: append incoming items to the existing ones.
//! 4. Object over object: shallow merge, incoming keys win.
//! 5. Anything else: replace.

use crate::types::Value;

/// Combine the currently stored value with an incoming write.
pub fn resolve(existing: Option<Value>, incoming: Value) -> Value {
    let Some(existing) = existing else {
        return incoming;
    };

    match (existing, incoming) {
        (_, incoming @ Value::String(_)) => incoming,
        (Value::Array(mut items), Value::Array(more)) => {
            items.extend(more);
            Value::Array(items)
        }
        (Value::Object(mut map), Value::Object(update)) => {
            map.extend(update);
            Value::Object(map)
        }
        (_, incoming) => incoming,
    }
}
