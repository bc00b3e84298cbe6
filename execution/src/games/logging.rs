//! Structured per-transition log entries.
//!
//! Games attach these JSON strings to every [`super::GameResult`] so the renderer and the host
//! can describe what just happened without re-deriving it from state.

use serde_json::{Map, Value};

/// Serialize one log entry. `fields` must be a JSON object.
pub fn entry(fields: Value) -> String {
    fields.to_string()
}

/// Single-entry log list, the common case.
pub fn single(fields: Value) -> Vec<String> {
    vec![entry(fields)]
}

/// Merge `extra` into the object `base` (later keys win).
pub fn merged(base: Value, extra: Value) -> Value {
    match (base, extra) {
        (Value::Object(mut base), Value::Object(extra)) => {
            for (key, value) in extra {
                base.insert(key, value);
            }
            Value::Object(base)
        }
        (base, _) => base,
    }
}

/// Parse an entry back into an object; non-object entries yield an empty map.
pub fn parse(entry: &str) -> Map<String, Value> {
    match serde_json::from_str(entry) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}
