//! Binary attribute payloads.
//!
//! JSON has no byte type, so binary attributes travel as a wrapper object
//! `{"$binary": "<base64>"}`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{Map, Value};

/// Key of the wrapper object.
pub const BINARY_KEY: &str = "$binary";

/// Wrap raw bytes.
pub fn wrap(bytes: &[u8]) -> Value {
    let mut map = Map::new();
    map.insert(BINARY_KEY.to_string(), Value::String(STANDARD.encode(bytes)));
    Value::Object(map)
}

/// Whether a value is a binary wrapper.
pub fn is_binary(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.len() == 1 && map.get(BINARY_KEY).is_some_and(Value::is_string),
        _ => false,
    }
}

/// Decode a binary wrapper back into bytes.
pub fn unwrap_bytes(value: &Value) -> Option<Vec<u8>> {
    if !is_binary(value) {
        return None;
    }
    let encoded = value.get(BINARY_KEY)?.as_str()?;
    STANDARD.decode(encoded).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wrapper_shape() {
        assert_eq!(wrap(b"hi"), json!({"$binary": "aGk="}));
        assert_eq!(unwrap_bytes(&json!({"$binary": "aGk="})), Some(b"hi".to_vec()));
    }

    #[test]
    fn test_rejects_other_objects() {
        assert!(!is_binary(&json!({"$binary": "aGk=", "extra": 1})));
        assert!(!is_binary(&json!("aGk=")));
        assert_eq!(unwrap_bytes(&json!({"$binary": "***"})), None);
    }
}
