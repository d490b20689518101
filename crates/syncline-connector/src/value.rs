//! Comparison helpers over attribute values.
//!
//! Diffing needs a looser notion of equality than `PartialEq` on
//! [`serde_json::Value`]: arrays compare as multisets and numbers compare by
//! magnitude, so `[1, 2]` equals `[2.0, 1]`.

use serde_json::Value;

/// Whether a value counts as "nothing": `null`, `""` or `[]`.
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Deep, order-insensitive equality.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                return x == y;
            }
            match (x.as_f64(), y.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            }
        }
        (Value::Array(xs), Value::Array(ys)) => {
            if xs.len() != ys.len() {
                return false;
            }
            let mut used = vec![false; ys.len()];
            xs.iter().all(|x| {
                let slot = ys
                    .iter()
                    .enumerate()
                    .position(|(i, y)| !used[i] && values_equal(x, y));
                match slot {
                    Some(i) => {
                        used[i] = true;
                        true
                    }
                    None => false,
                }
            })
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

/// Whether `items` holds an element equal to `needle`.
pub fn contains_value(items: &[Value], needle: &Value) -> bool {
    items.iter().any(|item| values_equal(item, needle))
}

/// View a value as a list of elements: arrays as-is, `null` as empty,
/// anything else as a single element.
pub fn as_elements(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        Value::Null => Vec::new(),
        other => vec![other.clone()],
    }
}

/// Order-preserving union: `base` followed by each element of `extra` not
/// already present.
pub fn union(base: &Value, extra: &Value) -> Value {
    let mut merged = as_elements(base);
    for item in as_elements(extra) {
        if !contains_value(&merged, &item) {
            merged.push(item);
        }
    }
    Value::Array(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_values() {
        assert!(is_empty(&Value::Null));
        assert!(is_empty(&json!("")));
        assert!(is_empty(&json!([])));
        assert!(!is_empty(&json!(0)));
        assert!(!is_empty(&json!(false)));
        assert!(!is_empty(&json!({})));
    }

    #[test]
    fn test_arrays_compare_as_multisets() {
        assert!(values_equal(&json!([1, 2, 2]), &json!([2, 1, 2])));
        assert!(!values_equal(&json!([1, 1, 2]), &json!([1, 2, 2])));
        assert!(!values_equal(&json!([1]), &json!([1, 1])));
    }

    #[test]
    fn test_numbers_compare_by_magnitude() {
        assert!(values_equal(&json!(1), &json!(1.0)));
        assert!(!values_equal(&json!(1), &json!("1")));
    }

    #[test]
    fn test_nested_objects() {
        assert!(values_equal(
            &json!({"a": [1, {"b": 2}]}),
            &json!({"a": [{"b": 2.0}, 1]})
        ));
        assert!(!values_equal(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
    }

    #[test]
    fn test_union_keeps_base_order() {
        assert_eq!(union(&json!(["a", "b"]), &json!(["c", "a"])), json!(["a", "b", "c"]));
        assert_eq!(union(&Value::Null, &json!("x")), json!(["x"]));
    }
}
