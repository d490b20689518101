//! Dotted-path access over nested JSON values.
//!
//! Paths are dot-separated segments (`name.given`, `emails.0.address`).
//! Map segments address keys, numeric segments address array elements.
//!
//! A literal key containing dots wins over a nested structure: when a map
//! holds both `{"a.b": 1}` and `{"a": {"b": 2}}`, `get("a.b")` returns `1`.
//! Prefixes are tried longest first, so `{"a.b": {"c": 3}}` is reachable as
//! `a.b.c`.
//!
//! [`get`] distinguishes "not found" (`None`) from "found null"
//! (`Some(&Value::Null)`).
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use syncline_core::path;
//!
//! let mut record = json!({"name": {"given": "Ada"}, "tags": ["x"]});
//! assert_eq!(path::get(&record, "name.given"), Some(&json!("Ada")));
//! assert_eq!(path::get(&record, "name.family"), None);
//!
//! path::set(&mut record, "name.family", json!("Lovelace")).unwrap();
//! assert_eq!(path::get(&record, "name.family"), Some(&json!("Lovelace")));
//!
//! assert_eq!(path::remove(&mut record, "tags.0"), Some(json!("x")));
//! ```

use serde_json::{Map, Value};

use crate::error::{PathError, Result};

/// Split a path into its segments, rejecting empty segments.
pub fn segments(path: &str) -> Result<Vec<&str>> {
    let parts: Vec<&str> = path.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(PathError::InvalidPath {
            path: path.to_string(),
        });
    }
    Ok(parts)
}

/// Look up a dotted path.
///
/// Returns `None` when any segment is missing or the path is malformed.
pub fn get<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let parts = segments(path).ok()?;
    get_segments(root, &parts)
}

/// Whether a dotted path resolves to a value (including `null`).
pub fn contains(root: &Value, path: &str) -> bool {
    get(root, path).is_some()
}

fn get_segments<'a>(node: &'a Value, parts: &[&str]) -> Option<&'a Value> {
    if parts.is_empty() {
        return Some(node);
    }

    match node {
        Value::Object(map) => get_in_map(map, parts),
        Value::Array(items) => {
            let index = parts[0].parse::<usize>().ok()?;
            items
                .get(index)
                .and_then(|child| get_segments(child, &parts[1..]))
        }
        _ => None,
    }
}

/// Look up a dotted path starting from a map rather than a [`Value`].
pub fn get_in<'a>(map: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let parts = segments(path).ok()?;
    get_in_map(map, &parts)
}

fn get_in_map<'a>(map: &'a Map<String, Value>, parts: &[&str]) -> Option<&'a Value> {
    for n in (1..=parts.len()).rev() {
        let key = parts[..n].join(".");
        if let Some(child) = map.get(&key) {
            if let Some(found) = get_segments(child, &parts[n..]) {
                return Some(found);
            }
        }
    }
    None
}

/// Write a value at a dotted path, creating intermediate maps as needed.
///
/// Returns the value previously stored at that path, if any.
pub fn set(root: &mut Value, path: &str, value: Value) -> Result<Option<Value>> {
    let parts = segments(path)?;
    set_segments(root, &parts, value, path)
}

fn set_segments(
    node: &mut Value,
    parts: &[&str],
    value: Value,
    path: &str,
) -> Result<Option<Value>> {
    match node {
        Value::Object(map) => set_in_map(map, parts, value, path),
        Value::Array(items) => {
            let segment = parts[0];
            let index = segment
                .parse::<usize>()
                .map_err(|_| PathError::NotAContainer {
                    path: path.to_string(),
                    segment: segment.to_string(),
                })?;

            if parts.len() == 1 {
                if index < items.len() {
                    return Ok(Some(std::mem::replace(&mut items[index], value)));
                }
                if index == items.len() {
                    items.push(value);
                    return Ok(None);
                }
                return Err(PathError::IndexOutOfBounds {
                    path: path.to_string(),
                    segment: segment.to_string(),
                });
            }

            match items.get_mut(index) {
                Some(child) => set_segments(child, &parts[1..], value, path),
                None => Err(PathError::IndexOutOfBounds {
                    path: path.to_string(),
                    segment: segment.to_string(),
                }),
            }
        }
        _ => Err(PathError::NotAContainer {
            path: path.to_string(),
            segment: parts[0].to_string(),
        }),
    }
}

fn set_in_map(
    map: &mut Map<String, Value>,
    parts: &[&str],
    value: Value,
    path: &str,
) -> Result<Option<Value>> {
    let whole = parts.join(".");
    if map.contains_key(&whole) {
        return Ok(map.insert(whole, value));
    }

    // Descend through the longest existing container prefix.
    for n in (1..parts.len()).rev() {
        let key = parts[..n].join(".");
        if let Some(child) = map.get_mut(&key) {
            if child.is_object() || child.is_array() {
                return set_segments(child, &parts[n..], value, path);
            }
        }
    }

    if parts.len() == 1 {
        return Ok(map.insert(parts[0].to_string(), value));
    }

    let child = map
        .entry(parts[0].to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !(child.is_object() || child.is_array()) {
        return Err(PathError::NotAContainer {
            path: path.to_string(),
            segment: parts[0].to_string(),
        });
    }
    set_segments(child, &parts[1..], value, path)
}

/// Write a dotted path starting from a map rather than a [`Value`].
pub fn set_in(map: &mut Map<String, Value>, path: &str, value: Value) -> Result<Option<Value>> {
    let parts = segments(path)?;
    set_in_map(map, &parts, value, path)
}

/// Remove the value at a dotted path, returning it.
///
/// Array elements are removed in place, shifting later elements down.
pub fn remove(root: &mut Value, path: &str) -> Option<Value> {
    let parts = segments(path).ok()?;
    remove_segments(root, &parts)
}

/// Remove a dotted path starting from a map rather than a [`Value`].
pub fn remove_in(map: &mut Map<String, Value>, path: &str) -> Option<Value> {
    let parts = segments(path).ok()?;
    remove_in_map(map, &parts)
}

fn remove_segments(node: &mut Value, parts: &[&str]) -> Option<Value> {
    match node {
        Value::Object(map) => remove_in_map(map, parts),
        Value::Array(items) => {
            let index = parts[0].parse::<usize>().ok()?;
            if index >= items.len() {
                return None;
            }
            if parts.len() == 1 {
                Some(items.remove(index))
            } else {
                remove_segments(&mut items[index], &parts[1..])
            }
        }
        _ => None,
    }
}

fn remove_in_map(map: &mut Map<String, Value>, parts: &[&str]) -> Option<Value> {
    let whole = parts.join(".");
    if map.contains_key(&whole) {
        return map.shift_remove(&whole);
    }
    for n in (1..parts.len()).rev() {
        let key = parts[..n].join(".");
        if let Some(child) = map.get_mut(&key) {
            if let Some(removed) = remove_segments(child, &parts[n..]) {
                return Some(removed);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_nested_and_missing() {
        let v = json!({"a": {"b": {"c": 1}}});
        assert_eq!(get(&v, "a.b.c"), Some(&json!(1)));
        assert_eq!(get(&v, "a.b"), Some(&json!({"c": 1})));
        assert_eq!(get(&v, "a.x"), None);
        assert_eq!(get(&v, "a.b.c.d"), None);
    }

    #[test]
    fn test_found_null_is_distinct_from_missing() {
        let v = json!({"a": null});
        assert_eq!(get(&v, "a"), Some(&Value::Null));
        assert!(contains(&v, "a"));
        assert!(!contains(&v, "b"));
    }

    #[test]
    fn test_literal_dotted_key_wins() {
        let v = json!({"a.b": "literal", "a": {"b": "nested"}});
        assert_eq!(get(&v, "a.b"), Some(&json!("literal")));
    }

    #[test]
    fn test_falls_back_to_nested_when_literal_prefix_dead_ends() {
        let v = json!({"a.b": "scalar", "a": {"b": {"c": 5}}});
        assert_eq!(get(&v, "a.b.c"), Some(&json!(5)));
    }

    #[test]
    fn test_get_in_map() {
        let v = json!({"user": {"login": "ada"}});
        let map = v.as_object().unwrap();
        assert_eq!(get_in(map, "user.login"), Some(&json!("ada")));
        assert_eq!(get_in(map, "user.uid"), None);
    }

    #[test]
    fn test_array_indexing() {
        let v = json!({"mails": [{"addr": "x@y"}, {"addr": "z@y"}]});
        assert_eq!(get(&v, "mails.1.addr"), Some(&json!("z@y")));
        assert_eq!(get(&v, "mails.5.addr"), None);
        assert_eq!(get(&v, "mails.first"), None);
    }

    #[test]
    fn test_malformed_paths() {
        let v = json!({"a": 1});
        assert_eq!(get(&v, ""), None);
        assert_eq!(get(&v, "a..b"), None);
        assert!(segments("a..b").is_err());
    }

    #[test]
    fn test_set_creates_intermediate_maps() {
        let mut v = json!({});
        let previous = set(&mut v, "a.b.c", json!(1)).unwrap();
        assert!(previous.is_none());
        assert_eq!(v, json!({"a": {"b": {"c": 1}}}));
    }

    #[test]
    fn test_set_overwrites_literal_key() {
        let mut v = json!({"a.b": 1});
        let previous = set(&mut v, "a.b", json!(2)).unwrap();
        assert_eq!(previous, Some(json!(1)));
        assert_eq!(v, json!({"a.b": 2}));
    }

    #[test]
    fn test_set_through_scalar_fails() {
        let mut v = json!({"a": "scalar"});
        let err = set(&mut v, "a.b", json!(1)).unwrap_err();
        assert!(matches!(err, PathError::NotAContainer { .. }));
    }

    #[test]
    fn test_set_array_append_and_bounds() {
        let mut v = json!({"list": [1]});
        set(&mut v, "list.1", json!(2)).unwrap();
        assert_eq!(v, json!({"list": [1, 2]}));
        let err = set(&mut v, "list.5", json!(3)).unwrap_err();
        assert!(matches!(err, PathError::IndexOutOfBounds { .. }));
    }

    #[test]
    fn test_remove() {
        let mut v = json!({"a": {"b": 1, "c": 2}, "list": [1, 2, 3]});
        assert_eq!(remove(&mut v, "a.b"), Some(json!(1)));
        assert_eq!(remove(&mut v, "a.b"), None);
        assert_eq!(remove(&mut v, "list.0"), Some(json!(1)));
        assert_eq!(v, json!({"a": {"c": 2}, "list": [2, 3]}));
    }

    #[test]
    fn test_set_in_and_remove_in_keep_key_order() {
        let mut map = json!({"login": "ada", "name": {"given": "Ada"}, "mail": "a@x"})
            .as_object()
            .cloned()
            .unwrap();
        set_in(&mut map, "name.family", json!("Lovelace")).unwrap();
        assert_eq!(remove_in(&mut map, "login"), Some(json!("ada")));
        assert_eq!(remove_in(&mut map, "phone"), None);

        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["name", "mail"]);
        assert_eq!(map["name"], json!({"given": "Ada", "family": "Lovelace"}));
    }
}
