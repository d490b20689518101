//! Record, identifier, diff and filter types exchanged with endpoints.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use syncline_core::path;

use crate::value::{contains_value, values_equal};

/// A flat or nested attribute record, ordered by insertion.
pub type Record = Map<String, Value>;

/// Identifier an endpoint assigns to an object it stores.
///
/// Endpoints use different identifier schemes: a DN for directories, a
/// primary key for SQL tables, a resource id for REST services.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Uid {
    attribute_name: String,
    value: String,
}

impl Uid {
    pub fn new(attribute_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute_name: attribute_name.into(),
            value: value.into(),
        }
    }

    /// Create a UID using the default "id" attribute name.
    pub fn from_value(value: impl Into<String>) -> Self {
        Self::new("id", value)
    }

    pub fn attribute_name(&self) -> &str {
        &self.attribute_name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Display for Uid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.attribute_name, self.value)
    }
}

/// Kind of change a [`DiffEntry`] asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiffAction {
    Replace,
    Remove,
    Add,
}

impl std::fmt::Display for DiffAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DiffAction::Replace => "REPLACE",
            DiffAction::Remove => "REMOVE",
            DiffAction::Add => "ADD",
        };
        f.write_str(name)
    }
}

/// One attribute-level change.
///
/// REMOVE never carries a value; REPLACE and ADD always do. ADD holds only
/// the elements missing from the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiffEntry {
    Replace(Value),
    Remove,
    Add(Vec<Value>),
}

impl DiffEntry {
    pub fn action(&self) -> DiffAction {
        match self {
            DiffEntry::Replace(_) => DiffAction::Replace,
            DiffEntry::Remove => DiffAction::Remove,
            DiffEntry::Add(_) => DiffAction::Add,
        }
    }

    pub fn value(&self) -> Option<Value> {
        match self {
            DiffEntry::Replace(value) => Some(value.clone()),
            DiffEntry::Remove => None,
            DiffEntry::Add(items) => Some(Value::Array(items.clone())),
        }
    }
}

/// Attribute name to change, in declaration order.
///
/// Serializes as a JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeDiff {
    entries: Vec<(String, DiffEntry)>,
}

impl AttributeDiff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a change. A later entry for the same attribute replaces the
    /// earlier one.
    pub fn insert(&mut self, attribute: impl Into<String>, entry: DiffEntry) {
        let attribute = attribute.into();
        match self.entries.iter_mut().find(|(name, _)| *name == attribute) {
            Some(slot) => slot.1 = entry,
            None => self.entries.push((attribute, entry)),
        }
    }

    pub fn get(&self, attribute: &str) -> Option<&DiffEntry> {
        self.entries
            .iter()
            .find(|(name, _)| name == attribute)
            .map(|(_, entry)| entry)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DiffEntry)> {
        self.entries
            .iter()
            .map(|(name, entry)| (name.as_str(), entry))
    }

    /// Names of the attributes that change.
    pub fn attributes(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }
}

impl Serialize for AttributeDiff {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, entry) in &self.entries {
            map.serialize_entry(name, entry)?;
        }
        map.end()
    }
}

/// Changes to apply to an endpoint object, grouped by operation.
///
/// The default native form of an [`AttributeDiff`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeDelta {
    /// Values to add to multi-valued attributes.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub add: Record,

    /// Values to remove from multi-valued attributes.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub remove: Record,

    /// Attributes to replace entirely.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub replace: Record,

    /// Attributes to clear (remove all values).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clear: Vec<String>,
}

impl AttributeDelta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, value: Value) -> &mut Self {
        self.add.insert(name.into(), value);
        self
    }

    pub fn remove(&mut self, name: impl Into<String>, value: Value) -> &mut Self {
        self.remove.insert(name.into(), value);
        self
    }

    pub fn replace(&mut self, name: impl Into<String>, value: Value) -> &mut Self {
        self.replace.insert(name.into(), value);
        self
    }

    pub fn clear_attribute(&mut self, name: impl Into<String>) -> &mut Self {
        self.clear.push(name.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.add.is_empty()
            && self.remove.is_empty()
            && self.replace.is_empty()
            && self.clear.is_empty()
    }

    /// Get all affected attribute names, sorted and deduplicated.
    pub fn affected_attributes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        names.extend(self.add.keys().map(String::as_str));
        names.extend(self.remove.keys().map(String::as_str));
        names.extend(self.replace.keys().map(String::as_str));
        names.extend(self.clear.iter().map(String::as_str));
        names.sort_unstable();
        names.dedup();
        names
    }
}

impl From<&AttributeDiff> for AttributeDelta {
    fn from(diff: &AttributeDiff) -> Self {
        let mut delta = AttributeDelta::new();
        for (name, entry) in diff.iter() {
            match entry {
                DiffEntry::Replace(value) => {
                    delta.replace(name, value.clone());
                }
                DiffEntry::Remove => {
                    delta.clear_attribute(name);
                }
                DiffEntry::Add(items) => {
                    delta.add(name, Value::Array(items.clone()));
                }
            }
        }
        delta
    }
}

/// Filter for single-object lookups.
///
/// Attribute names are dotted paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Filter {
    /// Attribute equals value. A multi-valued attribute matches when any of
    /// its elements equals the value.
    Equals { attribute: String, value: Value },

    /// Attribute is present and not null.
    Present { attribute: String },

    /// Every filter matches.
    And { filters: Vec<Filter> },
}

impl Filter {
    pub fn eq(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Equals {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn present(attribute: impl Into<String>) -> Self {
        Filter::Present {
            attribute: attribute.into(),
        }
    }

    pub fn and(filters: Vec<Filter>) -> Self {
        Filter::And { filters }
    }

    /// Combine this filter with another using AND.
    pub fn and_with(self, other: Filter) -> Self {
        match self {
            Filter::And { mut filters } => {
                filters.push(other);
                Filter::And { filters }
            }
            _ => Filter::And {
                filters: vec![self, other],
            },
        }
    }

    /// Equality on every key of a record, in record order.
    pub fn from_record(record: &Record) -> Self {
        let mut filters: Vec<Filter> = record
            .iter()
            .map(|(name, value)| Filter::eq(name.clone(), value.clone()))
            .collect();
        if filters.len() == 1 {
            filters.remove(0)
        } else {
            Filter::And { filters }
        }
    }

    /// Attribute paths the filter references.
    pub fn attributes(&self) -> Vec<&str> {
        match self {
            Filter::Equals { attribute, .. } | Filter::Present { attribute } => {
                vec![attribute.as_str()]
            }
            Filter::And { filters } => filters.iter().flat_map(Filter::attributes).collect(),
        }
    }

    /// Evaluate the filter against a record.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Filter::Equals { attribute, value } => match path::get_in(record, attribute) {
                Some(Value::Array(items)) if !value.is_array() => contains_value(items, value),
                Some(found) => values_equal(found, value),
                None => false,
            },
            Filter::Present { attribute } => {
                path::get_in(record, attribute).is_some_and(|found| !found.is_null())
            }
            Filter::And { filters } => filters.iter().all(|filter| filter.matches(record)),
        }
    }
}
