//! Attribute definitions.
//!
//! Workflow documents declare attributes as loose key/value specs
//! ([`AttributeSpec`]). They are validated once into closed
//! [`AttributeDefinition`]s so malformed rewrite rules, bad regexes or a
//! MERGE on a scalar type fail at load time rather than per record.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::MappingError;

fn default_true() -> bool {
    true
}

/// Desired-state policy for an attribute or a whole object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnsureMode {
    /// Create if missing, never touch if present.
    Exists,
    /// Remove if present.
    Absent,
    /// Always reflect the latest mapped value.
    #[default]
    Last,
    /// Union into the existing array. Array attributes only.
    Merge,
}

impl std::fmt::Display for EnsureMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EnsureMode::Exists => "EXISTS",
            EnsureMode::Absent => "ABSENT",
            EnsureMode::Last => "LAST",
            EnsureMode::Merge => "MERGE",
        };
        f.write_str(name)
    }
}

/// Declared type an attribute is coerced to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    #[default]
    String,
    Int,
    Float,
    Bool,
    Null,
    Array,
    Binary,
}

/// Link from an attribute to a canonical object in another collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationLink {
    /// Collection holding the related object.
    pub collection: String,
    /// Attribute of the related object matched against this attribute's value.
    pub attribute: String,
}

/// Raw rewrite rule as written in a workflow document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewriteSpec {
    #[serde(rename = "match", default)]
    pub matches: Option<Value>,
    #[serde(default)]
    pub to: Option<Value>,
    #[serde(default = "default_true")]
    pub regex: bool,
}

/// Raw attribute declaration as written in a workflow document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeSpec {
    /// Dotted path into the source record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    /// Static literal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    /// Expression evaluated against the source record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,

    #[serde(default, rename = "type")]
    pub kind: AttributeType,

    #[serde(default)]
    pub ensure: EnsureMode,

    #[serde(default = "default_true")]
    pub required: bool,

    /// Output name, when different from the declaration key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rewrite: Vec<RewriteSpec>,

    /// Regex the final value must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require: Option<String>,

    /// Definition applied to each element when the value is an array.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unwind: Option<Box<AttributeSpec>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<RelationLink>,
}

impl Default for AttributeSpec {
    fn default() -> Self {
        Self {
            from: None,
            value: None,
            expression: None,
            kind: AttributeType::default(),
            ensure: EnsureMode::default(),
            required: true,
            rename: None,
            rewrite: Vec::new(),
            require: None,
            unwind: None,
            relation: None,
        }
    }
}

/// Where a raw value comes from. Resolved in declaration order, later
/// sources overwriting earlier ones.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Static(Value),
    Path(String),
    Expression(String),
}

/// A validated rewrite rule.
#[derive(Debug, Clone)]
pub enum RewriteRule {
    /// Replace a value equal to `matches` with `to`.
    Exact { matches: Value, to: Value },
    /// Regex substitution on string values. `to` uses `$1` group syntax.
    Pattern { pattern: Regex, to: String },
}

impl RewriteRule {
    fn from_spec(attribute: &str, index: usize, spec: &RewriteSpec) -> Result<Self, MappingError> {
        let (Some(matches), Some(to)) = (&spec.matches, &spec.to) else {
            return Err(MappingError::configuration(
                attribute,
                format!("rewrite rule {index} needs both 'match' and 'to'"),
            ));
        };

        if !spec.regex {
            return Ok(RewriteRule::Exact {
                matches: matches.clone(),
                to: to.clone(),
            });
        }

        let (Value::String(pattern), Value::String(to)) = (matches, to) else {
            return Err(MappingError::configuration(
                attribute,
                format!("regex rewrite rule {index} needs string 'match' and 'to'"),
            ));
        };
        let pattern = Regex::new(pattern).map_err(|e| {
            MappingError::configuration(attribute, format!("rewrite rule {index}: {e}"))
        })?;
        Ok(RewriteRule::Pattern {
            pattern,
            to: to.clone(),
        })
    }
}

/// A validated attribute definition.
#[derive(Debug, Clone)]
pub struct AttributeDefinition {
    /// Output name.
    pub name: String,
    pub sources: Vec<Source>,
    pub kind: AttributeType,
    pub ensure: EnsureMode,
    pub required: bool,
    pub rewrite: Vec<RewriteRule>,
    pub require: Option<Regex>,
    pub unwind: Option<Box<AttributeDefinition>>,
    pub relation: Option<RelationLink>,
}

impl AttributeDefinition {
    /// Validate a spec declared under `key`.
    pub fn from_spec(key: &str, spec: &AttributeSpec) -> Result<Self, MappingError> {
        let name = spec.rename.clone().unwrap_or_else(|| key.to_string());
        if name.is_empty() {
            return Err(MappingError::configuration(key, "output name is empty"));
        }

        if spec.ensure == EnsureMode::Merge && spec.kind != AttributeType::Array {
            return Err(MappingError::configuration(
                &name,
                "MERGE requires type 'array'",
            ));
        }

        let mut sources = Vec::new();
        if let Some(value) = &spec.value {
            sources.push(Source::Static(value.clone()));
        }
        if let Some(from) = &spec.from {
            syncline_core::path::segments(from)
                .map_err(|e| MappingError::configuration(&name, e.to_string()))?;
            sources.push(Source::Path(from.clone()));
        }
        if let Some(expression) = &spec.expression {
            sources.push(Source::Expression(expression.clone()));
        }

        let rewrite = spec
            .rewrite
            .iter()
            .enumerate()
            .map(|(index, rule)| RewriteRule::from_spec(&name, index, rule))
            .collect::<Result<Vec<_>, _>>()?;

        let require = spec
            .require
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| MappingError::configuration(&name, format!("require: {e}")))?;

        let unwind = spec
            .unwind
            .as_deref()
            .map(|nested| Self::from_spec(&name, nested).map(Box::new))
            .transpose()?;

        Ok(Self {
            name,
            sources,
            kind: spec.kind,
            ensure: spec.ensure,
            required: spec.required,
            rewrite,
            require,
            unwind,
            relation: spec.relation.clone(),
        })
    }

    /// Validate an ordered map of declaration key to raw spec.
    pub fn from_spec_map(specs: &Map<String, Value>) -> Result<Vec<Self>, MappingError> {
        specs
            .iter()
            .map(|(key, raw)| {
                let spec: AttributeSpec = serde_json::from_value(raw.clone())
                    .map_err(|e| MappingError::configuration(key, e.to_string()))?;
                Self::from_spec(key, &spec)
            })
            .collect()
    }
}
