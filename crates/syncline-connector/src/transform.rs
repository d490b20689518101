//! Attribute Mapper.
//!
//! Turns a source record into an ordered attribute set ([`AttributeMapper::map`])
//! and compares a mapped set against an endpoint record
//! ([`AttributeMapper::get_diff`]).
//!
//! Each attribute goes through the same pipeline:
//!
//! 1. ABSENT attributes are skipped.
//! 2. Sources resolve in order (static, path, expression), each overwriting
//!    the previous one. A failing path lookup or expression is logged and the
//!    prior value kept.
//! 3. Non-array types take the first element of an array value.
//! 4. Rewrite rules apply, first match wins.
//! 5. The `require` regex is checked.
//! 6. Empty values (`null`, `""`, `[]`) are dropped, or rejected when the
//!    attribute is required.
//! 7. The value is coerced to the declared type.
//! 8. An `unwind` definition maps each array element with `{root: element}`
//!    as context, dropping elements that resolve to nothing.

use serde_json::{Map, Number, Value};
use syncline_core::path;
use tracing::{debug, warn};

use crate::binary;
use crate::error::MappingError;
use crate::expression::ExpressionEvaluator;
use crate::mapping::{AttributeDefinition, AttributeType, EnsureMode, RewriteRule, Source};
use crate::operation::{AttributeDiff, DiffEntry, Record};
use crate::value::{as_elements, contains_value, is_empty, values_equal};

/// Key under which an unwound element is exposed to the nested definition.
pub const UNWIND_ROOT: &str = "root";

/// Maps records according to an ordered list of attribute definitions.
#[derive(Debug, Clone, Default)]
pub struct AttributeMapper {
    definitions: Vec<AttributeDefinition>,
}

impl AttributeMapper {
    /// Build a mapper, rejecting duplicate output names.
    pub fn from_definitions(definitions: Vec<AttributeDefinition>) -> Result<Self, MappingError> {
        for (index, definition) in definitions.iter().enumerate() {
            if definitions[..index]
                .iter()
                .any(|earlier| earlier.name == definition.name)
            {
                return Err(MappingError::configuration(
                    &definition.name,
                    "output name declared twice",
                ));
            }
        }
        Ok(Self { definitions })
    }

    /// Build a mapper from an ordered map of declaration key to raw spec.
    pub fn from_spec_map(specs: &Map<String, Value>) -> Result<Self, MappingError> {
        Self::from_definitions(AttributeDefinition::from_spec_map(specs)?)
    }

    pub fn definitions(&self) -> &[AttributeDefinition] {
        &self.definitions
    }

    pub fn definition(&self, name: &str) -> Option<&AttributeDefinition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    /// Output names in declaration order.
    pub fn output_names(&self) -> Vec<String> {
        self.definitions.iter().map(|d| d.name.clone()).collect()
    }

    /// Definitions that link to another collection.
    pub fn relations(&self) -> impl Iterator<Item = &AttributeDefinition> {
        self.definitions.iter().filter(|d| d.relation.is_some())
    }

    /// Map a source record.
    ///
    /// An attribute is present in the result only if it survived resolution,
    /// transformation and the empty-value policy.
    pub fn map(
        &self,
        source: &Record,
        evaluator: &dyn ExpressionEvaluator,
    ) -> Result<Record, MappingError> {
        let mut result = Record::new();
        for definition in &self.definitions {
            if let Some(value) = resolve(definition, source, evaluator, false)? {
                result.insert(definition.name.clone(), value);
            }
        }
        Ok(result)
    }

    /// Compute the changes needed to bring `existing` in line with `mapped`.
    ///
    /// An attribute exists when `existing` holds its key, even with a `null`
    /// value.
    pub fn get_diff(&self, mapped: &Record, existing: &Record) -> AttributeDiff {
        let mut diff = AttributeDiff::new();

        for definition in &self.definitions {
            let name = definition.name.as_str();
            let wanted = mapped.get(name).filter(|v| !is_empty(v));
            let current = existing.get(name);

            let entry = match (definition.ensure, wanted, current) {
                (EnsureMode::Exists, Some(value), None) => Some(DiffEntry::Replace(value.clone())),
                (EnsureMode::Exists, _, _) => None,
                (EnsureMode::Last, Some(value), None) => Some(DiffEntry::Replace(value.clone())),
                (EnsureMode::Last, Some(value), Some(current)) => (!values_equal(value, current))
                    .then(|| DiffEntry::Replace(value.clone())),
                (EnsureMode::Last, None, Some(_)) => Some(DiffEntry::Remove),
                (EnsureMode::Last, None, None) => None,
                (EnsureMode::Absent, _, Some(_)) => Some(DiffEntry::Remove),
                (EnsureMode::Absent, _, None) => None,
                (EnsureMode::Merge, Some(value), current) => {
                    let present = current.map(as_elements).unwrap_or_default();
                    let missing: Vec<Value> = as_elements(value)
                        .into_iter()
                        .filter(|item| !contains_value(&present, item))
                        .collect();
                    (!missing.is_empty()).then_some(DiffEntry::Add(missing))
                }
                (EnsureMode::Merge, None, _) => None,
            };

            if let Some(entry) = entry {
                debug!(attribute = %name, action = %entry.action(), "attribute differs");
                diff.insert(name, entry);
            }
        }

        diff
    }
}

/// Resolve one attribute. `lenient` turns "required but empty" into a drop,
/// which is how unwound elements are handled.
fn resolve(
    definition: &AttributeDefinition,
    source: &Record,
    evaluator: &dyn ExpressionEvaluator,
    lenient: bool,
) -> Result<Option<Value>, MappingError> {
    if definition.ensure == EnsureMode::Absent {
        return Ok(None);
    }

    let name = definition.name.as_str();
    let mut value = Value::Null;
    for origin in &definition.sources {
        match origin {
            Source::Static(literal) => value = literal.clone(),
            Source::Path(from) => match path::get_in(source, from) {
                Some(found) => value = found.clone(),
                None => debug!(attribute = %name, path = %from, "path not found in source"),
            },
            Source::Expression(code) => match evaluator.evaluate(code, source) {
                Ok(result) => value = result,
                Err(e) => warn!(
                    attribute = %name,
                    error = %e,
                    "expression failed, keeping prior value"
                ),
            },
        }
    }

    if definition.kind != AttributeType::Array {
        if let Value::Array(items) = value {
            value = items.into_iter().next().unwrap_or(Value::Null);
        }
    }

    value = apply_rewrite(&definition.rewrite, value);

    if let Some(pattern) = &definition.require {
        if !is_empty(&value) {
            for item in as_elements(&value) {
                let text = scalar_text(&item);
                if !pattern.is_match(&text) {
                    return Err(MappingError::resolution(
                        name,
                        format!("value '{text}' does not match '{}'", pattern.as_str()),
                    ));
                }
            }
        }
    }

    if is_empty(&value) {
        return empty_policy(definition, lenient);
    }

    let mut value = coerce(definition.kind, value).map_err(|e| MappingError::resolution(name, e))?;

    if let (Some(nested), Value::Array(items)) = (&definition.unwind, &value) {
        let mut survivors = Vec::with_capacity(items.len());
        for item in items {
            let mut context = Record::new();
            context.insert(UNWIND_ROOT.to_string(), item.clone());
            if let Some(resolved) = resolve(nested, &context, evaluator, true)? {
                survivors.push(resolved);
            }
        }
        value = Value::Array(survivors);
    }

    if is_empty(&value) {
        return empty_policy(definition, lenient);
    }

    debug!(attribute = %name, "attribute resolved");
    Ok(Some(value))
}

fn empty_policy(
    definition: &AttributeDefinition,
    lenient: bool,
) -> Result<Option<Value>, MappingError> {
    if definition.required && !lenient {
        return Err(MappingError::resolution(
            &definition.name,
            "required attribute has no value",
        ));
    }
    Ok(None)
}

fn apply_rewrite(rules: &[RewriteRule], value: Value) -> Value {
    if rules.is_empty() {
        return value;
    }
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| rewrite_one(rules, item))
                .collect(),
        ),
        other => rewrite_one(rules, other),
    }
}

fn rewrite_one(rules: &[RewriteRule], value: Value) -> Value {
    for rule in rules {
        match rule {
            RewriteRule::Exact { matches, to } => {
                if values_equal(&value, matches) {
                    return to.clone();
                }
            }
            RewriteRule::Pattern { pattern, to } => {
                if matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_)) {
                    let text = scalar_text(&value);
                    if pattern.is_match(&text) {
                        return Value::String(pattern.replace_all(&text, to.as_str()).into_owned());
                    }
                }
            }
        }
    }
    value
}

/// Text used for regex checks.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn coerce(kind: AttributeType, value: Value) -> Result<Value, String> {
    match kind {
        AttributeType::String => Ok(match value {
            Value::String(s) => Value::String(s),
            Value::Object(_) | Value::Array(_) => Value::String(value.to_string()),
            other => Value::String(scalar_text(&other)),
        }),
        AttributeType::Int => to_int(&value).map(Value::from),
        AttributeType::Float => {
            let f = to_float(&value)?;
            Number::from_f64(f)
                .map(Value::Number)
                .ok_or_else(|| format!("{f} is not a finite number"))
        }
        AttributeType::Bool => to_bool(&value).map(Value::Bool),
        AttributeType::Null => Ok(Value::Null),
        AttributeType::Array => Ok(match value {
            Value::Array(items) => Value::Array(items),
            other => Value::Array(vec![other]),
        }),
        AttributeType::Binary => to_binary(value),
    }
}

fn to_int(value: &Value) -> Result<i64, String> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .ok_or_else(|| format!("{n} does not fit an int")),
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .or_else(|_| s.parse::<f64>().map(|f| f.trunc() as i64))
                .map_err(|_| format!("'{s}' is not an int"))
        }
        other => Err(format!("cannot convert {other} to int")),
    }
}

fn to_float(value: &Value) -> Result<f64, String> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| format!("{n} is not a float")),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("'{s}' is not a float")),
        other => Err(format!("cannot convert {other} to float")),
    }
}

fn to_bool(value: &Value) -> Result<bool, String> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => Ok(n.as_f64().is_some_and(|f| f != 0.0)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Ok(true),
            "false" | "no" | "0" | "off" => Ok(false),
            _ => Err(format!("'{s}' is not a bool")),
        },
        other => Err(format!("cannot convert {other} to bool")),
    }
}

fn to_binary(value: Value) -> Result<Value, String> {
    if binary::is_binary(&value) {
        return Ok(value);
    }
    match value {
        Value::String(s) => Ok(binary::wrap(s.as_bytes())),
        Value::Array(items) => {
            let bytes = items
                .iter()
                .map(|item| {
                    item.as_u64()
                        .and_then(|b| u8::try_from(b).ok())
                        .ok_or_else(|| format!("{item} is not a byte"))
                })
                .collect::<Result<Vec<u8>, String>>()?;
            Ok(binary::wrap(&bytes))
        }
        other => Err(format!("cannot convert {other} to binary")),
    }
}
