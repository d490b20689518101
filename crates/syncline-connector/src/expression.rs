//! Expression evaluation seam.
//!
//! The mapper and the workflow guard both evaluate user expressions against a
//! record. Which language backs them is the evaluator's business.

use serde_json::Value;

use crate::error::ExpressionError;
use crate::operation::Record;

/// Evaluates an expression against a context record.
pub trait ExpressionEvaluator: Send + Sync {
    /// Evaluate `code` with `context` in scope and return its value.
    fn evaluate(&self, code: &str, context: &Record) -> Result<Value, ExpressionError>;

    /// Evaluate `code` as a condition.
    fn evaluate_condition(&self, code: &str, context: &Record) -> Result<bool, ExpressionError> {
        self.evaluate(code, context).map(|value| is_truthy(&value))
    }
}

/// Truthiness of an expression result.
///
/// `null`, `false`, `0`, `""`, `[]` and `{}` are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
