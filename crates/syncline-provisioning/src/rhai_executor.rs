//! Rhai-backed expression evaluator.
//!
//! Creates a fresh, sandboxed Rhai engine per evaluation so no state leaks
//! between records. Resource limits bound operations, call depth and
//! collection sizes; a wall-clock budget is enforced from the progress
//! callback.
//!
//! The context record is visible as the `source` map. Each top-level key that
//! is a valid identifier is also pushed as its own variable, so
//! `root.address` and `source.root.address` are equivalent.

use std::time::{Duration, Instant};

use rhai::{Dynamic, Engine, EvalAltResult, Scope};
use serde::Serialize;
use serde_json::Value;
use syncline_connector::error::ExpressionError;
use syncline_connector::operation::Record;
use syncline_connector::ExpressionEvaluator;
use tracing::{debug, info, warn};

use crate::config::EvaluatorConfig;

/// Name of the variable holding the whole context record.
pub const SOURCE_VARIABLE: &str = "source";

/// Words that cannot be pushed as scope variables.
const RESERVED: &[&str] = &[
    "true", "false", "let", "const", "if", "else", "switch", "do", "while", "until", "loop",
    "for", "in", "continue", "break", "return", "throw", "try", "catch", "fn", "private",
    "import", "export", "as", "this", "global", "is", "Fn", "call", "curry", "print", "debug",
    "type_of", "eval", "is_def_var", "is_def_fn", "is_shared", "var", "static", "shared",
    "sync", "async", "await", "yield", "new", "use", "with", "module", "package", "super",
    "spawn", "thread", "go", "match", "case", "public", "protected", "default", "void",
    "null", "nil", "goto", "exit", SOURCE_VARIABLE,
];

/// A syntax error found by [`RhaiEvaluator::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptValidationError {
    /// Line number of the error (if available).
    pub line: Option<usize>,
    /// Column of the error (if available).
    pub column: Option<usize>,
    /// Error message.
    pub message: String,
}

/// Sandboxed Rhai evaluator.
#[derive(Debug, Clone, Default)]
pub struct RhaiEvaluator {
    config: EvaluatorConfig,
}

impl RhaiEvaluator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: EvaluatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Check an expression for syntax errors without running it.
    ///
    /// Variables are not resolved, since the context is only known per record.
    #[must_use]
    pub fn validate(&self, code: &str) -> Vec<ScriptValidationError> {
        let engine = self.create_engine(false);
        match engine.compile(code) {
            Ok(_) => vec![],
            Err(e) => vec![ScriptValidationError {
                line: e.position().line(),
                column: e.position().position(),
                message: e.to_string(),
            }],
        }
    }

    /// Create a sandboxed engine with the built-in helpers.
    fn create_engine(&self, strict: bool) -> Engine {
        let mut engine = Engine::new();

        engine.set_max_operations(self.config.max_operations);
        engine.set_max_call_levels(self.config.max_call_levels);
        engine.set_max_string_size(self.config.max_string_size);
        engine.set_max_array_size(self.config.max_array_size);
        engine.set_max_map_size(self.config.max_map_size);
        engine.set_strict_variables(strict);

        if self.config.timeout_ms > 0 {
            let budget = Duration::from_millis(self.config.timeout_ms);
            let started = Instant::now();
            engine.on_progress(move |_operations| {
                if started.elapsed() > budget {
                    Some(Dynamic::UNIT)
                } else {
                    None
                }
            });
        }

        register_builtin_functions(&mut engine);
        engine
    }

    fn build_scope(context: &Record) -> Result<Scope<'static>, ExpressionError> {
        let mut scope = Scope::new();

        for (key, value) in context {
            if is_identifier(key) {
                scope.push_dynamic(key.clone(), to_dynamic(value)?);
            }
        }

        let whole = rhai::serde::to_dynamic(context)
            .map_err(|e| ExpressionError::Conversion(e.to_string()))?;
        scope.push_dynamic(SOURCE_VARIABLE, whole);

        Ok(scope)
    }

    fn map_error(&self, error: &EvalAltResult) -> ExpressionError {
        match error {
            EvalAltResult::ErrorTerminated(..) | EvalAltResult::ErrorTooManyOperations(..) => {
                ExpressionError::Timeout {
                    timeout_ms: self.config.timeout_ms,
                }
            }
            other => ExpressionError::Runtime(other.to_string()),
        }
    }
}

impl ExpressionEvaluator for RhaiEvaluator {
    fn evaluate(&self, code: &str, context: &Record) -> Result<Value, ExpressionError> {
        let engine = self.create_engine(true);
        let mut scope = Self::build_scope(context)?;

        // Compile with scope so strict_variables mode can see the context.
        let ast = engine
            .compile_with_scope(&scope, code)
            .map_err(|e| ExpressionError::Compile(e.to_string()))?;

        let result = engine
            .eval_ast_with_scope::<Dynamic>(&mut scope, &ast)
            .map_err(|e| self.map_error(&e))?;

        let value = rhai::serde::from_dynamic::<Value>(&result)
            .map_err(|e| ExpressionError::Conversion(e.to_string()))?;
        debug!(expression_len = code.len(), "expression evaluated");
        Ok(value)
    }
}

fn to_dynamic(value: &Value) -> Result<Dynamic, ExpressionError> {
    rhai::serde::to_dynamic(value).map_err(|e| ExpressionError::Conversion(e.to_string()))
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && key != "_"
        && !RESERVED.contains(&key)
}

/// Empty means unit or an empty string.
fn is_empty_value(v: &Dynamic) -> bool {
    v.is_unit() || (v.is_string() && v.clone().into_string().is_ok_and(|s| s.is_empty()))
}

/// Register the helper functions available to every expression.
fn register_builtin_functions(engine: &mut Engine) {
    // Strings
    engine.register_fn("lowercase", |s: &str| s.to_lowercase());
    engine.register_fn("uppercase", |s: &str| s.to_uppercase());
    engine.register_fn("trim", |s: &str| s.trim().to_string());
    engine.register_fn("concat2", |a: &str, b: &str| format!("{a}{b}"));
    engine.register_fn("split", |s: &str, sep: &str| -> rhai::Array {
        s.split(sep).map(|p| Dynamic::from(p.to_string())).collect()
    });
    engine.register_fn("join", |arr: rhai::Array, sep: &str| -> String {
        arr.iter()
            .map(std::string::ToString::to_string)
            .collect::<Vec<_>>()
            .join(sep)
    });
    engine.register_fn("replace", |s: &str, from: &str, to: &str| s.replace(from, to));

    // Defaults
    engine.register_fn("default_val", |val: Dynamic, default: Dynamic| -> Dynamic {
        if is_empty_value(&val) {
            default
        } else {
            val
        }
    });
    engine.register_fn("coalesce2", |a: Dynamic, b: Dynamic| -> Dynamic {
        if is_empty_value(&a) {
            b
        } else {
            a
        }
    });

    // Arrays
    engine.register_fn("array_first", |arr: rhai::Array| -> Dynamic {
        arr.into_iter().next().unwrap_or(Dynamic::UNIT)
    });
    engine.register_fn("array_last", |arr: rhai::Array| -> Dynamic {
        arr.into_iter().last().unwrap_or(Dynamic::UNIT)
    });
    engine.register_fn("array_contains", |arr: rhai::Array, val: Dynamic| -> bool {
        let needle = val.to_string();
        arr.iter().any(|v| v.to_string() == needle)
    });

    engine.register_fn("is_null", |val: Dynamic| val.is_unit());

    // Logging
    engine.register_fn("log_info", |msg: &str| {
        info!(expression_log = %msg, "expression log");
    });
    engine.register_fn("log_warn", |msg: &str| {
        warn!(expression_log = %msg, "expression warning");
    });
    engine.register_fn("log_debug", |msg: &str| {
        debug!(expression_log = %msg, "expression debug");
    });
}
