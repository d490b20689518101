//! Subcommand implementations.
//!
//! Each command exposes a `run` function returning its result as data, and an
//! `execute` function that prints it.

pub mod diff;
pub mod map;
pub mod validate;

use serde::Serialize;

use crate::error::CliResult;

/// Print a value as pretty JSON.
pub(crate) fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// One-line rendering of a JSON value for human output.
pub(crate) fn render(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
