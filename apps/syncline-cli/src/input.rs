//! Loading workflow documents and JSON records from disk.

use std::fs;
use std::path::Path;

use serde_json::Value;
use syncline_connector::operation::Record;
use syncline_provisioning::WorkflowConfig;

use crate::error::{CliError, CliResult};

/// Load a workflow definition. `.json` files are parsed as JSON, anything
/// else as YAML.
pub fn load_workflow(path: &Path) -> CliResult<WorkflowConfig> {
    let source = fs::read_to_string(path).map_err(|e| CliError::io(path, &e))?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let config = if is_json {
        WorkflowConfig::from_json_str(&source)?
    } else {
        WorkflowConfig::from_yaml_str(&source)?
    };
    tracing::debug!(
        workflow = %config.name,
        attributes = config.mapper.definitions().len(),
        "workflow loaded"
    );
    Ok(config)
}

/// Load a single JSON object.
pub fn load_record(path: &Path) -> CliResult<Record> {
    let source = fs::read_to_string(path).map_err(|e| CliError::io(path, &e))?;
    match serde_json::from_str::<Value>(&source) {
        Ok(Value::Object(record)) => Ok(record),
        Ok(_) => Err(CliError::invalid_input(path, "expected a JSON object")),
        Err(e) => Err(CliError::invalid_input(path, e.to_string())),
    }
}
