//! CLI error types and exit codes

use std::path::Path;

use syncline_connector::error::MappingError;
use syncline_provisioning::{ConfigError, WorkflowError};
use thiserror::Error;

/// Exit codes for the CLI
/// - 0: Success
/// - 1: General error (I/O, environment)
/// - 3: Invalid input file (not JSON, not an object)
/// - 4: Invalid workflow definition
/// - 5: A record could not be mapped
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Cannot read {path}: {message}")]
    Io { path: String, message: String },

    #[error("Invalid input in {path}: {message}")]
    InvalidInput { path: String, message: String },

    #[error("Invalid workflow: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("Invalid expression in {location}: {message}")]
    Expression { location: String, message: String },

    #[error("Mapping failed: {0}")]
    Mapping(#[from] MappingError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cannot write output: {0}")]
    Output(String),
}

impl CliError {
    pub fn io(path: &Path, error: &std::io::Error) -> Self {
        CliError::Io {
            path: path.display().to_string(),
            message: error.to_string(),
        }
    }

    pub fn invalid_input(path: &Path, message: impl Into<String>) -> Self {
        CliError::InvalidInput {
            path: path.display().to_string(),
            message: message.into(),
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Io { .. } | CliError::Config(_) | CliError::Output(_) => 1,
            CliError::InvalidInput { .. } => 3,
            CliError::Workflow(_) | CliError::Expression { .. } => 4,
            CliError::Mapping(MappingError::Configuration { .. }) => 4,
            CliError::Mapping(MappingError::Resolution { .. }) => 5,
        }
    }

    /// Print the error to stderr
    pub fn print(&self) {
        if std::env::var("NO_COLOR").is_err() {
            eprintln!("\x1b[31mError:\x1b[0m {self}");
        } else {
            eprintln!("Error: {self}");
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(error: serde_json::Error) -> Self {
        CliError::Output(error.to_string())
    }
}
