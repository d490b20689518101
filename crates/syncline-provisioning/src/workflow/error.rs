//! Workflow error types.

use syncline_connector::error::{ConnectorError, MappingError};
use thiserror::Error;

use crate::store::StoreError;

/// Errors that abort the reconciliation of one object.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The workflow definition is invalid, or an import could not build a
    /// complete identifier set.
    #[error("configuration error in workflow '{workflow}': {message}")]
    Configuration { workflow: String, message: String },

    /// A lookup that must match at most one object matched several.
    #[error("ambiguous {target} lookup: {count} matches")]
    Ambiguous { target: String, count: usize },

    /// Mapping error.
    #[error("mapping error: {0}")]
    Mapping(#[from] MappingError),

    /// Endpoint error.
    #[error("endpoint error: {0}")]
    Connector(#[from] ConnectorError),

    /// Canonical store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl WorkflowError {
    /// Create a configuration error.
    pub fn configuration(workflow: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            workflow: workflow.into(),
            message: message.into(),
        }
    }

    /// Create an ambiguity error.
    pub fn ambiguous(target: impl Into<String>, count: usize) -> Self {
        Self::Ambiguous {
            target: target.into(),
            count,
        }
    }

    /// Whether the job layer may retry the object.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connector(e) => e.is_transient(),
            Self::Store(e) => e.is_transient(),
            Self::Configuration { .. } | Self::Ambiguous { .. } | Self::Mapping(_) => false,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "WORKFLOW_CONFIGURATION",
            Self::Ambiguous { .. } => "AMBIGUOUS_LOOKUP",
            Self::Mapping(e) => e.error_code(),
            Self::Connector(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
        }
    }
}

/// Result type for workflow operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;
