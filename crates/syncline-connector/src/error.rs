//! Error types for the connector layer.
//!
//! [`ConnectorError`] sorts endpoint failures into the few classes the
//! workflow engine reacts to differently: an endpoint that could not be
//! reached (worth retrying), a request it refused, a missing target, a create
//! that collided with an existing object, and data it could not read.

use thiserror::Error;

/// Failure reported by an [`Endpoint`](crate::Endpoint).
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The endpoint could not be reached or dropped the exchange midway.
    #[error("endpoint unreachable: {message}")]
    Unreachable {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The endpoint answered but refused the request (credentials,
    /// permissions, schema constraints).
    #[error("endpoint rejected the request: {message}")]
    Rejected { message: String },

    /// A change or delete addressed an object the endpoint no longer holds.
    #[error("no endpoint object matches {identifier}")]
    NotFound { identifier: String },

    /// A create collided with an object the endpoint already holds.
    #[error("endpoint object {identifier} already exists")]
    Conflict { identifier: String },

    /// A payload from or for the endpoint was malformed.
    #[error("malformed endpoint data: {message}")]
    InvalidData { message: String },
}

impl ConnectorError {
    /// Whether the same call may succeed later.
    pub fn is_transient(&self) -> bool {
        matches!(self, ConnectorError::Unreachable { .. })
    }

    /// Stable code used in run reports.
    pub fn error_code(&self) -> &'static str {
        match self {
            ConnectorError::Unreachable { .. } => "ENDPOINT_UNREACHABLE",
            ConnectorError::Rejected { .. } => "ENDPOINT_REJECTED",
            ConnectorError::NotFound { .. } => "ENDPOINT_OBJECT_NOT_FOUND",
            ConnectorError::Conflict { .. } => "ENDPOINT_OBJECT_CONFLICT",
            ConnectorError::InvalidData { .. } => "ENDPOINT_INVALID_DATA",
        }
    }

    pub fn unreachable(message: impl Into<String>) -> Self {
        ConnectorError::Unreachable {
            message: message.into(),
            source: None,
        }
    }

    pub fn unreachable_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ConnectorError::Unreachable {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        ConnectorError::Rejected {
            message: message.into(),
        }
    }

    pub fn not_found(identifier: impl Into<String>) -> Self {
        ConnectorError::NotFound {
            identifier: identifier.into(),
        }
    }

    pub fn conflict(identifier: impl Into<String>) -> Self {
        ConnectorError::Conflict {
            identifier: identifier.into(),
        }
    }
}

impl From<serde_json::Error> for ConnectorError {
    fn from(err: serde_json::Error) -> Self {
        ConnectorError::InvalidData {
            message: err.to_string(),
        }
    }
}

/// Result type for endpoint operations.
pub type ConnectorResult<T> = Result<T, ConnectorError>;

/// Error raised while loading attribute definitions or mapping a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// The definition itself is malformed. Raised at load time.
    #[error("invalid definition for attribute '{attribute}': {message}")]
    Configuration { attribute: String, message: String },

    /// A value could not be produced for a required attribute, or it failed
    /// validation.
    #[error("cannot resolve attribute '{attribute}': {message}")]
    Resolution { attribute: String, message: String },
}

impl MappingError {
    pub fn configuration(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        MappingError::Configuration {
            attribute: attribute.into(),
            message: message.into(),
        }
    }

    pub fn resolution(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        MappingError::Resolution {
            attribute: attribute.into(),
            message: message.into(),
        }
    }

    /// The attribute the error refers to.
    pub fn attribute(&self) -> &str {
        match self {
            MappingError::Configuration { attribute, .. }
            | MappingError::Resolution { attribute, .. } => attribute,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            MappingError::Configuration { .. } => "MAPPING_CONFIGURATION",
            MappingError::Resolution { .. } => "MAPPING_RESOLUTION",
        }
    }
}

/// Error raised by an expression evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    /// The expression failed to parse.
    #[error("expression compilation failed: {0}")]
    Compile(String),

    /// The expression raised an error while running.
    #[error("expression runtime error: {0}")]
    Runtime(String),

    /// The expression exceeded its wall-clock budget.
    #[error("expression timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The result or the context could not be converted.
    #[error("expression value conversion failed: {0}")]
    Conversion(String),
}
