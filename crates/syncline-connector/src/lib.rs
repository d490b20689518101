//! # syncline Connector
//!
//! Endpoint-facing half of syncline: the attribute mapper that turns source
//! records into canonical attribute sets, the diff it computes against an
//! endpoint record, and the [`Endpoint`] contract adapters implement.
//!
//! ## Crate Organization
//!
//! - [`error`] - Error types (`ConnectorError`, `MappingError`, `ExpressionError`)
//! - [`operation`] - Records, UIDs, diffs, deltas and filters
//! - [`mapping`] - Attribute specs and validated definitions
//! - [`transform`] - The [`AttributeMapper`] (`map`, `get_diff`)
//! - [`expression`] - The [`ExpressionEvaluator`] seam
//! - [`traits`] - The [`Endpoint`] collaborator trait
//! - [`value`] - Deep, order-insensitive value comparison
//! - [`binary`] - Binary payload wrapper
//!
//! ## Example
//!
//! ```
//! use serde_json::{json, Value};
//! use syncline_connector::prelude::*;
//!
//! struct NoExpressions;
//!
//! impl ExpressionEvaluator for NoExpressions {
//!     fn evaluate(&self, _code: &str, _context: &Record) -> Result<Value, ExpressionError> {
//!         Ok(Value::Null)
//!     }
//! }
//!
//! let specs = json!({
//!     "login": {"from": "uid"},
//!     "mail": {"from": "mail", "required": false}
//! });
//! let mapper = AttributeMapper::from_spec_map(specs.as_object().unwrap()).unwrap();
//!
//! let source = json!({"uid": "ada"}).as_object().unwrap().clone();
//! let mapped = mapper.map(&source, &NoExpressions).unwrap();
//! assert_eq!(Value::Object(mapped.clone()), json!({"login": "ada"}));
//!
//! let existing = json!({"login": "ada", "mail": "old@example.org"});
//! let diff = mapper.get_diff(&mapped, existing.as_object().unwrap());
//! assert_eq!(diff.get("mail"), Some(&DiffEntry::Remove));
//! ```

pub mod binary;
pub mod error;
pub mod expression;
pub mod mapping;
pub mod operation;
pub mod traits;
pub mod transform;
pub mod value;

pub use expression::ExpressionEvaluator;
pub use traits::Endpoint;
pub use transform::AttributeMapper;

/// Prelude module for convenient imports.
///
/// ```
/// use syncline_connector::prelude::*;
/// ```
pub mod prelude {
    // Error handling
    pub use crate::error::{ConnectorError, ConnectorResult, ExpressionError, MappingError};

    // Traits
    pub use crate::expression::ExpressionEvaluator;
    pub use crate::traits::Endpoint;

    // Operations
    pub use crate::operation::{
        AttributeDelta, AttributeDiff, DiffAction, DiffEntry, Filter, Record, Uid,
    };

    // Mapping
    pub use crate::mapping::{
        AttributeDefinition, AttributeSpec, AttributeType, EnsureMode, RelationLink,
    };
    pub use crate::transform::AttributeMapper;

    pub use syncline_core::Lookup;
}

// Re-export async_trait for endpoint implementors
pub use async_trait::async_trait;
