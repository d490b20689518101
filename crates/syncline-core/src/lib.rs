//! syncline Core Library
//!
//! Shared types for syncline.
//!
//! # Modules
//!
//! - [`ids`] - Strongly typed identifiers (`ObjectId`, `RelationId`)
//! - [`lookup`] - Single-object lookup outcomes (`Lookup`)
//! - [`path`] - Dotted-path get/set/remove over nested JSON values
//! - [`error`] - Path access errors (`PathError`)
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use syncline_core::{path, Lookup, ObjectId};
//!
//! let id = ObjectId::new();
//! let record = json!({"user": {"login": "ada"}});
//!
//! let found = Lookup::from_matches(path::get(&record, "user.login"));
//! assert!(found.is_found());
//! assert_eq!(id.to_string().len(), 36);
//! ```

pub mod error;
pub mod ids;
pub mod lookup;
pub mod path;

pub use error::{PathError, Result};
pub use ids::{ObjectId, ParseIdError, RelationId};
pub use lookup::Lookup;
