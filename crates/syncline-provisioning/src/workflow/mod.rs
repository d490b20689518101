//! Workflow engine: per-object import, export and cleanup reconciliation.
//!
//! A [`Workflow`] is built from a validated [`WorkflowConfig`] and driven one
//! object at a time through a [`SyncContext`] holding the canonical store, the
//! endpoint and the expression evaluator.

pub mod config;
pub mod engine;
pub mod error;
pub mod merge;
pub mod relations;

pub use config::{WorkflowConfig, WorkflowSpec};
pub use engine::{SyncContext, SyncOutcome, Workflow, RELATIONS_KEY};
pub use error::{WorkflowError, WorkflowResult};
pub use merge::merge;
pub use relations::RelationChanges;
