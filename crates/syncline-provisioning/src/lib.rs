//! # syncline Provisioning
//!
//! Workflow reconciliation between endpoints and the canonical store.
//!
//! This crate provides:
//! - The [`CanonicalStore`] contract and canonical object model
//! - The workflow engine: import, export and cleanup of one object per call
//! - Generic attribute merge and relation reconciliation
//! - A Rhai-backed [`ExpressionEvaluator`](syncline_connector::ExpressionEvaluator)
//! - A batch runner with per-object failure isolation and run statistics
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  import   ┌──────────────┐   export  ┌──────────────┐
//! │   Endpoint   │──────────►│   Workflow   │──────────►│   Endpoint   │
//! │   (source)   │           │    Engine    │           │ (destination)│
//! └──────────────┘           └──────┬───────┘           └──────────────┘
//!                                   │ map / diff / merge
//!                            ┌──────▼───────┐
//!                            │  Canonical   │
//!                            │    Store     │
//!                            └──────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use syncline_provisioning::prelude::*;
//!
//! let workflow = Workflow::new(WorkflowConfig::from_yaml_str(&document)?);
//! let evaluator = RhaiEvaluator::new();
//! let ctx = SyncContext::new(&store, &ldap, &evaluator);
//!
//! let runner = SyncRunner::new(&workflow, ctx);
//! let report = runner.import_all(records, run_started).await;
//! let garbage = runner.collect_garbage(run_started).await?;
//! ```

pub mod config;
pub mod rhai_executor;
pub mod runner;
pub mod statistics;
pub mod store;
pub mod workflow;

pub use config::{ConfigError, EvaluatorConfig};
pub use rhai_executor::RhaiEvaluator;
pub use runner::{ObjectFailure, RunReport, SyncRunner};
pub use statistics::RunStatistics;
pub use store::{
    CanonicalObject, CanonicalStore, Relation, StatusSeed, StoreError, StoreResult, SyncStatus,
};
pub use workflow::{
    SyncContext, SyncOutcome, Workflow, WorkflowConfig, WorkflowError, WorkflowResult,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::EvaluatorConfig;
    pub use crate::rhai_executor::RhaiEvaluator;
    pub use crate::runner::{RunReport, SyncRunner};
    pub use crate::statistics::RunStatistics;
    pub use crate::store::{CanonicalObject, CanonicalStore, Relation, StatusSeed, SyncStatus};
    pub use crate::workflow::{
        SyncContext, SyncOutcome, Workflow, WorkflowConfig, WorkflowError, WorkflowResult,
    };
    pub use syncline_connector::prelude::*;
}
