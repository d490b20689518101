//! Workflow engine.
//!
//! Reconciles one object per call. Import pulls an endpoint record into the
//! canonical store, export pushes a canonical object to the endpoint, and
//! cleanup handles canonical objects whose source record disappeared.
//!
//! Import and export share one resolution table, applied against the
//! canonical store for import and the endpoint for export:
//!
//! | ensure | target exists | action |
//! |---|---|---|
//! | EXISTS | yes | no-op |
//! | EXISTS | no | create |
//! | ABSENT | yes | delete |
//! | ABSENT | no | no-op |
//! | LAST | yes | diff-based update |
//! | LAST | no | create |
//!
//! With `simulate` set, mapping, lookups and diffs still run but no endpoint
//! write happens and store writes are flagged as simulated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use syncline_connector::mapping::EnsureMode;
use syncline_connector::operation::{Filter, Record};
use syncline_connector::value::{is_empty, values_equal};
use syncline_connector::{Endpoint, ExpressionEvaluator};
use syncline_core::Lookup;
use tracing::{debug, info, instrument, warn};

use super::config::WorkflowConfig;
use super::error::{WorkflowError, WorkflowResult};
use super::merge::merge;
use super::relations;
use crate::store::{CanonicalObject, CanonicalStore, StatusSeed, SyncStatus};

/// Key under which export guards see related objects.
pub const RELATIONS_KEY: &str = "relations";

/// Collaborators for one reconciliation call.
#[derive(Clone, Copy)]
pub struct SyncContext<'a> {
    pub store: &'a dyn CanonicalStore,
    pub endpoint: &'a dyn Endpoint,
    pub evaluator: &'a dyn ExpressionEvaluator,
}

impl<'a> SyncContext<'a> {
    pub fn new(
        store: &'a dyn CanonicalStore,
        endpoint: &'a dyn Endpoint,
        evaluator: &'a dyn ExpressionEvaluator,
    ) -> Self {
        Self {
            store,
            endpoint,
            evaluator,
        }
    }
}

/// What a reconciliation pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    /// The guard rejected the object.
    Skipped,
    Created,
    Updated,
    Deleted,
    /// Nothing needed to change.
    Unchanged,
}

impl SyncOutcome {
    /// Whether the object passed the guard and was reconciled.
    pub fn is_processed(&self) -> bool {
        !matches!(self, SyncOutcome::Skipped)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SyncOutcome::Skipped => "skipped",
            SyncOutcome::Created => "created",
            SyncOutcome::Updated => "updated",
            SyncOutcome::Deleted => "deleted",
            SyncOutcome::Unchanged => "unchanged",
        }
    }
}

impl std::fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolution-table action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Nothing,
    Create,
    Update,
    Delete,
}

fn resolve_action(ensure: EnsureMode, exists: bool) -> Action {
    match (ensure, exists) {
        (EnsureMode::Exists, true) | (EnsureMode::Absent, false) => Action::Nothing,
        (EnsureMode::Exists, false) | (EnsureMode::Last, false) => Action::Create,
        (EnsureMode::Absent, true) => Action::Delete,
        (EnsureMode::Last, true) => Action::Update,
        // Rejected when the workflow is loaded.
        (EnsureMode::Merge, _) => Action::Nothing,
    }
}

/// One validated workflow.
#[derive(Debug, Clone)]
pub struct Workflow {
    config: WorkflowConfig,
}

impl Workflow {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Evaluate the guard. Evaluator failures count as a rejection.
    fn guard_passes(&self, evaluator: &dyn ExpressionEvaluator, context: &Record) -> bool {
        let Some(condition) = &self.config.condition else {
            return true;
        };
        match evaluator.evaluate_condition(condition, context) {
            Ok(passed) => {
                if !passed {
                    debug!(workflow = %self.config.name, "guard rejected object");
                }
                passed
            }
            Err(e) => {
                warn!(workflow = %self.config.name, error = %e, "guard failed, skipping object");
                false
            }
        }
    }

    /// Reject a context whose endpoint is not the one this workflow is bound to.
    fn check_endpoint(&self, ctx: &SyncContext<'_>) -> WorkflowResult<()> {
        let actual = ctx.endpoint.name();
        if actual != self.config.endpoint {
            return Err(WorkflowError::configuration(
                &self.config.name,
                format!(
                    "bound to endpoint '{}' but run against '{actual}'",
                    self.config.endpoint
                ),
            ));
        }
        Ok(())
    }

    fn seed(&self, ctx: &SyncContext<'_>, status: SyncStatus) -> StatusSeed {
        StatusSeed::new(ctx.endpoint.name(), status)
    }

    /// Pull one endpoint record into `collection`.
    #[instrument(skip(self, ctx, record), fields(workflow = %self.config.name))]
    pub async fn import(
        &self,
        ctx: &SyncContext<'_>,
        collection: &str,
        record: &Record,
        timestamp: DateTime<Utc>,
        simulate: bool,
    ) -> WorkflowResult<SyncOutcome> {
        self.check_endpoint(ctx)?;
        if !self.guard_passes(ctx.evaluator, record) {
            return Ok(SyncOutcome::Skipped);
        }

        let mapped = self.config.mapper.map(record, ctx.evaluator)?;
        let filter = self.identifier_filter(&mapped)?;

        let existing = match ctx.store.get_object(collection, &filter, true).await? {
            Lookup::Found(object) => Some(object),
            Lookup::NotFound | Lookup::Unresolvable => None,
            Lookup::Multiple { count } => {
                return Err(WorkflowError::ambiguous(
                    format!("canonical object in '{collection}'"),
                    count,
                ))
            }
        };

        let action = resolve_action(self.config.ensure, existing.is_some());
        let seed = self.seed(ctx, SyncStatus::synced(timestamp));

        let outcome = match (action, existing) {
            (Action::Create, _) => {
                let id = ctx
                    .store
                    .create_object(collection, mapped.clone(), simulate, Some(seed))
                    .await?;
                if !simulate {
                    relations::reconcile(ctx.store, &self.config.mapper, id, &mapped, simulate)
                        .await?;
                }
                info!(object = %id, simulate, "canonical object created");
                SyncOutcome::Created
            }
            (Action::Update, Some(object)) => {
                let merged = merge(&self.config.mapper, &mapped, &object.data);
                let changed = !same_data(&merged, &object.data);
                ctx.store
                    .change_object(&object, merged.clone(), simulate, Some(seed))
                    .await?;
                let edges =
                    relations::reconcile(ctx.store, &self.config.mapper, object.id, &merged, simulate)
                        .await?;
                if changed || !edges.is_empty() {
                    info!(object = %object.id, simulate, "canonical object updated");
                    SyncOutcome::Updated
                } else {
                    SyncOutcome::Unchanged
                }
            }
            (Action::Delete, Some(object)) => {
                relations::remove_all(ctx.store, object.id, simulate).await?;
                ctx.store.delete_object(object.id, simulate).await?;
                info!(object = %object.id, simulate, "canonical object deleted");
                SyncOutcome::Deleted
            }
            _ => SyncOutcome::Unchanged,
        };

        Ok(outcome)
    }

    /// Filter on the declared identifier attributes of a mapped record.
    ///
    /// Every identifier must have resolved; a partial identifier set could
    /// match the wrong object.
    fn identifier_filter(&self, mapped: &Record) -> WorkflowResult<Filter> {
        if self.config.identifiers.is_empty() {
            return Err(WorkflowError::configuration(
                &self.config.name,
                "import requires at least one identifier attribute",
            ));
        }

        let mut key = Record::new();
        for identifier in &self.config.identifiers {
            let Some(value) = mapped.get(identifier) else {
                return Err(WorkflowError::configuration(
                    &self.config.name,
                    format!("identifier '{identifier}' did not resolve"),
                ));
            };
            key.insert(identifier.clone(), value.clone());
        }
        Ok(Filter::from_record(&key))
    }

    /// Push one canonical object to the endpoint.
    #[instrument(
        skip(self, ctx, object),
        fields(workflow = %self.config.name, object = %object.id)
    )]
    pub async fn export(
        &self,
        ctx: &SyncContext<'_>,
        object: &CanonicalObject,
        timestamp: DateTime<Utc>,
        simulate: bool,
    ) -> WorkflowResult<SyncOutcome> {
        self.check_endpoint(ctx)?;
        if self.config.condition.is_some() {
            let mut context = object.data.clone();
            let related = relations::related_data(ctx.store, object.id).await?;
            context.insert(RELATIONS_KEY.to_string(), Value::Object(related));
            if !self.guard_passes(ctx.evaluator, &context) {
                return Ok(SyncOutcome::Skipped);
            }
        }

        let mapper = &self.config.mapper;
        let mapped = mapper.map(&object.data, ctx.evaluator)?;
        let existing = self.lookup_endpoint(ctx, &mapped).await?;
        let previous_id = object
            .status_for(ctx.endpoint.name())
            .and_then(|status| status.id.clone());

        let outcome = match (resolve_action(self.config.ensure, existing.is_some()), existing) {
            (Action::Create, _) => {
                let uid = if simulate {
                    None
                } else {
                    ctx.endpoint.create(mapper, &mapped).await?
                };
                let id = uid.map(|uid| uid.value().to_string()).or(previous_id);
                self.stamp(ctx, object, timestamp, "created", id, simulate)
                    .await?;
                info!(endpoint = %ctx.endpoint.name(), simulate, "endpoint object created");
                SyncOutcome::Created
            }
            (Action::Update, Some(current)) => {
                let diff = mapper.get_diff(&mapped, &current);
                if diff.is_empty() {
                    self.stamp(ctx, object, timestamp, "unchanged", previous_id, simulate)
                        .await?;
                    SyncOutcome::Unchanged
                } else {
                    let delta = ctx.endpoint.native_diff(mapper, &diff)?;
                    let uid = if simulate {
                        None
                    } else {
                        ctx.endpoint.change(mapper, &delta, &mapped, &current).await?
                    };
                    let id = uid.map(|uid| uid.value().to_string()).or(previous_id);
                    self.stamp(ctx, object, timestamp, "updated", id, simulate)
                        .await?;
                    info!(
                        endpoint = %ctx.endpoint.name(),
                        attributes = ?diff.attributes(),
                        simulate,
                        "endpoint object updated"
                    );
                    SyncOutcome::Updated
                }
            }
            (Action::Delete, Some(current)) => {
                if !simulate {
                    ctx.endpoint.delete(mapper, &mapped, &current).await?;
                }
                self.stamp(ctx, object, timestamp, "deleted", None, simulate)
                    .await?;
                info!(endpoint = %ctx.endpoint.name(), simulate, "endpoint object deleted");
                SyncOutcome::Deleted
            }
            _ => SyncOutcome::Unchanged,
        };

        Ok(outcome)
    }

    /// Look up the endpoint counterpart of a mapped record.
    ///
    /// Flush-required endpoints are never queried. A filter that cannot be
    /// built in full (an identifier did not resolve, or nothing mapped) means
    /// the object does not exist, and `get_one` is not called.
    async fn lookup_endpoint(
        &self,
        ctx: &SyncContext<'_>,
        mapped: &Record,
    ) -> WorkflowResult<Option<Record>> {
        if ctx.endpoint.flush_required() {
            return Ok(None);
        }

        let filter = if self.config.identifiers.is_empty() {
            mapped.clone()
        } else {
            let mut key = Record::new();
            for name in &self.config.identifiers {
                match mapped.get(name).filter(|v| !is_empty(v)) {
                    Some(value) => {
                        key.insert(name.clone(), value.clone());
                    }
                    None => {
                        debug!(
                            identifier = %name,
                            "identifier unresolved, treating endpoint object as missing"
                        );
                        return Ok(None);
                    }
                }
            }
            key
        };
        if filter.is_empty() {
            debug!("empty endpoint filter, treating endpoint object as missing");
            return Ok(None);
        }

        let attributes = self.config.mapper.output_names();
        match ctx.endpoint.get_one(&filter, &attributes).await? {
            Lookup::Found(record) => Ok(Some(record)),
            Lookup::NotFound | Lookup::Unresolvable => Ok(None),
            Lookup::Multiple { count } => Err(WorkflowError::ambiguous(
                format!("endpoint '{}' object", ctx.endpoint.name()),
                count,
            )),
        }
    }

    async fn stamp(
        &self,
        ctx: &SyncContext<'_>,
        object: &CanonicalObject,
        timestamp: DateTime<Utc>,
        result: &str,
        id: Option<String>,
        simulate: bool,
    ) -> WorkflowResult<()> {
        let status = SyncStatus::synced(timestamp).with_result(result).with_id(id);
        ctx.store
            .change_object(object, object.data.clone(), simulate, Some(self.seed(ctx, status)))
            .await?;
        Ok(())
    }

    /// Handle a canonical object whose source record is gone.
    #[instrument(
        skip(self, ctx, object),
        fields(workflow = %self.config.name, object = %object.id)
    )]
    pub async fn cleanup(
        &self,
        ctx: &SyncContext<'_>,
        object: &CanonicalObject,
        timestamp: DateTime<Utc>,
        simulate: bool,
    ) -> WorkflowResult<SyncOutcome> {
        self.check_endpoint(ctx)?;
        if !self.guard_passes(ctx.evaluator, &object.data) {
            return Ok(SyncOutcome::Skipped);
        }

        match self.config.ensure {
            EnsureMode::Absent => {
                let edges = relations::remove_all(ctx.store, object.id, simulate).await?;
                ctx.store.delete_object(object.id, simulate).await?;
                info!(relations = edges, simulate, "canonical object removed");
                Ok(SyncOutcome::Deleted)
            }
            EnsureMode::Last => {
                let mapper = &self.config.mapper;
                let merged = merge(mapper, &object.data, &object.data);
                let changed = !same_data(&merged, &object.data);
                let seed = self.seed(ctx, SyncStatus::garbage(timestamp));
                ctx.store
                    .change_object(object, merged.clone(), simulate, Some(seed))
                    .await?;
                let edges =
                    relations::reconcile(ctx.store, mapper, object.id, &merged, simulate).await?;
                debug!(changed, simulate, "canonical object marked as garbage");
                if changed || !edges.is_empty() {
                    Ok(SyncOutcome::Updated)
                } else {
                    Ok(SyncOutcome::Unchanged)
                }
            }
            EnsureMode::Exists | EnsureMode::Merge => Ok(SyncOutcome::Unchanged),
        }
    }
}

fn same_data(a: &Record, b: &Record) -> bool {
    a.len() == b.len() && a.iter().all(|(k, v)| b.get(k).is_some_and(|w| values_equal(v, w)))
}
