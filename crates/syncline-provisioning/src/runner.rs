//! Batch runner.
//!
//! Drives a [`Workflow`] over a sequence of objects. Each object is an
//! independent unit of work: a failure is recorded in the [`RunReport`] and
//! the batch moves on to the next object.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use syncline_connector::operation::Record;
use tracing::{info, instrument, warn};

use crate::statistics::RunStatistics;
use crate::store::CanonicalObject;
use crate::workflow::{SyncContext, SyncOutcome, Workflow, WorkflowError, WorkflowResult};

/// A per-object failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectFailure {
    /// Record position for imports, canonical object id otherwise.
    pub key: String,
    pub error_code: String,
    pub message: String,
    pub retryable: bool,
}

impl ObjectFailure {
    fn new(key: impl Into<String>, error: &WorkflowError) -> Self {
        Self {
            key: key.into(),
            error_code: error.error_code().to_string(),
            message: error.to_string(),
            retryable: error.is_retryable(),
        }
    }
}

/// Result of one batch pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub statistics: RunStatistics,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ObjectFailure>,
}

impl RunReport {
    fn track(&mut self, key: impl FnOnce() -> String, result: WorkflowResult<SyncOutcome>) {
        match result {
            Ok(outcome) => self.statistics.record(outcome),
            Err(error) => {
                let failure = ObjectFailure::new(key(), &error);
                warn!(
                    key = %failure.key,
                    error_code = %failure.error_code,
                    retryable = failure.retryable,
                    error = %error,
                    "object reconciliation failed"
                );
                self.statistics.record_failure();
                self.failures.push(failure);
            }
        }
    }

    /// Objects worth retrying.
    pub fn retryable(&self) -> impl Iterator<Item = &ObjectFailure> {
        self.failures.iter().filter(|f| f.retryable)
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs one workflow over batches of objects.
pub struct SyncRunner<'a> {
    workflow: &'a Workflow,
    ctx: SyncContext<'a>,
    simulate: bool,
}

impl<'a> SyncRunner<'a> {
    pub fn new(workflow: &'a Workflow, ctx: SyncContext<'a>) -> Self {
        Self {
            workflow,
            ctx,
            simulate: false,
        }
    }

    /// Dry-run every pass.
    pub fn simulate(mut self, simulate: bool) -> Self {
        self.simulate = simulate;
        self
    }

    /// Import endpoint records into the workflow's collection.
    #[instrument(skip(self, records), fields(workflow = %self.workflow.name()))]
    pub async fn import_all<I>(&self, records: I, timestamp: DateTime<Utc>) -> RunReport
    where
        I: IntoIterator<Item = Record>,
    {
        let started = Instant::now();
        let collection = &self.workflow.config().collection;
        let mut report = RunReport::default();

        for (index, record) in records.into_iter().enumerate() {
            let result = self
                .workflow
                .import(&self.ctx, collection, &record, timestamp, self.simulate)
                .await;
            report.track(|| format!("record[{index}]"), result);
        }

        self.finish(report, started, "import")
    }

    /// Export canonical objects to the endpoint.
    #[instrument(skip(self, objects), fields(workflow = %self.workflow.name()))]
    pub async fn export_all(
        &self,
        objects: &[CanonicalObject],
        timestamp: DateTime<Utc>,
    ) -> RunReport {
        let started = Instant::now();
        let mut report = RunReport::default();

        for object in objects {
            let result = self
                .workflow
                .export(&self.ctx, object, timestamp, self.simulate)
                .await;
            report.track(|| object.id.to_string(), result);
        }

        self.finish(report, started, "export")
    }

    /// Run cleanup on every object of the collection the endpoint did not
    /// report during the run stamped `timestamp`.
    ///
    /// Fails only when the stale objects cannot be listed.
    #[instrument(skip(self), fields(workflow = %self.workflow.name()))]
    pub async fn collect_garbage(&self, timestamp: DateTime<Utc>) -> WorkflowResult<RunReport> {
        let started = Instant::now();
        let stale = self
            .ctx
            .store
            .list_stale(
                &self.workflow.config().collection,
                self.ctx.endpoint.name(),
                timestamp,
            )
            .await?;
        let mut report = RunReport::default();

        for object in &stale {
            let result = self
                .workflow
                .cleanup(&self.ctx, object, timestamp, self.simulate)
                .await;
            report.track(|| object.id.to_string(), result);
        }

        Ok(self.finish(report, started, "cleanup"))
    }

    fn finish(&self, mut report: RunReport, started: Instant, pass: &str) -> RunReport {
        report.statistics.duration_ms =
            u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let stats = &report.statistics;
        info!(
            pass,
            simulate = self.simulate,
            processed = stats.processed,
            skipped = stats.skipped,
            failed = stats.failed,
            created = stats.created,
            updated = stats.updated,
            deleted = stats.deleted,
            duration_ms = stats.duration_ms,
            "batch pass finished"
        );
        report
    }
}
