//! Run statistics for batch passes.

use serde::{Deserialize, Serialize};

use crate::workflow::SyncOutcome;

/// Counters for one batch pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatistics {
    /// Objects that passed the guard and were reconciled.
    #[serde(default)]
    pub processed: u32,
    /// Objects rejected by the guard.
    #[serde(default)]
    pub skipped: u32,
    /// Objects whose reconciliation returned an error.
    #[serde(default)]
    pub failed: u32,
    #[serde(default)]
    pub created: u32,
    #[serde(default)]
    pub updated: u32,
    #[serde(default)]
    pub deleted: u32,
    #[serde(default)]
    pub unchanged: u32,
    /// Wall-clock duration in milliseconds.
    #[serde(default)]
    pub duration_ms: u64,
}

impl RunStatistics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one reconciliation outcome.
    pub fn record(&mut self, outcome: SyncOutcome) {
        match outcome {
            SyncOutcome::Skipped => {
                self.skipped += 1;
                return;
            }
            SyncOutcome::Created => self.created += 1,
            SyncOutcome::Updated => self.updated += 1,
            SyncOutcome::Deleted => self.deleted += 1,
            SyncOutcome::Unchanged => self.unchanged += 1,
        }
        self.processed += 1;
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    /// Objects seen, whatever happened to them.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.processed + self.skipped + self.failed
    }

    /// Objects that caused a write.
    #[must_use]
    pub fn changed(&self) -> u32 {
        self.created + self.updated + self.deleted
    }

    /// Merge with another statistics instance.
    pub fn merge(&mut self, other: &RunStatistics) {
        self.processed += other.processed;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.created += other.created;
        self.updated += other.updated;
        self.deleted += other.deleted;
        self.unchanged += other.unchanged;
        self.duration_ms += other.duration_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_outcomes() {
        let mut stats = RunStatistics::new();
        stats.record(SyncOutcome::Created);
        stats.record(SyncOutcome::Unchanged);
        stats.record(SyncOutcome::Skipped);
        stats.record_failure();

        assert_eq!(stats.processed, 2);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.total(), 4);
        assert_eq!(stats.changed(), 1);
    }

    #[test]
    fn test_merge() {
        let mut a = RunStatistics::new();
        a.record(SyncOutcome::Deleted);
        a.duration_ms = 10;
        let mut b = RunStatistics::new();
        b.record(SyncOutcome::Updated);
        b.record_failure();
        b.duration_ms = 5;

        a.merge(&b);
        assert_eq!(a.processed, 2);
        assert_eq!(a.failed, 1);
        assert_eq!(a.deleted, 1);
        assert_eq!(a.updated, 1);
        assert_eq!(a.duration_ms, 15);
    }

    #[test]
    fn test_serialization_defaults() {
        let stats: RunStatistics = serde_json::from_str(r#"{"created": 3}"#).unwrap();
        assert_eq!(stats.created, 3);
        assert_eq!(stats.processed, 0);
    }
}
