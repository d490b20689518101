//! Canonical store contract.
//!
//! The canonical store owns versioned objects and the relation edges between
//! them. The workflow engine only reads and writes through [`CanonicalStore`];
//! persistence and version history are the store's concern.
//!
//! Relations are edges keyed by object ids, never owned object graphs: any
//! object may be the target of several edges, and cycles are allowed.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use syncline_connector::operation::{Filter, Record};
use syncline_core::{Lookup, ObjectId, RelationId};
use thiserror::Error;

/// Per-endpoint synchronization status stored on a canonical object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncStatus {
    /// Run timestamp of the last reconciliation touching the object.
    pub last_sync: DateTime<Utc>,
    /// Set when the source no longer reports the object.
    #[serde(default)]
    pub garbage: bool,
    /// Outcome of the last endpoint write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    /// Identifier the endpoint assigned to the object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl SyncStatus {
    /// A fresh status: synced at `timestamp`, not garbage.
    pub fn synced(timestamp: DateTime<Utc>) -> Self {
        Self {
            last_sync: timestamp,
            garbage: false,
            result: None,
            id: None,
        }
    }

    /// A status marking the object as no longer present at the source.
    pub fn garbage(timestamp: DateTime<Utc>) -> Self {
        Self {
            garbage: true,
            ..Self::synced(timestamp)
        }
    }

    pub fn with_result(mut self, result: impl Into<String>) -> Self {
        self.result = Some(result.into());
        self
    }

    pub fn with_id(mut self, id: Option<String>) -> Self {
        self.id = id;
        self
    }
}

/// Status entry a write should record under an endpoint name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSeed {
    pub endpoint: String,
    pub status: SyncStatus,
}

impl StatusSeed {
    pub fn new(endpoint: impl Into<String>, status: SyncStatus) -> Self {
        Self {
            endpoint: endpoint.into(),
            status,
        }
    }
}

/// A canonical object as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalObject {
    pub id: ObjectId,
    pub collection: String,
    /// Incremented by the store on every write.
    pub version: u64,
    #[serde(default)]
    pub data: Record,
    /// Sync status keyed by endpoint name.
    #[serde(default)]
    pub status: BTreeMap<String, SyncStatus>,
}

impl CanonicalObject {
    pub fn new(collection: impl Into<String>, data: Record) -> Self {
        Self {
            id: ObjectId::new(),
            collection: collection.into(),
            version: 1,
            data,
            status: BTreeMap::new(),
        }
    }

    pub fn status_for(&self, endpoint: &str) -> Option<&SyncStatus> {
        self.status.get(endpoint)
    }

    /// Apply a status seed in place.
    pub fn apply_seed(&mut self, seed: StatusSeed) {
        self.status.insert(seed.endpoint, seed.status);
    }
}

/// A directed edge from one canonical object to another, named after the
/// attribute that declared it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub id: RelationId,
    pub source: ObjectId,
    pub target: ObjectId,
    pub attribute: String,
}

/// Canonical store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The object does not exist.
    #[error("object not found: {id}")]
    NotFound { id: String },

    /// A concurrent write won.
    #[error("version conflict on object {id}: {message}")]
    Conflict { id: String, message: String },

    /// The store could not be reached.
    #[error("store unavailable: {message}")]
    Unavailable { message: String },

    /// Any other backend failure.
    #[error("store error: {message}")]
    Backend { message: String },
}

impl StoreError {
    pub fn not_found(id: impl ToString) -> Self {
        StoreError::NotFound { id: id.to_string() }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        StoreError::Backend {
            message: message.into(),
        }
    }

    /// Conflicts and outages may succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::Conflict { .. } | StoreError::Unavailable { .. }
        )
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            StoreError::NotFound { .. } => "STORE_NOT_FOUND",
            StoreError::Conflict { .. } => "STORE_CONFLICT",
            StoreError::Unavailable { .. } => "STORE_UNAVAILABLE",
            StoreError::Backend { .. } => "STORE_ERROR",
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Operations the workflow engine needs from the canonical store.
///
/// Every write takes a `simulate` flag; a simulated write validates and
/// reports what it would do without persisting anything.
#[async_trait]
pub trait CanonicalStore: Send + Sync {
    /// Find the single object in `collection` matching `filter`.
    ///
    /// With `include_data` false the returned object may carry empty data.
    async fn get_object(
        &self,
        collection: &str,
        filter: &Filter,
        include_data: bool,
    ) -> StoreResult<Lookup<CanonicalObject>>;

    /// Load an object by id.
    async fn load_object(&self, id: ObjectId) -> StoreResult<Option<CanonicalObject>>;

    /// Create an object and return its id.
    async fn create_object(
        &self,
        collection: &str,
        data: Record,
        simulate: bool,
        seed: Option<StatusSeed>,
    ) -> StoreResult<ObjectId>;

    /// Replace an object's data and record a status entry.
    ///
    /// Returns whether the object was written.
    async fn change_object(
        &self,
        object: &CanonicalObject,
        data: Record,
        simulate: bool,
        seed: Option<StatusSeed>,
    ) -> StoreResult<bool>;

    /// Delete an object. Returns whether it existed.
    async fn delete_object(&self, id: ObjectId, simulate: bool) -> StoreResult<bool>;

    /// Edges whose source is `source`.
    async fn list_relations(&self, source: ObjectId) -> StoreResult<Vec<Relation>>;

    async fn create_relation(
        &self,
        source: ObjectId,
        target: ObjectId,
        attribute: &str,
        simulate: bool,
    ) -> StoreResult<RelationId>;

    /// Point an existing edge at a new target.
    async fn update_relation(
        &self,
        relation: &Relation,
        target: ObjectId,
        simulate: bool,
    ) -> StoreResult<bool>;

    async fn delete_relation(&self, id: RelationId, simulate: bool) -> StoreResult<bool>;

    /// Objects of `collection` whose status for `endpoint` was last synced
    /// before `before`.
    async fn list_stale(
        &self,
        collection: &str,
        endpoint: &str,
        before: DateTime<Utc>,
    ) -> StoreResult<Vec<CanonicalObject>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_status_serialization() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let status = SyncStatus::synced(ts);
        assert_eq!(
            serde_json::to_value(&status).unwrap(),
            json!({"last_sync": "2024-05-01T12:00:00Z", "garbage": false})
        );

        let status = SyncStatus::garbage(ts).with_result("deleted");
        assert!(status.garbage);
        assert_eq!(status.result.as_deref(), Some("deleted"));
    }

    #[test]
    fn test_apply_seed_replaces_entry() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut object = CanonicalObject::new("users", Record::new());
        object.apply_seed(StatusSeed::new("ldap", SyncStatus::synced(ts)));
        object.apply_seed(StatusSeed::new("ldap", SyncStatus::garbage(ts)));

        assert_eq!(object.status.len(), 1);
        assert!(object.status_for("ldap").unwrap().garbage);
    }

    #[test]
    fn test_store_error_classification() {
        assert!(StoreError::Unavailable {
            message: "down".to_string()
        }
        .is_transient());
        assert!(!StoreError::not_found("x").is_transient());
        assert_eq!(StoreError::backend("disk").error_code(), "STORE_ERROR");
    }
}
