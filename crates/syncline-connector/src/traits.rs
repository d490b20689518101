//! Endpoint collaborator contract.
//!
//! The workflow engine drives one endpoint per workflow: it looks up an
//! existing object, then creates, changes or deletes it. Adapters for
//! directories, SQL tables, REST services or files implement [`Endpoint`].

use async_trait::async_trait;
use syncline_core::Lookup;

use crate::error::ConnectorResult;
use crate::operation::{AttributeDelta, AttributeDiff, Record, Uid};
use crate::transform::AttributeMapper;

/// An external system a workflow reads from or writes to.
///
/// Write operations are never invoked during a simulated run, so they carry
/// no dry-run flag.
#[async_trait]
pub trait Endpoint: Send + Sync {
    /// Name under which sync status is recorded on canonical objects.
    fn name(&self) -> &str;

    /// Whether every export must rewrite the destination from scratch.
    ///
    /// File-like endpoints that cannot be updated in place return `true`;
    /// the engine then treats every object as new without probing.
    fn flush_required(&self) -> bool {
        false
    }

    /// Look up the single object matching `filter`.
    ///
    /// # Arguments
    /// * `filter` - Attribute values the object must have
    /// * `attributes` - Attributes to return
    ///
    /// Returns [`Lookup::Unresolvable`] when the filter references an
    /// attribute the endpoint cannot query.
    async fn get_one(
        &self,
        filter: &Record,
        attributes: &[String],
    ) -> ConnectorResult<Lookup<Record>>;

    /// Create an object. Returns the identifier assigned by the endpoint,
    /// if it reports one.
    async fn create(
        &self,
        mapper: &AttributeMapper,
        record: &Record,
    ) -> ConnectorResult<Option<Uid>>;

    /// Apply a native delta to an existing object.
    ///
    /// # Arguments
    /// * `delta` - Output of [`Endpoint::native_diff`]
    /// * `record` - The full mapped record
    /// * `existing` - The object as returned by [`Endpoint::get_one`]
    async fn change(
        &self,
        mapper: &AttributeMapper,
        delta: &AttributeDelta,
        record: &Record,
        existing: &Record,
    ) -> ConnectorResult<Option<Uid>>;

    /// Delete an existing object. Returns whether anything was removed.
    async fn delete(
        &self,
        mapper: &AttributeMapper,
        record: &Record,
        existing: &Record,
    ) -> ConnectorResult<bool>;

    /// Translate a generic diff into the endpoint's native change set.
    fn native_diff(
        &self,
        _mapper: &AttributeMapper,
        diff: &AttributeDiff,
    ) -> ConnectorResult<AttributeDelta> {
        Ok(AttributeDelta::from(diff))
    }
}
