//! Shared test doubles for workflow integration tests.
//!
//! `MemoryStore` and `MemoryEndpoint` keep everything in vectors behind
//! mutexes and count calls with atomics so tests can assert which
//! collaborator operations ran.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use syncline_core::{ObjectId, RelationId};
use syncline_provisioning::prelude::*;
use syncline_provisioning::{StoreError, StoreResult};

pub const ENDPOINT: &str = "ldap";

pub fn ts(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap()
}

pub fn record(value: Value) -> Record {
    value.as_object().cloned().unwrap()
}

pub fn workflow(document: Value) -> Workflow {
    Workflow::new(WorkflowConfig::from_json_str(&document.to_string()).unwrap())
}

// =============================================================================
// Canonical store
// =============================================================================

#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<Vec<CanonicalObject>>,
    relations: Mutex<Vec<Relation>>,
    pub writes: AtomicUsize,
    /// When set, every call fails with a transient error.
    pub unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, collection: &str, data: Value) -> ObjectId {
        let object = CanonicalObject::new(collection, record(data));
        let id = object.id;
        self.objects.lock().unwrap().push(object);
        id
    }

    pub fn insert_with_status(
        &self,
        collection: &str,
        data: Value,
        status: SyncStatus,
    ) -> ObjectId {
        let mut object = CanonicalObject::new(collection, record(data));
        object.apply_seed(StatusSeed::new(ENDPOINT, status));
        let id = object.id;
        self.objects.lock().unwrap().push(object);
        id
    }

    pub fn link(&self, source: ObjectId, target: ObjectId, attribute: &str) -> RelationId {
        let id = RelationId::new();
        self.relations.lock().unwrap().push(Relation {
            id,
            source,
            target,
            attribute: attribute.to_string(),
        });
        id
    }

    pub fn object(&self, id: ObjectId) -> Option<CanonicalObject> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.id == id)
            .cloned()
    }

    pub fn objects(&self, collection: &str) -> Vec<CanonicalObject> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .filter(|o| o.collection == collection)
            .cloned()
            .collect()
    }

    pub fn find(&self, collection: &str, attribute: &str, value: &str) -> Option<CanonicalObject> {
        self.objects(collection)
            .into_iter()
            .find(|o| o.data.get(attribute).and_then(Value::as_str) == Some(value))
    }

    pub fn edges(&self, source: ObjectId) -> Vec<Relation> {
        self.relations
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.source == source)
            .cloned()
            .collect()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                message: "connection refused".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CanonicalStore for MemoryStore {
    async fn get_object(
        &self,
        collection: &str,
        filter: &Filter,
        _include_data: bool,
    ) -> StoreResult<Lookup<CanonicalObject>> {
        self.check()?;
        let objects = self.objects.lock().unwrap();
        Ok(Lookup::from_matches(
            objects
                .iter()
                .filter(|o| o.collection == collection && filter.matches(&o.data))
                .cloned(),
        ))
    }

    async fn load_object(&self, id: ObjectId) -> StoreResult<Option<CanonicalObject>> {
        self.check()?;
        Ok(self.object(id))
    }

    async fn create_object(
        &self,
        collection: &str,
        data: Record,
        simulate: bool,
        seed: Option<StatusSeed>,
    ) -> StoreResult<ObjectId> {
        self.check()?;
        let mut object = CanonicalObject::new(collection, data);
        if let Some(seed) = seed {
            object.apply_seed(seed);
        }
        let id = object.id;
        if !simulate {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.objects.lock().unwrap().push(object);
        }
        Ok(id)
    }

    async fn change_object(
        &self,
        object: &CanonicalObject,
        data: Record,
        simulate: bool,
        seed: Option<StatusSeed>,
    ) -> StoreResult<bool> {
        self.check()?;
        if simulate {
            return Ok(true);
        }
        let mut objects = self.objects.lock().unwrap();
        let stored = objects
            .iter_mut()
            .find(|o| o.id == object.id)
            .ok_or_else(|| StoreError::not_found(object.id))?;
        stored.data = data;
        stored.version += 1;
        if let Some(seed) = seed {
            stored.apply_seed(seed);
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn delete_object(&self, id: ObjectId, simulate: bool) -> StoreResult<bool> {
        self.check()?;
        if simulate {
            return Ok(self.object(id).is_some());
        }
        let mut objects = self.objects.lock().unwrap();
        let before = objects.len();
        objects.retain(|o| o.id != id);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(objects.len() != before)
    }

    async fn list_relations(&self, source: ObjectId) -> StoreResult<Vec<Relation>> {
        self.check()?;
        Ok(self.edges(source))
    }

    async fn create_relation(
        &self,
        source: ObjectId,
        target: ObjectId,
        attribute: &str,
        simulate: bool,
    ) -> StoreResult<RelationId> {
        self.check()?;
        if simulate {
            return Ok(RelationId::new());
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(self.link(source, target, attribute))
    }

    async fn update_relation(
        &self,
        relation: &Relation,
        target: ObjectId,
        simulate: bool,
    ) -> StoreResult<bool> {
        self.check()?;
        if simulate {
            return Ok(true);
        }
        let mut relations = self.relations.lock().unwrap();
        let Some(stored) = relations.iter_mut().find(|r| r.id == relation.id) else {
            return Ok(false);
        };
        stored.target = target;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn delete_relation(&self, id: RelationId, simulate: bool) -> StoreResult<bool> {
        self.check()?;
        if simulate {
            return Ok(true);
        }
        let mut relations = self.relations.lock().unwrap();
        let before = relations.len();
        relations.retain(|r| r.id != id);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(relations.len() != before)
    }

    async fn list_stale(
        &self,
        collection: &str,
        endpoint: &str,
        before: DateTime<Utc>,
    ) -> StoreResult<Vec<CanonicalObject>> {
        self.check()?;
        Ok(self
            .objects(collection)
            .into_iter()
            .filter(|o| {
                o.status_for(endpoint)
                    .is_some_and(|status| status.last_sync < before)
            })
            .collect())
    }
}

// =============================================================================
// Endpoint
// =============================================================================

#[derive(Default)]
pub struct MemoryEndpoint {
    rows: Mutex<Vec<Record>>,
    pub flush: bool,
    /// `get_one` cannot evaluate any filter and answers `Unresolvable`.
    pub unresolvable: bool,
    pub lookups: AtomicUsize,
    pub creates: AtomicUsize,
    pub changes: AtomicUsize,
    pub deletes: AtomicUsize,
    /// Creating a record whose `login` equals this value fails transiently.
    pub fail_login: Mutex<Option<String>>,
}

impl MemoryEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flushing() -> Self {
        Self {
            flush: true,
            ..Self::default()
        }
    }

    pub fn unresolvable(rows: Vec<Value>) -> Self {
        Self {
            unresolvable: true,
            ..Self::with_rows(rows)
        }
    }

    pub fn with_rows(rows: Vec<Value>) -> Self {
        let endpoint = Self::new();
        *endpoint.rows.lock().unwrap() = rows.into_iter().map(record).collect();
        endpoint
    }

    pub fn fail_on(&self, login: &str) {
        *self.fail_login.lock().unwrap() = Some(login.to_string());
    }

    pub fn rows(&self) -> Vec<Record> {
        self.rows.lock().unwrap().clone()
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Endpoint for MemoryEndpoint {
    fn name(&self) -> &str {
        ENDPOINT
    }

    fn flush_required(&self) -> bool {
        self.flush
    }

    async fn get_one(
        &self,
        filter: &Record,
        _attributes: &[String],
    ) -> ConnectorResult<Lookup<Record>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.unresolvable {
            return Ok(Lookup::Unresolvable);
        }
        let filter = Filter::from_record(filter);
        let rows = self.rows.lock().unwrap();
        Ok(Lookup::from_matches(
            rows.iter().filter(|row| filter.matches(row)).cloned(),
        ))
    }

    async fn create(
        &self,
        _mapper: &AttributeMapper,
        record: &Record,
    ) -> ConnectorResult<Option<Uid>> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        let failing = self.fail_login.lock().unwrap().clone();
        if failing.is_some() && record.get("login").and_then(Value::as_str) == failing.as_deref() {
            return Err(ConnectorError::unreachable("connection reset by peer"));
        }
        let mut rows = self.rows.lock().unwrap();
        if let Some(login) = record.get("login") {
            if rows.iter().any(|row| row.get("login") == Some(login)) {
                return Err(ConnectorError::conflict(format!("login={login}")));
            }
        }
        rows.push(record.clone());
        Ok(Some(Uid::from_value(rows.len().to_string())))
    }

    async fn change(
        &self,
        _mapper: &AttributeMapper,
        delta: &AttributeDelta,
        _record: &Record,
        existing: &Record,
    ) -> ConnectorResult<Option<Uid>> {
        self.changes.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|row| *row == existing)
            .ok_or_else(|| ConnectorError::not_found(format!("{existing:?}")))?;
        for (name, value) in &delta.replace {
            row.insert(name.clone(), value.clone());
        }
        for name in &delta.clear {
            row.shift_remove(name);
        }
        for (name, value) in &delta.add {
            let merged =
                syncline_connector::value::union(row.get(name).unwrap_or(&Value::Null), value);
            row.insert(name.clone(), merged);
        }
        Ok(None)
    }

    async fn delete(
        &self,
        _mapper: &AttributeMapper,
        _record: &Record,
        existing: &Record,
    ) -> ConnectorResult<bool> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|row| row != existing);
        Ok(rows.len() != before)
    }
}
