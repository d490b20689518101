//! Relation reconciliation.
//!
//! An attribute declaring `relation: {collection, attribute}` links its
//! canonical object to the single object of `collection` whose `attribute`
//! equals the mapped value. Edges are keyed by (source object, attribute
//! name) and stored by id only.

use serde_json::Value;
use syncline_connector::mapping::{AttributeDefinition, EnsureMode, RelationLink};
use syncline_connector::operation::{Filter, Record};
use syncline_connector::value::is_empty;
use syncline_connector::AttributeMapper;
use syncline_core::{Lookup, ObjectId};
use tracing::{debug, warn};

use super::error::{WorkflowError, WorkflowResult};
use crate::store::{CanonicalStore, Relation};

/// Edge changes made by one reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelationChanges {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    /// Targets that could not be resolved.
    pub skipped: usize,
}

impl RelationChanges {
    pub fn is_empty(&self) -> bool {
        self.created == 0 && self.updated == 0 && self.deleted == 0
    }
}

/// Bring the edges of `source` in line with `data`.
pub async fn reconcile(
    store: &dyn CanonicalStore,
    mapper: &AttributeMapper,
    source: ObjectId,
    data: &Record,
    simulate: bool,
) -> WorkflowResult<RelationChanges> {
    let mut changes = RelationChanges::default();
    let edges = store.list_relations(source).await?;

    for definition in mapper.relations() {
        let Some(link) = &definition.relation else {
            continue;
        };
        let current: Vec<&Relation> = edges
            .iter()
            .filter(|edge| edge.attribute == definition.name)
            .collect();

        reconcile_attribute(
            store,
            definition,
            link,
            source,
            data,
            &current,
            simulate,
            &mut changes,
        )
        .await?;
    }

    Ok(changes)
}

#[allow(clippy::too_many_arguments)]
async fn reconcile_attribute(
    store: &dyn CanonicalStore,
    definition: &AttributeDefinition,
    link: &RelationLink,
    source: ObjectId,
    data: &Record,
    current: &[&Relation],
    simulate: bool,
    changes: &mut RelationChanges,
) -> WorkflowResult<()> {
    let name = definition.name.as_str();
    let value = data.get(name).filter(|v| !is_empty(v));

    let value = match (definition.ensure, value) {
        (EnsureMode::Absent, _) | (EnsureMode::Last, None) => {
            for edge in current {
                store.delete_relation(edge.id, simulate).await?;
                changes.deleted += 1;
                debug!(attribute = %name, relation = %edge.id, "relation removed");
            }
            return Ok(());
        }
        (_, None) => return Ok(()),
        (_, Some(value)) => value,
    };

    let Some(target) = resolve_target(store, link, name, value).await? else {
        changes.skipped += 1;
        return Ok(());
    };

    let (first, extra) = match current.split_first() {
        Some((first, extra)) => (Some(*first), extra),
        None => (None, &[][..]),
    };
    for edge in extra {
        store.delete_relation(edge.id, simulate).await?;
        changes.deleted += 1;
    }

    match first {
        None => {
            let id = store
                .create_relation(source, target, name, simulate)
                .await?;
            changes.created += 1;
            debug!(attribute = %name, relation = %id, target = %target, "relation created");
        }
        Some(edge) if edge.target != target && definition.ensure != EnsureMode::Exists => {
            store.update_relation(edge, target, simulate).await?;
            changes.updated += 1;
            debug!(attribute = %name, relation = %edge.id, target = %target, "relation retargeted");
        }
        Some(_) => {}
    }

    Ok(())
}

async fn resolve_target(
    store: &dyn CanonicalStore,
    link: &RelationLink,
    attribute: &str,
    value: &Value,
) -> WorkflowResult<Option<ObjectId>> {
    let filter = Filter::eq(link.attribute.clone(), value.clone());
    match store.get_object(&link.collection, &filter, false).await? {
        Lookup::Found(object) => Ok(Some(object.id)),
        Lookup::NotFound | Lookup::Unresolvable => {
            warn!(
                attribute = %attribute,
                collection = %link.collection,
                match_attribute = %link.attribute,
                "relation target not found, skipping"
            );
            Ok(None)
        }
        Lookup::Multiple { count } => Err(WorkflowError::ambiguous(
            format!("relation '{attribute}' target in '{}'", link.collection),
            count,
        )),
    }
}

/// Data of each related object, keyed by attribute name.
///
/// Edges whose target no longer exists are left out.
pub async fn related_data(
    store: &dyn CanonicalStore,
    source: ObjectId,
) -> WorkflowResult<Record> {
    let mut related = Record::new();
    for edge in store.list_relations(source).await? {
        if let Some(target) = store.load_object(edge.target).await? {
            related.insert(edge.attribute.clone(), Value::Object(target.data));
        }
    }
    Ok(related)
}

/// Delete every edge leaving `source`.
pub async fn remove_all(
    store: &dyn CanonicalStore,
    source: ObjectId,
    simulate: bool,
) -> WorkflowResult<usize> {
    let edges = store.list_relations(source).await?;
    for edge in &edges {
        store.delete_relation(edge.id, simulate).await?;
    }
    Ok(edges.len())
}
