//! Attribute-level merge of freshly mapped values onto canonical data.
//!
//! Used by the import update branch and by cleanup. Keys without an
//! attribute definition are left alone. Attribute names are dotted paths
//! into the canonical data, the same way store filters address it.

use syncline_connector::mapping::EnsureMode;
use syncline_connector::operation::Record;
use syncline_connector::value::{is_empty, union};
use syncline_connector::AttributeMapper;
use syncline_core::path;
use tracing::warn;

/// Merge `mapped` onto a copy of `base` according to each attribute's ensure
/// mode.
///
/// | ensure | rule |
/// |---|---|
/// | EXISTS | keep the base value when present, otherwise take the mapped one |
/// | LAST | take the mapped value, or drop the key when the mapping lacks it |
/// | ABSENT | drop the key |
/// | MERGE | union the mapped elements into the base array |
///
/// A value that cannot be written at its path (a scalar sits where a map is
/// needed) is logged and leaves the base untouched.
pub fn merge(mapper: &AttributeMapper, mapped: &Record, base: &Record) -> Record {
    let mut merged = base.clone();

    for definition in mapper.definitions() {
        let name = definition.name.as_str();
        let incoming = path::get_in(mapped, name).filter(|v| !is_empty(v));

        let write = match definition.ensure {
            EnsureMode::Exists if path::get_in(&merged, name).is_some() => None,
            EnsureMode::Absent => {
                path::remove_in(&mut merged, name);
                None
            }
            EnsureMode::Exists | EnsureMode::Last => match incoming {
                Some(value) => Some(value.clone()),
                None => {
                    path::remove_in(&mut merged, name);
                    None
                }
            },
            EnsureMode::Merge => incoming.map(|value| match path::get_in(&merged, name) {
                Some(current) => union(current, value),
                None => value.clone(),
            }),
        };

        if let Some(value) = write {
            if let Err(e) = path::set_in(&mut merged, name, value) {
                warn!(attribute = name, error = %e, "cannot write merged attribute");
            }
        }
    }

    merged
}
