//! Workflow definitions.
//!
//! A workflow document binds one collection, one endpoint and an ordered set
//! of attribute specs under an object-level ensure mode:
//!
//! ```yaml
//! name: ldap-users
//! collection: users
//! endpoint: ldap
//! ensure: LAST
//! condition: 'status != "disabled"'
//! identifiers: [login]
//! attributes:
//!   login: { from: uid }
//!   mail: { from: mail, required: false }
//!   groups: { from: memberOf, type: array, ensure: MERGE, required: false }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use syncline_connector::mapping::EnsureMode;
use syncline_connector::AttributeMapper;

use super::error::{WorkflowError, WorkflowResult};

/// Raw workflow document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkflowSpec {
    pub name: String,
    /// Canonical collection the workflow reconciles.
    pub collection: String,
    /// Endpoint name used as the sync status key.
    pub endpoint: String,
    #[serde(default)]
    pub ensure: EnsureMode,
    /// Guard expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// Attributes locating the canonical counterpart of an imported record.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifiers: Vec<String>,
    /// Attribute specs keyed by declaration name, in order.
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

/// A validated workflow.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub name: String,
    pub collection: String,
    pub endpoint: String,
    pub ensure: EnsureMode,
    pub condition: Option<String>,
    pub identifiers: Vec<String>,
    pub mapper: AttributeMapper,
}

impl WorkflowConfig {
    /// Validate a raw spec.
    pub fn from_spec(spec: WorkflowSpec) -> WorkflowResult<Self> {
        if spec.name.trim().is_empty() {
            return Err(WorkflowError::configuration("<unnamed>", "name is empty"));
        }
        for (field, value) in [("collection", &spec.collection), ("endpoint", &spec.endpoint)] {
            if value.trim().is_empty() {
                return Err(WorkflowError::configuration(
                    &spec.name,
                    format!("{field} is empty"),
                ));
            }
        }
        if spec.ensure == EnsureMode::Merge {
            return Err(WorkflowError::configuration(
                &spec.name,
                "MERGE is only valid on array attributes",
            ));
        }

        let mapper = AttributeMapper::from_spec_map(&spec.attributes)?;

        for identifier in &spec.identifiers {
            match mapper.definition(identifier) {
                Some(definition) if definition.ensure != EnsureMode::Absent => {}
                Some(_) => {
                    return Err(WorkflowError::configuration(
                        &spec.name,
                        format!("identifier '{identifier}' is declared ABSENT and never resolves"),
                    ))
                }
                None => {
                    return Err(WorkflowError::configuration(
                        &spec.name,
                        format!("identifier '{identifier}' is not a declared attribute"),
                    ))
                }
            }
        }

        Ok(Self {
            name: spec.name,
            collection: spec.collection,
            endpoint: spec.endpoint,
            ensure: spec.ensure,
            condition: spec.condition.filter(|c| !c.trim().is_empty()),
            identifiers: spec.identifiers,
            mapper,
        })
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml_str(source: &str) -> WorkflowResult<Self> {
        let spec: WorkflowSpec = serde_yaml::from_str(source)
            .map_err(|e| WorkflowError::configuration("<document>", e.to_string()))?;
        Self::from_spec(spec)
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(source: &str) -> WorkflowResult<Self> {
        let spec: WorkflowSpec = serde_json::from_str(source)
            .map_err(|e| WorkflowError::configuration("<document>", e.to_string()))?;
        Self::from_spec(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syncline_connector::error::MappingError;

    const USERS: &str = r#"
name: ldap-users
collection: users
endpoint: ldap
condition: 'status != "disabled"'
identifiers: [login]
attributes:
  login: { from: uid }
  mail: { from: mail, required: false }
  groups: { from: memberOf, type: array, ensure: MERGE, required: false }
"#;

    #[test]
    fn test_yaml_document() {
        let config = WorkflowConfig::from_yaml_str(USERS).unwrap();
        assert_eq!(config.name, "ldap-users");
        assert_eq!(config.ensure, EnsureMode::Last);
        assert_eq!(config.identifiers, vec!["login".to_string()]);
        assert_eq!(config.mapper.output_names(), vec!["login", "mail", "groups"]);
        assert!(config.condition.is_some());
    }

    #[test]
    fn test_json_document() {
        let config = WorkflowConfig::from_json_str(
            r#"{"name": "w", "collection": "c", "endpoint": "e", "ensure": "ABSENT"}"#,
        )
        .unwrap();
        assert_eq!(config.ensure, EnsureMode::Absent);
        assert!(config.mapper.definitions().is_empty());
    }

    #[test]
    fn test_merge_rejected_at_workflow_level() {
        let err = WorkflowConfig::from_json_str(
            r#"{"name": "w", "collection": "c", "endpoint": "e", "ensure": "MERGE"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, WorkflowError::Configuration { .. }));
    }

    #[test]
    fn test_unknown_identifier_rejected() {
        let err = WorkflowConfig::from_json_str(
            r#"{"name": "w", "collection": "c", "endpoint": "e",
                "identifiers": ["uid"], "attributes": {"login": {"from": "uid"}}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("'uid' is not a declared attribute"));
    }

    #[test]
    fn test_absent_identifier_rejected() {
        let err = WorkflowConfig::from_json_str(
            r#"{"name": "w", "collection": "c", "endpoint": "e",
                "identifiers": ["login"], "attributes": {"login": {"ensure": "ABSENT"}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, WorkflowError::Configuration { .. }));
    }

    #[test]
    fn test_attribute_errors_surface_at_load() {
        let err = WorkflowConfig::from_json_str(
            r#"{"name": "w", "collection": "c", "endpoint": "e",
                "attributes": {"groups": {"ensure": "MERGE"}}}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Mapping(MappingError::Configuration { .. })
        ));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(WorkflowConfig::from_yaml_str("name: w\ncollection: c\nendpoint: e\nensur: LAST\n")
            .is_err());
    }
}
