//! Project document: the versioned persisted snapshot
//!
//! Member names match the on-disk JSON format exactly; older documents
//! produced by previous releases decode without renames.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::nodes::graph::{FileDeclaration, Scope};
use crate::nodes::node::FieldMap;

/// Name recorded as the document producer
pub const PRODUCER_NAME: &str = "Luaflow";

/// Producer metadata stamped into every saved document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    #[serde(rename = "savedAt")]
    pub saved_at: String,
    #[serde(rename = "appName")]
    pub app_name: String,
    #[serde(rename = "appVersion")]
    pub app_version: String,
}

impl ProjectMetadata {
    /// Metadata for a document saved right now by this build
    pub fn now() -> Self {
        Self {
            saved_at: chrono::Utc::now().to_rfc3339(),
            app_name: PRODUCER_NAME.to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// One persisted node: the type id plus whatever schema fields had
/// defined values at save time. Runtime identity, labels and behavior
/// are never written; they come back from the registry on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    #[serde(rename = "id")]
    pub type_id: String,
    #[serde(flatten)]
    pub fields: FieldMap,
}

/// One persisted graph: ordered node records plus unit metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphRecord {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<String>>,
    #[serde(
        rename = "argumentNames",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub argument_names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
}

/// The full persisted snapshot. All three members are required; a
/// document missing any of them fails decoding as structurally invalid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDocument {
    #[serde(rename = "projectMetadata")]
    pub metadata: ProjectMetadata,
    pub files: Vec<FileDeclaration>,
    pub graphs: BTreeMap<String, GraphRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::value::Value;

    #[test]
    fn test_node_record_flattens_fields() {
        let mut fields = FieldMap::new();
        fields.insert("variableName".to_string(), Value::str("x"));
        let record = NodeRecord {
            type_id: "createTable".to_string(),
            fields,
        };

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"id":"createTable","variableName":"x"}"#);

        let back: NodeRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_graph_record_omits_absent_metadata() {
        let record = GraphRecord {
            nodes: vec![],
            parameters: None,
            argument_names: None,
            scope: Some(Scope::Client),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"nodes":[],"scope":"client"}"#);
    }

    #[test]
    fn test_document_requires_all_members() {
        let missing_graphs = r#"{
            "projectMetadata": {"savedAt": "t", "appName": "a", "appVersion": "1"},
            "files": []
        }"#;
        assert!(serde_json::from_str::<ProjectDocument>(missing_graphs).is_err());
    }
}
