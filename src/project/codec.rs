//! Serialization codec: store state to project documents and back
//!
//! Encoding never fails as a whole: a field that cannot be persisted is
//! dropped from its record with a warning and everything else continues.
//! Decoding fails only structurally; unknown node types degrade to
//! per-node warnings so one stale element cannot block a load.

use std::collections::BTreeMap;

use log::warn;

use crate::nodes::graph::{FileDeclaration, Graph};
use crate::nodes::node::{FieldMap, NodeInstance};
use crate::nodes::registry::NodeRegistry;
use crate::store::GraphStore;

use super::document::{GraphRecord, NodeRecord, ProjectDocument, ProjectMetadata};

/// Result of decoding a document: ready-to-install state plus any
/// per-node warnings the editing surface should show.
#[derive(Debug)]
pub struct DecodedProject {
    pub graphs: BTreeMap<String, Graph>,
    pub files: Vec<FileDeclaration>,
    pub warnings: Vec<String>,
}

/// Extract the persistable record for one node: its type id plus every
/// schema field with a defined, type-correct value. Each node type's own
/// schema is the allow-list.
fn encode_node(
    node: &NodeInstance,
    registry: &NodeRegistry,
    warnings: &mut Vec<String>,
) -> NodeRecord {
    let mut fields = FieldMap::new();

    match registry.lookup(&node.type_id) {
        Some(definition) => {
            for (name, value) in node.fields() {
                if value.is_nil() {
                    continue;
                }
                match definition.field_spec(name) {
                    Some(spec) if spec.field_type.matches(value) => {
                        fields.insert(name.clone(), value.clone());
                    }
                    Some(_) => {
                        let message = format!(
                            "Could not save field \"{}\" of node \"{}\": {} value does not fit the field",
                            name,
                            node.type_id,
                            value.type_name()
                        );
                        warn!("{}", message);
                        warnings.push(message);
                    }
                    // Live-only field, not part of the persisted shape.
                    None => {}
                }
            }
        }
        None => {
            let message = format!(
                "Node type \"{}\" is not registered; saving its record without fields",
                node.type_id
            );
            warn!("{}", message);
            warnings.push(message);
        }
    }

    NodeRecord {
        type_id: node.type_id.clone(),
        fields,
    }
}

/// Encode the store's full state into a project document. Never fails;
/// problem fields are dropped and reported in the warning list.
pub fn encode(store: &GraphStore, registry: &NodeRegistry) -> (ProjectDocument, Vec<String>) {
    let mut warnings = Vec::new();
    let mut graphs = BTreeMap::new();

    for (key, graph) in store.graphs() {
        let nodes = graph
            .nodes
            .iter()
            .map(|node| encode_node(node, registry, &mut warnings))
            .collect();
        graphs.insert(
            key.clone(),
            GraphRecord {
                nodes,
                parameters: graph.parameters.clone(),
                argument_names: graph.argument_names.clone(),
                scope: graph.scope,
            },
        );
    }

    let document = ProjectDocument {
        metadata: ProjectMetadata::now(),
        files: store.files().to_vec(),
        graphs,
    };
    (document, warnings)
}

/// Encode and render as pretty-printed JSON, the on-disk format
pub fn encode_to_string(
    store: &GraphStore,
    registry: &NodeRegistry,
) -> Result<(String, Vec<String>), String> {
    let (document, warnings) = encode(store, registry);
    let text = serde_json::to_string_pretty(&document)
        .map_err(|e| format!("Failed to serialize project document: {}", e))?;
    Ok((text, warnings))
}

/// Decode a document into live graphs using the registry.
///
/// A structurally invalid document (missing metadata, file list or graph
/// map) is an error and nothing is produced. A node whose type id is no
/// longer registered is dropped with a warning naming it; the rest of
/// its graph still loads, in original order.
pub fn decode(text: &str, registry: &NodeRegistry) -> Result<DecodedProject, String> {
    let document: ProjectDocument = serde_json::from_str(text)
        .map_err(|e| format!("Invalid project document: {}", e))?;

    let mut warnings = Vec::new();
    let mut graphs = BTreeMap::new();

    for (key, record) in document.graphs {
        let mut nodes = Vec::with_capacity(record.nodes.len());
        for node_record in &record.nodes {
            let Some(definition) = registry.lookup(&node_record.type_id) else {
                let label = node_record
                    .fields
                    .get("label")
                    .and_then(crate::nodes::value::Value::as_str)
                    .unwrap_or("N/A");
                let message = format!(
                    "Node type \"{}\" (label: {}) is no longer available. It will be removed from the graph.",
                    node_record.type_id, label
                );
                warn!("could not find node definition for id '{}' during load", node_record.type_id);
                warnings.push(message);
                continue;
            };

            let (node, field_warnings) = NodeInstance::rehydrate(definition, &node_record.fields);
            warnings.extend(field_warnings);
            nodes.push(node);
        }

        graphs.insert(
            key,
            Graph {
                nodes,
                parameters: record.parameters,
                argument_names: record.argument_names,
                scope: record.scope,
            },
        );
    }

    Ok(DecodedProject {
        graphs,
        files: document.files,
        warnings,
    })
}

/// Decode a document and, on success, replace the store's state with it,
/// clearing the dirty flag. On failure the store is left untouched and
/// the descriptive reason is returned.
pub fn load_into(
    store: &mut GraphStore,
    text: &str,
    registry: &NodeRegistry,
) -> Result<Vec<String>, String> {
    let decoded = decode(text, registry)?;
    store.install(decoded.graphs, decoded.files);
    Ok(decoded.warnings)
}
