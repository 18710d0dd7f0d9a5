//! Node instances: one placement of a node type inside a graph

use std::collections::BTreeMap;

use uuid::Uuid;

use super::registry::NodeDefinition;
use super::value::Value;

/// A node instance's mutable data fields, keyed by field name
pub type FieldMap = BTreeMap<String, Value>;

/// One placed occurrence of a node type within a graph.
///
/// Only the type id and data fields ever persist. Behavior, label,
/// category and placement rules live in the registry and are resolved by
/// type id at the point of use, so a software update changes the behavior
/// of nodes in previously saved projects. The runtime id exists purely to
/// identify the instance within this process and is regenerated on every
/// creation and rehydration.
#[derive(Debug, Clone)]
pub struct NodeInstance {
    pub type_id: String,
    runtime_id: Uuid,
    fields: FieldMap,
}

impl NodeInstance {
    /// Create an instance with the given fields, unchecked. Callers that
    /// have a definition at hand should prefer `from_definition` plus
    /// `set_field` so the schema is enforced.
    pub fn new(type_id: impl Into<String>, fields: FieldMap) -> Self {
        Self {
            type_id: type_id.into(),
            runtime_id: Uuid::new_v4(),
            fields,
        }
    }

    /// Create an instance of a registered type with its schema defaults
    pub fn from_definition(definition: &NodeDefinition) -> Self {
        Self {
            type_id: definition.type_id.to_string(),
            runtime_id: Uuid::new_v4(),
            fields: definition.default_fields(),
        }
    }

    /// Rehydrate an instance from persisted fields: schema defaults
    /// overlaid with the persisted values (persisted wins), a fresh
    /// runtime id regardless of anything in the record. Unknown field
    /// names and type-mismatched values are dropped; each drop is
    /// reported in the returned warnings.
    pub fn rehydrate(definition: &NodeDefinition, persisted: &FieldMap) -> (Self, Vec<String>) {
        let mut node = Self::from_definition(definition);
        let mut warnings = Vec::new();

        for (name, value) in persisted {
            // Presentation fields written by older producers; these are
            // registry-owned and never stored on instances.
            if name == "label" || name == "description" {
                continue;
            }
            match definition.field_spec(name) {
                Some(spec) if spec.field_type.matches(value) => {
                    node.fields.insert(name.clone(), value.clone());
                }
                Some(_) => warnings.push(format!(
                    "Field \"{}\" on node \"{}\" has the wrong type ({}); using the default",
                    name,
                    definition.type_id,
                    value.type_name()
                )),
                None => warnings.push(format!(
                    "Field \"{}\" is not part of node \"{}\"; dropped",
                    name, definition.type_id
                )),
            }
        }

        (node, warnings)
    }

    /// Clone this instance as a new placement: same type and field
    /// values, fresh runtime id. Used when a palette template is dropped
    /// into a graph.
    pub fn instantiate(&self) -> Self {
        Self {
            type_id: self.type_id.clone(),
            runtime_id: Uuid::new_v4(),
            fields: self.fields.clone(),
        }
    }

    pub fn runtime_id(&self) -> Uuid {
        self.runtime_id
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Set a field, enforcing the definition's schema
    pub fn set_field(
        &mut self,
        definition: &NodeDefinition,
        name: &str,
        value: Value,
    ) -> Result<(), String> {
        match definition.field_spec(name) {
            Some(spec) if spec.field_type.matches(&value) => {
                self.fields.insert(name.to_string(), value);
                Ok(())
            }
            Some(_) => Err(format!(
                "value of type {} does not fit field \"{}\" on \"{}\"",
                value.type_name(),
                name,
                definition.type_id
            )),
            None => Err(format!(
                "node \"{}\" has no field \"{}\"",
                definition.type_id, name
            )),
        }
    }

    pub fn text_field(&self, name: &str) -> &str {
        self.fields.get(name).and_then(Value::as_str).unwrap_or("")
    }

    pub fn bool_field(&self, name: &str) -> bool {
        self.fields
            .get(name)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn number_field(&self, name: &str) -> Option<f64> {
        self.fields.get(name).and_then(Value::as_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::registry::NodeRegistry;

    #[test]
    fn test_from_definition_applies_defaults() {
        let registry = NodeRegistry::builtin();
        let definition = registry.lookup("createTable").unwrap();
        let node = NodeInstance::from_definition(definition);
        assert_eq!(node.type_id, "createTable");
        assert_eq!(node.text_field("variableName"), "newTable");
    }

    #[test]
    fn test_set_field_enforces_schema() {
        let registry = NodeRegistry::builtin();
        let definition = registry.lookup("createTable").unwrap();
        let mut node = NodeInstance::from_definition(definition);

        node.set_field(definition, "variableName", Value::str("loot"))
            .unwrap();
        assert_eq!(node.text_field("variableName"), "loot");

        assert!(node
            .set_field(definition, "variableName", Value::Number(9.0))
            .is_err());
        assert!(node
            .set_field(definition, "notAField", Value::str("x"))
            .is_err());
    }

    #[test]
    fn test_rehydrate_overlays_persisted_fields() {
        let registry = NodeRegistry::builtin();
        let definition = registry.lookup("createTable").unwrap();

        let mut persisted = FieldMap::new();
        persisted.insert("variableName".to_string(), Value::str("stash"));
        persisted.insert("mystery".to_string(), Value::Number(1.0));

        let (node, warnings) = NodeInstance::rehydrate(definition, &persisted);
        assert_eq!(node.text_field("variableName"), "stash");
        assert!(node.field("mystery").is_none());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("mystery"));
    }

    #[test]
    fn test_instantiate_gets_fresh_runtime_id() {
        let registry = NodeRegistry::builtin();
        let definition = registry.lookup("createTable").unwrap();
        let template = NodeInstance::from_definition(definition);
        let placed = template.instantiate();
        assert_eq!(placed.type_id, template.type_id);
        assert_eq!(placed.fields(), template.fields());
        assert_ne!(placed.runtime_id(), template.runtime_id());
    }
}
