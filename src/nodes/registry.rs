//! Node type registry with per-type field schemas
//!
//! Definitions are the single source of truth for node behavior: type id,
//! placement rules, field schema with defaults, and the simulation
//! function. Instances and persisted records carry data fields only and
//! resolve everything else through the registry at the point of use.

use std::collections::BTreeMap;

use log::debug;
use once_cell::sync::Lazy;

use super::execution::{ExecutionContext, NodeOutcome};
use super::node::FieldMap;
use super::value::Value;

/// Semantic type of a node data field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Boolean,
    Number,
    String,
    Array,
    Table,
    /// Matches any value; used for fields whose type follows a selector
    Any,
}

impl FieldType {
    /// Check whether a value fits this field type. Nil always fits: it
    /// means "unset" and is never persisted anyway.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Nil) => true,
            (FieldType::Any, _) => true,
            (FieldType::Boolean, Value::Boolean(_)) => true,
            (FieldType::Number, Value::Number(_)) => true,
            (FieldType::String, Value::String(_)) => true,
            (FieldType::Array, Value::Array(_)) => true,
            (FieldType::Table, Value::Table(_)) => true,
            _ => false,
        }
    }
}

/// One field in a node type's schema: name, semantic type, default value
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub field_type: FieldType,
    pub default: Value,
}

impl FieldSpec {
    pub fn string(name: &'static str, default: &str) -> Self {
        Self {
            name,
            field_type: FieldType::String,
            default: Value::str(default),
        }
    }

    pub fn boolean(name: &'static str, default: bool) -> Self {
        Self {
            name,
            field_type: FieldType::Boolean,
            default: Value::Boolean(default),
        }
    }

    pub fn number(name: &'static str, default: f64) -> Self {
        Self {
            name,
            field_type: FieldType::Number,
            default: Value::Number(default),
        }
    }

    pub fn array(name: &'static str) -> Self {
        Self {
            name,
            field_type: FieldType::Array,
            default: Value::Array(Vec::new()),
        }
    }

    pub fn any(name: &'static str) -> Self {
        Self {
            name,
            field_type: FieldType::Any,
            default: Value::Nil,
        }
    }

    /// Override the default value
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = default;
        self
    }
}

/// Kind of program unit a graph represents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    /// Plain file script
    File,
    /// Callable function
    Function,
    /// Event handler
    Event,
}

/// Coarse grouping used by the editing surface to organize the palette
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeCategory {
    Data,
    Math,
    String,
    Output,
    Control,
}

/// Simulation behavior: reads the node's field values, may mutate the
/// environment, reports a structured outcome.
pub type NodeBehavior = fn(&FieldMap, &mut ExecutionContext) -> NodeOutcome;

/// Immutable registry entry describing one node type
#[derive(Debug, Clone)]
pub struct NodeDefinition {
    /// Unique type id, the only node identity that persists
    pub type_id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub category: NodeCategory,
    /// Unit kinds this node may be placed in
    pub allowed_units: &'static [UnitKind],
    /// Field schema; doubles as the per-type persistence allow-list
    pub fields: Vec<FieldSpec>,
    pub behavior: NodeBehavior,
}

impl NodeDefinition {
    pub fn field_spec(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|spec| spec.name == name)
    }

    pub fn allows(&self, kind: UnitKind) -> bool {
        self.allowed_units.contains(&kind)
    }

    /// Fresh field map populated with this type's defaults
    pub fn default_fields(&self) -> FieldMap {
        self.fields
            .iter()
            .map(|spec| (spec.name.to_string(), spec.default.clone()))
            .collect()
    }
}

/// Catalog of node definitions, keyed by type id
pub struct NodeRegistry {
    definitions: BTreeMap<String, NodeDefinition>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            definitions: BTreeMap::new(),
        }
    }

    /// Register a node definition. Replaces any previous definition with
    /// the same type id.
    pub fn register(&mut self, definition: NodeDefinition) {
        debug!("registering node type {}", definition.type_id);
        self.definitions
            .insert(definition.type_id.to_string(), definition);
    }

    /// Look up a definition by type id. Absence is a soft condition: the
    /// type is simply no longer known to this build.
    pub fn lookup(&self, type_id: &str) -> Option<&NodeDefinition> {
        self.definitions.get(type_id)
    }

    /// All definitions in type-id order
    pub fn definitions(&self) -> impl Iterator<Item = &NodeDefinition> {
        self.definitions.values()
    }

    /// Type ids legal in the given unit kind, in type-id order
    pub fn types_for_unit(&self, kind: UnitKind) -> Vec<&str> {
        self.definitions
            .values()
            .filter(|def| def.allows(kind))
            .map(|def| def.type_id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// The process-wide registry of built-in node types. Built once at
    /// first use and never mutated afterwards.
    pub fn builtin() -> &'static NodeRegistry {
        static BUILTIN: Lazy<NodeRegistry> = Lazy::new(NodeRegistry::with_builtins);
        &BUILTIN
    }

    fn with_builtins() -> Self {
        let mut registry = Self::new();
        super::data::register(&mut registry);
        super::math::register(&mut registry);
        super::strings::register(&mut registry);
        super::output::register(&mut registry);
        super::control::register(&mut registry);
        registry
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup_is_stable() {
        let registry = NodeRegistry::builtin();
        let first = registry.lookup("setVariable").expect("builtin type");
        let second = registry.lookup("setVariable").expect("builtin type");
        assert!(std::ptr::eq(first, second));
        assert!(registry.lookup("noSuchNode").is_none());
    }

    #[test]
    fn test_field_type_matching() {
        assert!(FieldType::String.matches(&Value::str("x")));
        assert!(FieldType::String.matches(&Value::Nil));
        assert!(!FieldType::String.matches(&Value::Number(1.0)));
        assert!(FieldType::Any.matches(&Value::Boolean(true)));
        assert!(FieldType::Table.matches(&Value::empty_table()));
    }

    #[test]
    fn test_unit_kind_filtering() {
        let registry = NodeRegistry::builtin();
        let file_types = registry.types_for_unit(UnitKind::File);
        let function_types = registry.types_for_unit(UnitKind::Function);

        // returnValue only makes sense inside callable units.
        assert!(!file_types.contains(&"returnValue"));
        assert!(function_types.contains(&"returnValue"));
        // triggerEvent is not legal inside functions.
        assert!(!function_types.contains(&"triggerEvent"));
        assert!(file_types.contains(&"triggerEvent"));
    }

    #[test]
    fn test_default_fields_from_schema() {
        let registry = NodeRegistry::builtin();
        let definition = registry.lookup("createTable").unwrap();
        let fields = definition.default_fields();
        assert_eq!(
            fields.get("variableName"),
            Some(&Value::str("newTable"))
        );
    }
}
