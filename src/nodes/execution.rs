//! Graph execution simulator
//!
//! Interprets a graph's node sequence in order against a mutable variable
//! environment, producing a per-node outcome trail for live preview. This
//! is a straight-line interpreter: control-flow nodes record what they
//! would do, they do not make the simulator branch or skip.

use std::collections::{BTreeMap, HashMap};

use log::debug;
use uuid::Uuid;

use super::graph::Graph;
use super::node::FieldMap;
use super::registry::NodeRegistry;
use super::value::Value;

/// Whether a node's simulation step succeeded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Success,
    Error,
}

/// Structured result of simulating one node
#[derive(Debug, Clone, PartialEq)]
pub struct NodeOutcome {
    /// Action tag identifying what the node did (e.g. "setVariable")
    pub action: &'static str,
    pub status: OutcomeStatus,
    /// Human-readable diagnostic, present on error outcomes
    pub message: Option<String>,
    /// Node-specific result data, e.g. the variable name written
    pub payload: BTreeMap<String, Value>,
}

impl NodeOutcome {
    pub fn success(action: &'static str) -> Self {
        Self {
            action,
            status: OutcomeStatus::Success,
            message: None,
            payload: BTreeMap::new(),
        }
    }

    pub fn error(action: &'static str, message: impl Into<String>) -> Self {
        Self {
            action,
            status: OutcomeStatus::Error,
            message: Some(message.into()),
            payload: BTreeMap::new(),
        }
    }

    /// Attach a payload entry
    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.payload.insert(key.to_string(), value);
        self
    }

    pub fn is_error(&self) -> bool {
        self.status == OutcomeStatus::Error
    }
}

/// Mutable environment a graph simulation runs against
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    variables: HashMap<String, Value>,
    output: Vec<String>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context pre-seeded with variables, used to bind function
    /// parameters or event arguments before simulating the unit.
    pub fn with_variables(variables: HashMap<String, Value>) -> Self {
        Self {
            variables,
            output: Vec::new(),
        }
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn variable_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.variables.get_mut(name)
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        debug!("setting variable {} = {}", name, value);
        self.variables.insert(name, value);
    }

    pub fn variables(&self) -> &HashMap<String, Value> {
        &self.variables
    }

    /// Lines produced by output nodes during simulation
    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn push_output(&mut self, line: impl Into<String>) {
        self.output.push(line.into());
    }

    /// Resolves a literal-or-variable operand pair, the convention every
    /// `*Type`/`*Value` field couple follows: `"literal"` takes the
    /// operand as-is, `"variable"` treats it as an environment variable
    /// name. A missing variable reads as nil.
    pub fn resolve(&self, fields: &FieldMap, type_field: &str, value_field: &str) -> Value {
        let selector = fields
            .get(type_field)
            .and_then(Value::as_str)
            .unwrap_or("literal");
        let operand = fields.get(value_field).cloned().unwrap_or(Value::Nil);
        if selector == "variable" {
            match operand {
                Value::String(name) => self.variable(&name).cloned().unwrap_or(Value::Nil),
                _ => Value::Nil,
            }
        } else {
            operand
        }
    }
}

/// Outcome of one node in a simulated sequence
#[derive(Debug, Clone)]
pub struct StepResult {
    pub index: usize,
    pub type_id: String,
    pub runtime_id: Uuid,
    pub outcome: NodeOutcome,
}

/// Simulates a graph's node sequence in order against the given context.
///
/// Every node produces a step result; an error outcome does not halt the
/// remaining sequence. A node whose type is missing from the registry
/// yields an error step for that position.
pub fn simulate_graph(
    graph: &Graph,
    registry: &NodeRegistry,
    context: &mut ExecutionContext,
) -> Vec<StepResult> {
    let mut steps = Vec::with_capacity(graph.nodes.len());

    for (index, node) in graph.nodes.iter().enumerate() {
        let outcome = match registry.lookup(&node.type_id) {
            Some(definition) => (definition.behavior)(node.fields(), context),
            None => NodeOutcome::error(
                "resolve",
                format!("Unknown node type \"{}\"", node.type_id),
            ),
        };
        debug!(
            "step {} ({}): {:?}",
            index, node.type_id, outcome.status
        );
        steps.push(StepResult {
            index,
            type_id: node.type_id.clone(),
            runtime_id: node.runtime_id(),
            outcome,
        });
    }

    steps
}

/// Simulates a graph against a fresh context, returning both the step
/// trail and the final environment.
pub fn simulate(graph: &Graph, registry: &NodeRegistry) -> (Vec<StepResult>, ExecutionContext) {
    let mut context = ExecutionContext::new();
    let steps = simulate_graph(graph, registry, &mut context);
    (steps, context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::node::NodeInstance;
    use crate::nodes::registry::NodeRegistry;

    fn instance(registry: &NodeRegistry, type_id: &str, fields: &[(&str, Value)]) -> NodeInstance {
        let definition = registry.lookup(type_id).expect("builtin type");
        let mut node = NodeInstance::from_definition(definition);
        for (name, value) in fields {
            node.set_field(definition, name, value.clone()).unwrap();
        }
        node
    }

    #[test]
    fn test_resolve_literal_and_variable() {
        let mut context = ExecutionContext::new();
        context.set_variable("speed", Value::Number(30.0));

        let mut fields = FieldMap::new();
        fields.insert("value1Type".to_string(), Value::str("literal"));
        fields.insert("value1".to_string(), Value::Number(5.0));
        assert_eq!(
            context.resolve(&fields, "value1Type", "value1"),
            Value::Number(5.0)
        );

        fields.insert("value1Type".to_string(), Value::str("variable"));
        fields.insert("value1".to_string(), Value::str("speed"));
        assert_eq!(
            context.resolve(&fields, "value1Type", "value1"),
            Value::Number(30.0)
        );

        fields.insert("value1".to_string(), Value::str("missing"));
        assert_eq!(context.resolve(&fields, "value1Type", "value1"), Value::Nil);
    }

    #[test]
    fn test_error_step_does_not_halt_sequence() {
        let registry = NodeRegistry::builtin();
        let mut graph = Graph::empty_file(crate::nodes::graph::Scope::Client);
        // First node targets a reserved word, second is fine.
        graph.nodes.push(instance(
            registry,
            "createTable",
            &[("variableName", Value::str("end"))],
        ));
        graph.nodes.push(instance(
            registry,
            "createTable",
            &[("variableName", Value::str("inventory"))],
        ));

        let (steps, context) = simulate(&graph, registry);
        assert_eq!(steps.len(), 2);
        assert!(steps[0].outcome.is_error());
        assert_eq!(steps[1].outcome.status, OutcomeStatus::Success);
        assert!(context.variable("inventory").is_some());
        assert!(context.variable("end").is_none());
    }

    #[test]
    fn test_unknown_type_yields_error_step() {
        let registry = NodeRegistry::builtin();
        let mut graph = Graph::empty_file(crate::nodes::graph::Scope::Server);
        graph
            .nodes
            .push(NodeInstance::new("vanishedNode", FieldMap::new()));

        let (steps, _) = simulate(&graph, registry);
        assert_eq!(steps.len(), 1);
        assert!(steps[0].outcome.is_error());
        assert!(steps[0]
            .outcome
            .message
            .as_deref()
            .unwrap()
            .contains("vanishedNode"));
    }

    #[test]
    fn test_prebound_parameters_are_visible() {
        let registry = NodeRegistry::builtin();
        let mut graph = Graph::function(
            vec!["target".to_string()],
            crate::nodes::graph::Scope::Shared,
        );
        graph.nodes.push(instance(
            registry,
            "printMessage",
            &[
                ("useVariableForMessage", Value::Boolean(true)),
                ("messageVariable", Value::str("target")),
            ],
        ));

        let mut variables = HashMap::new();
        variables.insert("target".to_string(), Value::str("door"));
        let mut context = ExecutionContext::with_variables(variables);

        let steps = simulate_graph(&graph, registry, &mut context);
        assert_eq!(steps[0].outcome.status, OutcomeStatus::Success);
        assert_eq!(context.output(), ["door"]);
    }

    #[test]
    fn test_order_dependent_simulation() {
        let registry = NodeRegistry::builtin();
        let mut graph = Graph::empty_file(crate::nodes::graph::Scope::Client);
        // x = 2, then x = x + 3 -> 5. Reordered, the math node reads nil.
        graph.nodes.push(instance(
            registry,
            "setVariable",
            &[
                ("variableName", Value::str("x")),
                ("dataType", Value::str("number")),
                ("value", Value::Number(2.0)),
            ],
        ));
        graph.nodes.push(instance(
            registry,
            "mathOperation",
            &[
                ("operation", Value::str("add")),
                ("value1Type", Value::str("variable")),
                ("value1", Value::str("x")),
                ("value2Type", Value::str("literal")),
                ("value2", Value::Number(3.0)),
                ("resultVariable", Value::str("x")),
            ],
        ));

        let (steps, context) = simulate(&graph, registry);
        assert!(steps.iter().all(|s| !s.outcome.is_error()));
        assert_eq!(context.variable("x"), Some(&Value::Number(5.0)));

        graph.nodes.swap(0, 1);
        let (steps, context) = simulate(&graph, registry);
        assert!(steps[0].outcome.is_error());
        assert_eq!(context.variable("x"), Some(&Value::Number(2.0)));
    }
}
