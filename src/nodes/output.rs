//! Output nodes

use super::execution::{ExecutionContext, NodeOutcome};
use super::node::FieldMap;
use super::registry::{FieldSpec, NodeCategory, NodeDefinition, NodeRegistry, UnitKind};
use super::validation::is_valid_lua_identifier;
use super::value::Value;

const ALL_UNITS: &[UnitKind] = &[UnitKind::File, UnitKind::Function, UnitKind::Event];

pub fn register(registry: &mut NodeRegistry) {
    registry.register(NodeDefinition {
        type_id: "printMessage",
        label: "Print Message",
        description: "Prints a message, or the value of a variable.",
        category: NodeCategory::Output,
        allowed_units: ALL_UNITS,
        fields: vec![
            FieldSpec::string("message", "Hello, world!"),
            FieldSpec::boolean("useVariableForMessage", false),
            FieldSpec::string("messageVariable", ""),
        ],
        behavior: print_message,
    });
}

fn print_message(fields: &FieldMap, context: &mut ExecutionContext) -> NodeOutcome {
    let use_variable = fields
        .get("useVariableForMessage")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let line = if use_variable {
        let variable = fields
            .get("messageVariable")
            .and_then(Value::as_str)
            .unwrap_or("");
        if !is_valid_lua_identifier(variable) {
            return NodeOutcome::error(
                "print",
                format!("Invalid message variable \"{}\"", variable),
            );
        }
        context
            .variable(variable)
            .cloned()
            .unwrap_or(Value::Nil)
            .to_string()
    } else {
        fields
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string()
    };

    context.push_output(&line);
    NodeOutcome::success("print").with("message", Value::str(line))
}
