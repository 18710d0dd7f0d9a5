//! Math nodes

use super::execution::{ExecutionContext, NodeOutcome};
use super::node::FieldMap;
use super::registry::{FieldSpec, NodeCategory, NodeDefinition, NodeRegistry, UnitKind};
use super::validation::is_valid_lua_identifier;
use super::value::Value;

const ALL_UNITS: &[UnitKind] = &[UnitKind::File, UnitKind::Function, UnitKind::Event];

pub fn register(registry: &mut NodeRegistry) {
    registry.register(NodeDefinition {
        type_id: "mathOperation",
        label: "Math Operation",
        description: "Applies an arithmetic operation to two operands.",
        category: NodeCategory::Math,
        allowed_units: ALL_UNITS,
        fields: vec![
            FieldSpec::string("operation", "add"),
            FieldSpec::string("value1Type", "literal"),
            FieldSpec::any("value1").with_default(Value::Number(0.0)),
            FieldSpec::string("value2Type", "literal"),
            FieldSpec::any("value2").with_default(Value::Number(0.0)),
            FieldSpec::string("resultVariable", "result"),
        ],
        behavior: math_operation,
    });
}

fn math_operation(fields: &FieldMap, context: &mut ExecutionContext) -> NodeOutcome {
    let result_name = fields
        .get("resultVariable")
        .and_then(Value::as_str)
        .unwrap_or("");
    if !is_valid_lua_identifier(result_name) {
        return NodeOutcome::error(
            "mathOperation",
            format!("Invalid result variable \"{}\"", result_name),
        );
    }

    let lhs = context.resolve(fields, "value1Type", "value1");
    let rhs = context.resolve(fields, "value2Type", "value2");
    let (a, b) = match (lhs.coerce_number(), rhs.coerce_number()) {
        (Some(a), Some(b)) => (a, b),
        (None, _) => {
            return NodeOutcome::error(
                "mathOperation",
                format!("Attempt to perform arithmetic on a {} value", lhs.type_name()),
            )
        }
        (_, None) => {
            return NodeOutcome::error(
                "mathOperation",
                format!("Attempt to perform arithmetic on a {} value", rhs.type_name()),
            )
        }
    };

    let operation = fields
        .get("operation")
        .and_then(Value::as_str)
        .unwrap_or("add");
    let result = match operation {
        "add" => a + b,
        "subtract" => a - b,
        "multiply" => a * b,
        "divide" => {
            if b == 0.0 {
                return NodeOutcome::error("mathOperation", "Division by zero");
            }
            a / b
        }
        "modulo" => {
            if b == 0.0 {
                return NodeOutcome::error("mathOperation", "Modulo by zero");
            }
            a.rem_euclid(b)
        }
        "power" => a.powf(b),
        other => {
            return NodeOutcome::error(
                "mathOperation",
                format!("Unknown operation \"{}\"", other),
            )
        }
    };

    context.set_variable(result_name, Value::Number(result));
    NodeOutcome::success("mathOperation")
        .with("resultVariable", Value::str(result_name))
        .with("result", Value::Number(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::execution::OutcomeStatus;

    fn fields(entries: &[(&str, Value)]) -> FieldMap {
        entries
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    fn run(context: &mut ExecutionContext, operation: &str, a: Value, b: Value) -> NodeOutcome {
        math_operation(
            &fields(&[
                ("operation", Value::str(operation)),
                ("value1", a),
                ("value2", b),
                ("resultVariable", Value::str("out")),
            ]),
            context,
        )
    }

    #[test]
    fn test_basic_arithmetic() {
        let mut context = ExecutionContext::new();
        run(&mut context, "add", Value::Number(2.0), Value::Number(3.0));
        assert_eq!(context.variable("out"), Some(&Value::Number(5.0)));
        run(&mut context, "multiply", Value::Number(4.0), Value::Number(2.5));
        assert_eq!(context.variable("out"), Some(&Value::Number(10.0)));
        run(&mut context, "power", Value::Number(2.0), Value::Number(10.0));
        assert_eq!(context.variable("out"), Some(&Value::Number(1024.0)));
    }

    #[test]
    fn test_numeric_string_coercion() {
        let mut context = ExecutionContext::new();
        let outcome = run(&mut context, "subtract", Value::str("10"), Value::Number(4.0));
        assert_eq!(outcome.status, OutcomeStatus::Success);
        assert_eq!(context.variable("out"), Some(&Value::Number(6.0)));
    }

    #[test]
    fn test_division_by_zero_is_error() {
        let mut context = ExecutionContext::new();
        let outcome = run(&mut context, "divide", Value::Number(1.0), Value::Number(0.0));
        assert!(outcome.is_error());
        assert!(context.variable("out").is_none());
    }

    #[test]
    fn test_non_numeric_operand_is_error() {
        let mut context = ExecutionContext::new();
        let outcome = run(&mut context, "add", Value::Boolean(true), Value::Number(1.0));
        assert!(outcome.is_error());
        assert!(outcome.message.unwrap().contains("boolean"));
    }

    #[test]
    fn test_variable_operand() {
        let mut context = ExecutionContext::new();
        context.set_variable("base", Value::Number(7.0));
        let outcome = math_operation(
            &fields(&[
                ("operation", Value::str("add")),
                ("value1Type", Value::str("variable")),
                ("value1", Value::str("base")),
                ("value2", Value::Number(1.0)),
                ("resultVariable", Value::str("out")),
            ]),
            &mut context,
        );
        assert_eq!(outcome.status, OutcomeStatus::Success);
        assert_eq!(context.variable("out"), Some(&Value::Number(8.0)));
    }
}
