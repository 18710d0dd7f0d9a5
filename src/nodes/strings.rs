//! String nodes

use super::execution::{ExecutionContext, NodeOutcome};
use super::node::FieldMap;
use super::registry::{FieldSpec, NodeCategory, NodeDefinition, NodeRegistry, UnitKind};
use super::validation::is_valid_lua_identifier;
use super::value::{format_number, Value};

const ALL_UNITS: &[UnitKind] = &[UnitKind::File, UnitKind::Function, UnitKind::Event];

pub fn register(registry: &mut NodeRegistry) {
    registry.register(NodeDefinition {
        type_id: "concatStrings",
        label: "Concatenate Strings",
        description: "Joins two values with the Lua .. operator.",
        category: NodeCategory::String,
        allowed_units: ALL_UNITS,
        fields: vec![
            FieldSpec::string("string1Type", "literal"),
            FieldSpec::any("string1"),
            FieldSpec::string("string2Type", "literal"),
            FieldSpec::any("string2"),
            FieldSpec::string("resultVariable", "result"),
        ],
        behavior: concat_strings,
    });
    registry.register(NodeDefinition {
        type_id: "toNumber",
        label: "To Number",
        description: "Converts a value to a number, tonumber style.",
        category: NodeCategory::String,
        allowed_units: ALL_UNITS,
        fields: vec![
            FieldSpec::string("inputType", "literal"),
            FieldSpec::any("inputValue"),
            FieldSpec::number("base", 10.0),
            FieldSpec::string("resultVariable", "result"),
        ],
        behavior: to_number,
    });
}

/// Lua `..` coercion: strings pass through, numbers print canonically,
/// everything else cannot be concatenated.
fn concat_piece(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(format_number(*n)),
        _ => None,
    }
}

fn concat_strings(fields: &FieldMap, context: &mut ExecutionContext) -> NodeOutcome {
    let result_name = fields
        .get("resultVariable")
        .and_then(Value::as_str)
        .unwrap_or("");
    if !is_valid_lua_identifier(result_name) {
        return NodeOutcome::error(
            "concatStrings",
            format!("Invalid result variable \"{}\"", result_name),
        );
    }

    let first = context.resolve(fields, "string1Type", "string1");
    let second = context.resolve(fields, "string2Type", "string2");
    let (Some(a), Some(b)) = (concat_piece(&first), concat_piece(&second)) else {
        let offender = if concat_piece(&first).is_none() {
            &first
        } else {
            &second
        };
        return NodeOutcome::error(
            "concatStrings",
            format!(
                "Attempt to concatenate a {} value",
                offender.type_name()
            ),
        );
    };

    let joined = format!("{}{}", a, b);
    context.set_variable(result_name, Value::str(&joined));
    NodeOutcome::success("concatStrings")
        .with("resultVariable", Value::str(result_name))
        .with("result", Value::str(joined))
}

fn to_number(fields: &FieldMap, context: &mut ExecutionContext) -> NodeOutcome {
    let result_name = fields
        .get("resultVariable")
        .and_then(Value::as_str)
        .unwrap_or("");
    if !is_valid_lua_identifier(result_name) {
        return NodeOutcome::error(
            "toNumber",
            format!("Invalid result variable \"{}\"", result_name),
        );
    }

    let base = fields
        .get("base")
        .and_then(Value::as_number)
        .unwrap_or(10.0) as u32;
    if !(2..=36).contains(&base) {
        return NodeOutcome::error("toNumber", format!("Base {} is out of range", base));
    }

    let input = context.resolve(fields, "inputType", "inputValue");
    // tonumber never raises: unconvertible input just yields nil.
    let converted = if base == 10 {
        input.coerce_number().map(Value::Number).unwrap_or(Value::Nil)
    } else {
        match &input {
            Value::String(s) => i64::from_str_radix(s.trim(), base)
                .map(|n| Value::Number(n as f64))
                .unwrap_or(Value::Nil),
            _ => Value::Nil,
        }
    };

    context.set_variable(result_name, converted.clone());
    NodeOutcome::success("toNumber")
        .with("resultVariable", Value::str(result_name))
        .with("result", converted)
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

    #[test]
    fn test_concat_coerces_numbers() {
        let mut context = ExecutionContext::new();
        let outcome = concat_strings(
            &fields(&[
                ("string1", Value::str("round ")),
                ("string2", Value::Number(3.0)),
                ("resultVariable", Value::str("label")),
            ]),
            &mut context,
        );
        assert_eq!(outcome.status, OutcomeStatus::Success);
        assert_eq!(context.variable("label"), Some(&Value::str("round 3")));
    }

    #[test]
    fn test_concat_rejects_booleans() {
        let mut context = ExecutionContext::new();
        let outcome = concat_strings(
            &fields(&[
                ("string1", Value::str("is ")),
                ("string2", Value::Boolean(true)),
                ("resultVariable", Value::str("label")),
            ]),
            &mut context,
        );
        assert!(outcome.is_error());
        assert!(outcome.message.unwrap().contains("boolean"));
    }

    #[test]
    fn test_to_number_parses_and_fails_to_nil() {
        let mut context = ExecutionContext::new();
        to_number(
            &fields(&[
                ("inputValue", Value::str("42")),
                ("resultVariable", Value::str("n")),
            ]),
            &mut context,
        );
        assert_eq!(context.variable("n"), Some(&Value::Number(42.0)));

        to_number(
            &fields(&[
                ("inputValue", Value::str("banana")),
                ("resultVariable", Value::str("n")),
            ]),
            &mut context,
        );
        assert_eq!(context.variable("n"), Some(&Value::Nil));
    }

    #[test]
    fn test_to_number_with_base() {
        let mut context = ExecutionContext::new();
        let outcome = to_number(
            &fields(&[
                ("inputValue", Value::str("ff")),
                ("base", Value::Number(16.0)),
                ("resultVariable", Value::str("n")),
            ]),
            &mut context,
        );
        assert_eq!(outcome.status, OutcomeStatus::Success);
        assert_eq!(context.variable("n"), Some(&Value::Number(255.0)));
    }
}
