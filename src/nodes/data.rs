//! Data nodes: variables and tables

use super::execution::{ExecutionContext, NodeOutcome};
use super::node::FieldMap;
use super::registry::{FieldSpec, NodeCategory, NodeDefinition, NodeRegistry, UnitKind};
use super::validation::is_valid_lua_identifier;
use super::value::Value;

const ALL_UNITS: &[UnitKind] = &[UnitKind::File, UnitKind::Function, UnitKind::Event];

pub fn register(registry: &mut NodeRegistry) {
    registry.register(NodeDefinition {
        type_id: "setVariable",
        label: "Set Variable",
        description: "Declares or assigns a variable.",
        category: NodeCategory::Data,
        allowed_units: ALL_UNITS,
        fields: vec![
            FieldSpec::string("variableName", "myVar"),
            FieldSpec::string("varType", "local"),
            FieldSpec::string("dataType", "string"),
            FieldSpec::any("value"),
        ],
        behavior: set_variable,
    });
    registry.register(NodeDefinition {
        type_id: "createTable",
        label: "Create Table",
        description: "Initializes an empty Lua table (like {}).",
        category: NodeCategory::Data,
        allowed_units: ALL_UNITS,
        fields: vec![
            FieldSpec::string("variableName", "newTable"),
            FieldSpec::string("varType", "local"),
        ],
        behavior: create_table,
    });
    registry.register(NodeDefinition {
        type_id: "setTableValue",
        label: "Set Table Value",
        description: "Writes a key/value pair into a table.",
        category: NodeCategory::Data,
        allowed_units: ALL_UNITS,
        fields: vec![
            FieldSpec::string("tableVariable", ""),
            FieldSpec::string("keyType", "literal"),
            FieldSpec::any("keyValue"),
            FieldSpec::string("valueType", "literal"),
            FieldSpec::any("valueSource"),
        ],
        behavior: set_table_value,
    });
    registry.register(NodeDefinition {
        type_id: "getTableValue",
        label: "Get Table Value",
        description: "Reads a value out of a table into a variable.",
        category: NodeCategory::Data,
        allowed_units: ALL_UNITS,
        fields: vec![
            FieldSpec::string("tableVariable", ""),
            FieldSpec::string("keyType", "literal"),
            FieldSpec::any("keyValue"),
            FieldSpec::string("resultVariable", "value"),
        ],
        behavior: get_table_value,
    });
    registry.register(NodeDefinition {
        type_id: "insertIntoTable",
        label: "Insert Into Table",
        description: "Appends a value at the end of a table, table.insert style.",
        category: NodeCategory::Data,
        allowed_units: ALL_UNITS,
        fields: vec![
            FieldSpec::string("tableVariable", ""),
            FieldSpec::string("valueType", "literal"),
            FieldSpec::any("valueSource"),
        ],
        behavior: insert_into_table,
    });
}

fn set_variable(fields: &FieldMap, context: &mut ExecutionContext) -> NodeOutcome {
    let name = fields
        .get("variableName")
        .and_then(Value::as_str)
        .unwrap_or("");
    if !is_valid_lua_identifier(name) {
        return NodeOutcome::error("setVariable", format!("Invalid variable name \"{}\"", name));
    }

    let data_type = fields
        .get("dataType")
        .and_then(Value::as_str)
        .unwrap_or("string");
    let raw = fields.get("value").cloned().unwrap_or(Value::Nil);

    let value = match data_type {
        "number" => match raw.coerce_number() {
            Some(n) => Value::Number(n),
            None => {
                return NodeOutcome::error(
                    "setVariable",
                    format!("Cannot convert \"{}\" to a number", raw),
                )
            }
        },
        "boolean" => match &raw {
            Value::Boolean(b) => Value::Boolean(*b),
            Value::String(s) => Value::Boolean(s == "true"),
            other => Value::Boolean(other.truthy()),
        },
        "nil" => Value::Nil,
        _ => Value::str(raw.to_string()),
    };

    context.set_variable(name, value.clone());
    NodeOutcome::success("setVariable")
        .with("variableName", Value::str(name))
        .with("value", value)
}

fn create_table(fields: &FieldMap, context: &mut ExecutionContext) -> NodeOutcome {
    let name = fields
        .get("variableName")
        .and_then(Value::as_str)
        .unwrap_or("");
    if !is_valid_lua_identifier(name) {
        return NodeOutcome::error("createTable", format!("Invalid variable name \"{}\"", name));
    }

    context.set_variable(name, Value::empty_table());
    NodeOutcome::success("createTable").with("variableName", Value::str(name))
}

fn set_table_value(fields: &FieldMap, context: &mut ExecutionContext) -> NodeOutcome {
    let table_name = fields
        .get("tableVariable")
        .and_then(Value::as_str)
        .unwrap_or("");
    if !is_valid_lua_identifier(table_name) {
        return NodeOutcome::error(
            "setTableValue",
            format!("Invalid table variable \"{}\"", table_name),
        );
    }

    let key = match context.resolve(fields, "keyType", "keyValue").table_key() {
        Some(key) => key,
        None => return NodeOutcome::error("setTableValue", "Table key must be a string or number"),
    };
    let value = context.resolve(fields, "valueType", "valueSource");

    match context.variable_mut(table_name) {
        Some(Value::Table(entries)) => {
            entries.insert(key.clone(), value.clone());
            NodeOutcome::success("setTableValue")
                .with("tableVariable", Value::str(table_name))
                .with("key", Value::str(key))
                .with("value", value)
        }
        Some(other) => NodeOutcome::error(
            "setTableValue",
            format!(
                "Variable \"{}\" is a {}, not a table",
                table_name,
                other.type_name()
            ),
        ),
        None => NodeOutcome::error(
            "setTableValue",
            format!("Variable \"{}\" is not defined", table_name),
        ),
    }
}

fn get_table_value(fields: &FieldMap, context: &mut ExecutionContext) -> NodeOutcome {
    let result_name = fields
        .get("resultVariable")
        .and_then(Value::as_str)
        .unwrap_or("");
    if !is_valid_lua_identifier(result_name) {
        return NodeOutcome::error(
            "getTableValue",
            format!("Invalid result variable \"{}\"", result_name),
        );
    }
    let table_name = fields
        .get("tableVariable")
        .and_then(Value::as_str)
        .unwrap_or("");

    let key = match context.resolve(fields, "keyType", "keyValue").table_key() {
        Some(key) => key,
        None => return NodeOutcome::error("getTableValue", "Table key must be a string or number"),
    };

    let value = match context.variable(table_name) {
        Some(Value::Table(entries)) => entries.get(&key).cloned().unwrap_or(Value::Nil),
        Some(other) => {
            return NodeOutcome::error(
                "getTableValue",
                format!(
                    "Variable \"{}\" is a {}, not a table",
                    table_name,
                    other.type_name()
                ),
            )
        }
        None => {
            return NodeOutcome::error(
                "getTableValue",
                format!("Variable \"{}\" is not defined", table_name),
            )
        }
    };

    context.set_variable(result_name, value.clone());
    NodeOutcome::success("getTableValue")
        .with("resultVariable", Value::str(result_name))
        .with("value", value)
}

fn insert_into_table(fields: &FieldMap, context: &mut ExecutionContext) -> NodeOutcome {
    let table_name = fields
        .get("tableVariable")
        .and_then(Value::as_str)
        .unwrap_or("");
    if !is_valid_lua_identifier(table_name) {
        return NodeOutcome::error(
            "insertIntoTable",
            format!("Invalid table variable \"{}\"", table_name),
        );
    }
    let value = context.resolve(fields, "valueType", "valueSource");

    match context.variable_mut(table_name) {
        Some(Value::Table(entries)) => {
            // Next free 1-based integer slot, the way table.insert appends.
            let mut index = 1usize;
            while entries.contains_key(&index.to_string()) {
                index += 1;
            }
            entries.insert(index.to_string(), value.clone());
            NodeOutcome::success("insertIntoTable")
                .with("tableVariable", Value::str(table_name))
                .with("index", Value::Number(index as f64))
                .with("value", value)
        }
        Some(other) => NodeOutcome::error(
            "insertIntoTable",
            format!(
                "Variable \"{}\" is a {}, not a table",
                table_name,
                other.type_name()
            ),
        ),
        None => NodeOutcome::error(
            "insertIntoTable",
            format!("Variable \"{}\" is not defined", table_name),
        ),
    }
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
    fn test_set_variable_number_conversion() {
        let mut context = ExecutionContext::new();
        let outcome = set_variable(
            &fields(&[
                ("variableName", Value::str("hp")),
                ("dataType", Value::str("number")),
                ("value", Value::str("100")),
            ]),
            &mut context,
        );
        assert_eq!(outcome.status, OutcomeStatus::Success);
        assert_eq!(context.variable("hp"), Some(&Value::Number(100.0)));
    }

    #[test]
    fn test_set_variable_rejects_bad_identifier() {
        let mut context = ExecutionContext::new();
        let outcome = set_variable(
            &fields(&[("variableName", Value::str("2cool")), ("value", Value::str("x"))]),
            &mut context,
        );
        assert!(outcome.is_error());
        assert!(context.variables().is_empty());
    }

    #[test]
    fn test_set_variable_unconvertible_number() {
        let mut context = ExecutionContext::new();
        let outcome = set_variable(
            &fields(&[
                ("variableName", Value::str("n")),
                ("dataType", Value::str("number")),
                ("value", Value::str("not a number")),
            ]),
            &mut context,
        );
        assert!(outcome.is_error());
        assert!(context.variable("n").is_none());
    }

    #[test]
    fn test_create_and_fill_table() {
        let mut context = ExecutionContext::new();
        let outcome = create_table(&fields(&[("variableName", Value::str("loot"))]), &mut context);
        assert_eq!(outcome.status, OutcomeStatus::Success);

        let outcome = set_table_value(
            &fields(&[
                ("tableVariable", Value::str("loot")),
                ("keyType", Value::str("literal")),
                ("keyValue", Value::str("gold")),
                ("valueType", Value::str("literal")),
                ("valueSource", Value::Number(250.0)),
            ]),
            &mut context,
        );
        assert_eq!(outcome.status, OutcomeStatus::Success);

        let table = context.variable("loot").unwrap().as_table().unwrap();
        assert_eq!(table.get("gold"), Some(&Value::Number(250.0)));
    }

    #[test]
    fn test_set_table_value_on_missing_table() {
        let mut context = ExecutionContext::new();
        let outcome = set_table_value(
            &fields(&[
                ("tableVariable", Value::str("ghost")),
                ("keyValue", Value::str("k")),
                ("valueSource", Value::Number(1.0)),
            ]),
            &mut context,
        );
        assert!(outcome.is_error());
    }

    #[test]
    fn test_get_table_value_missing_key_reads_nil() {
        let mut context = ExecutionContext::new();
        context.set_variable("config", Value::empty_table());
        let outcome = get_table_value(
            &fields(&[
                ("tableVariable", Value::str("config")),
                ("keyValue", Value::str("missing")),
                ("resultVariable", Value::str("out")),
            ]),
            &mut context,
        );
        assert_eq!(outcome.status, OutcomeStatus::Success);
        assert_eq!(context.variable("out"), Some(&Value::Nil));
    }

    #[test]
    fn test_insert_appends_sequentially() {
        let mut context = ExecutionContext::new();
        context.set_variable("queue", Value::empty_table());
        for value in ["first", "second"] {
            let outcome = insert_into_table(
                &fields(&[
                    ("tableVariable", Value::str("queue")),
                    ("valueSource", Value::str(value)),
                ]),
                &mut context,
            );
            assert_eq!(outcome.status, OutcomeStatus::Success);
        }
        let table = context.variable("queue").unwrap().as_table().unwrap();
        assert_eq!(table.get("1"), Some(&Value::str("first")));
        assert_eq!(table.get("2"), Some(&Value::str("second")));
    }

    #[test]
    fn test_variable_key_resolution() {
        let mut context = ExecutionContext::new();
        context.set_variable("slot", Value::str("weapon"));
        context.set_variable("gear", Value::empty_table());
        let outcome = set_table_value(
            &fields(&[
                ("tableVariable", Value::str("gear")),
                ("keyType", Value::str("variable")),
                ("keyValue", Value::str("slot")),
                ("valueType", Value::str("literal")),
                ("valueSource", Value::str("pistol")),
            ]),
            &mut context,
        );
        assert_eq!(outcome.status, OutcomeStatus::Success);
        let table = context.variable("gear").unwrap().as_table().unwrap();
        assert_eq!(table.get("weapon"), Some(&Value::str("pistol")));
    }
}
