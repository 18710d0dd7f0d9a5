//! Control-flow nodes
//!
//! In simulation these run straight-line: each node evaluates its
//! condition or bounds and records what generated code would branch on,
//! without making the simulator itself jump.

use super::execution::{ExecutionContext, NodeOutcome};
use super::node::FieldMap;
use super::registry::{FieldSpec, NodeCategory, NodeDefinition, NodeRegistry, UnitKind};
use super::validation::is_valid_lua_identifier;
use super::value::Value;

const ALL_UNITS: &[UnitKind] = &[UnitKind::File, UnitKind::Function, UnitKind::Event];

pub fn register(registry: &mut NodeRegistry) {
    registry.register(NodeDefinition {
        type_id: "condition",
        label: "Condition",
        description: "Compares two values and records the boolean result.",
        category: NodeCategory::Control,
        allowed_units: ALL_UNITS,
        fields: vec![
            FieldSpec::string("conditionLhsType", "literal"),
            FieldSpec::any("conditionLhsValue"),
            FieldSpec::string("conditionOperator", "=="),
            FieldSpec::string("conditionRhsType", "literal"),
            FieldSpec::any("conditionRhsValue"),
            FieldSpec::string("resultVariable", ""),
        ],
        behavior: condition,
    });
    registry.register(NodeDefinition {
        type_id: "numericFor",
        label: "Numeric For Loop",
        description: "Declares a numeric loop over start, end and step.",
        category: NodeCategory::Control,
        allowed_units: ALL_UNITS,
        fields: vec![
            FieldSpec::string("controlVariable", "i"),
            FieldSpec::string("startValueType", "literal"),
            FieldSpec::any("startValue").with_default(Value::Number(1.0)),
            FieldSpec::string("endValueType", "literal"),
            FieldSpec::any("endValue").with_default(Value::Number(10.0)),
            FieldSpec::string("stepValueType", "literal"),
            FieldSpec::any("stepValue").with_default(Value::Number(1.0)),
        ],
        behavior: numeric_for,
    });
    registry.register(NodeDefinition {
        type_id: "forEachInTable",
        label: "For Each In Table",
        description: "Declares an iteration over a table with pairs or ipairs.",
        category: NodeCategory::Control,
        allowed_units: ALL_UNITS,
        fields: vec![
            FieldSpec::string("tableVariable", ""),
            FieldSpec::string("iterationType", "pairs"),
            FieldSpec::string("keyVariable", "key"),
            FieldSpec::string("valueVariable", "value"),
        ],
        behavior: for_each_in_table,
    });
    registry.register(NodeDefinition {
        type_id: "wait",
        label: "Wait",
        description: "Pauses the script for a duration in milliseconds.",
        category: NodeCategory::Control,
        allowed_units: ALL_UNITS,
        fields: vec![
            FieldSpec::string("durationType", "literal"),
            FieldSpec::any("duration").with_default(Value::Number(1000.0)),
        ],
        behavior: wait,
    });
    registry.register(NodeDefinition {
        type_id: "callFunction",
        label: "Call Function",
        description: "Calls a declared function with resolved arguments.",
        category: NodeCategory::Control,
        allowed_units: ALL_UNITS,
        fields: vec![
            FieldSpec::string("functionName", ""),
            FieldSpec::array("argumentSources"),
            FieldSpec::string("resultVariable", ""),
        ],
        behavior: call_function,
    });
    registry.register(NodeDefinition {
        type_id: "returnValue",
        label: "Return",
        description: "Returns a value from the enclosing function or handler.",
        category: NodeCategory::Control,
        allowed_units: &[UnitKind::Function, UnitKind::Event],
        fields: vec![
            FieldSpec::string("returnType", "literal"),
            FieldSpec::any("returnValue"),
        ],
        behavior: return_value,
    });
    registry.register(NodeDefinition {
        type_id: "triggerEvent",
        label: "Trigger Event",
        description: "Fires a named event with resolved arguments.",
        category: NodeCategory::Control,
        allowed_units: &[UnitKind::File, UnitKind::Event],
        fields: vec![
            FieldSpec::string("eventName", ""),
            FieldSpec::array("argumentSources"),
        ],
        behavior: trigger_event,
    });
}

/// Lua comparison: equality works across types, ordering only within
/// numbers or within strings.
fn compare(operator: &str, lhs: &Value, rhs: &Value) -> Result<bool, String> {
    match operator {
        "==" => Ok(lhs == rhs),
        "~=" => Ok(lhs != rhs),
        "<" | "<=" | ">" | ">=" => {
            let ordering = if let (Some(a), Some(b)) = (lhs.as_number(), rhs.as_number()) {
                a.partial_cmp(&b)
            } else if let (Some(a), Some(b)) = (lhs.as_str(), rhs.as_str()) {
                Some(a.cmp(b))
            } else {
                return Err(format!(
                    "Attempt to compare {} with {}",
                    lhs.type_name(),
                    rhs.type_name()
                ));
            };
            let ordering = match ordering {
                Some(ordering) => ordering,
                None => return Err("Comparison is undefined for NaN".to_string()),
            };
            Ok(match operator {
                "<" => ordering.is_lt(),
                "<=" => ordering.is_le(),
                ">" => ordering.is_gt(),
                _ => ordering.is_ge(),
            })
        }
        other => Err(format!("Unknown operator \"{}\"", other)),
    }
}

fn condition(fields: &FieldMap, context: &mut ExecutionContext) -> NodeOutcome {
    let lhs = context.resolve(fields, "conditionLhsType", "conditionLhsValue");
    let rhs = context.resolve(fields, "conditionRhsType", "conditionRhsValue");
    let operator = fields
        .get("conditionOperator")
        .and_then(Value::as_str)
        .unwrap_or("==");

    let result = match compare(operator, &lhs, &rhs) {
        Ok(result) => result,
        Err(message) => return NodeOutcome::error("condition", message),
    };

    let result_name = fields
        .get("resultVariable")
        .and_then(Value::as_str)
        .unwrap_or("");
    if !result_name.is_empty() {
        if !is_valid_lua_identifier(result_name) {
            return NodeOutcome::error(
                "condition",
                format!("Invalid result variable \"{}\"", result_name),
            );
        }
        context.set_variable(result_name, Value::Boolean(result));
    }

    NodeOutcome::success("condition").with("result", Value::Boolean(result))
}

fn numeric_for(fields: &FieldMap, context: &mut ExecutionContext) -> NodeOutcome {
    let control = fields
        .get("controlVariable")
        .and_then(Value::as_str)
        .unwrap_or("");
    if !is_valid_lua_identifier(control) {
        return NodeOutcome::error(
            "numericFor",
            format!("Invalid control variable \"{}\"", control),
        );
    }

    let bounds = [
        ("startValueType", "startValue"),
        ("endValueType", "endValue"),
        ("stepValueType", "stepValue"),
    ]
    .map(|(type_field, value_field)| {
        context
            .resolve(fields, type_field, value_field)
            .coerce_number()
    });
    let [Some(start), Some(end), Some(step)] = bounds else {
        return NodeOutcome::error("numericFor", "Loop bounds must be numbers");
    };
    if step == 0.0 {
        return NodeOutcome::error("numericFor", "Loop step cannot be zero");
    }

    context.set_variable(control, Value::Number(start));
    NodeOutcome::success("numericFor")
        .with("controlVariable", Value::str(control))
        .with("start", Value::Number(start))
        .with("end", Value::Number(end))
        .with("step", Value::Number(step))
}

fn for_each_in_table(fields: &FieldMap, context: &mut ExecutionContext) -> NodeOutcome {
    let key_name = fields
        .get("keyVariable")
        .and_then(Value::as_str)
        .unwrap_or("");
    let value_name = fields
        .get("valueVariable")
        .and_then(Value::as_str)
        .unwrap_or("");
    for name in [key_name, value_name] {
        if !is_valid_lua_identifier(name) {
            return NodeOutcome::error(
                "forEachInTable",
                format!("Invalid iteration variable \"{}\"", name),
            );
        }
    }

    let table_name = fields
        .get("tableVariable")
        .and_then(Value::as_str)
        .unwrap_or("");
    let entries = match context.variable(table_name) {
        Some(Value::Table(entries)) => entries.clone(),
        Some(other) => {
            return NodeOutcome::error(
                "forEachInTable",
                format!(
                    "Variable \"{}\" is a {}, not a table",
                    table_name,
                    other.type_name()
                ),
            )
        }
        None => {
            return NodeOutcome::error(
                "forEachInTable",
                format!("Variable \"{}\" is not defined", table_name),
            )
        }
    };

    let iteration = fields
        .get("iterationType")
        .and_then(Value::as_str)
        .unwrap_or("pairs");
    // Preview binds the iteration variables to the first entry the loop
    // would visit; an empty table binds them to nil.
    let (key, value) = match iteration {
        "ipairs" => match entries.get("1") {
            Some(value) => (Value::Number(1.0), value.clone()),
            None => (Value::Nil, Value::Nil),
        },
        _ => match entries.iter().next() {
            Some((key, value)) => (Value::str(key.clone()), value.clone()),
            None => (Value::Nil, Value::Nil),
        },
    };

    context.set_variable(key_name, key);
    context.set_variable(value_name, value);
    NodeOutcome::success("forEachInTable")
        .with("tableVariable", Value::str(table_name))
        .with("iterationType", Value::str(iteration))
        .with("entryCount", Value::Number(entries.len() as f64))
}

fn wait(fields: &FieldMap, context: &mut ExecutionContext) -> NodeOutcome {
    let duration = context.resolve(fields, "durationType", "duration");
    let millis = match duration.coerce_number() {
        Some(millis) => millis,
        None => {
            return NodeOutcome::error(
                "wait",
                format!("Duration must be a number, got {}", duration.type_name()),
            )
        }
    };
    if millis < 0.0 {
        return NodeOutcome::error("wait", "Duration cannot be negative");
    }
    NodeOutcome::success("wait").with("duration", Value::Number(millis))
}

/// Resolve an argumentSources array: each entry is a `{type, value}`
/// record following the literal-or-variable convention.
fn resolve_argument_sources(fields: &FieldMap, context: &ExecutionContext) -> Vec<Value> {
    fields
        .get("argumentSources")
        .and_then(Value::as_array)
        .map(|sources| {
            sources
                .iter()
                .map(|source| match source.as_table() {
                    Some(entry) => {
                        let selector =
                            entry.get("type").and_then(Value::as_str).unwrap_or("literal");
                        let operand = entry.get("value").cloned().unwrap_or(Value::Nil);
                        if selector == "variable" {
                            match operand {
                                Value::String(name) => {
                                    context.variable(&name).cloned().unwrap_or(Value::Nil)
                                }
                                _ => Value::Nil,
                            }
                        } else {
                            operand
                        }
                    }
                    None => source.clone(),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn call_function(fields: &FieldMap, context: &mut ExecutionContext) -> NodeOutcome {
    let function_name = fields
        .get("functionName")
        .and_then(Value::as_str)
        .unwrap_or("");
    if !is_valid_lua_identifier(function_name) {
        return NodeOutcome::error(
            "callFunction",
            format!("Invalid function name \"{}\"", function_name),
        );
    }

    let arguments = resolve_argument_sources(fields, context);

    let result_name = fields
        .get("resultVariable")
        .and_then(Value::as_str)
        .unwrap_or("");
    if !result_name.is_empty() {
        if !is_valid_lua_identifier(result_name) {
            return NodeOutcome::error(
                "callFunction",
                format!("Invalid result variable \"{}\"", result_name),
            );
        }
        // The callee only runs in generated code; its result previews as nil.
        context.set_variable(result_name, Value::Nil);
    }

    NodeOutcome::success("callFunction")
        .with("functionName", Value::str(function_name))
        .with("arguments", Value::Array(arguments))
}

fn return_value(fields: &FieldMap, context: &mut ExecutionContext) -> NodeOutcome {
    let value = context.resolve(fields, "returnType", "returnValue");
    NodeOutcome::success("return").with("value", value)
}

fn trigger_event(fields: &FieldMap, context: &mut ExecutionContext) -> NodeOutcome {
    let event_name = fields
        .get("eventName")
        .and_then(Value::as_str)
        .unwrap_or("");
    if event_name.is_empty() {
        return NodeOutcome::error("triggerEvent", "Event name is required");
    }

    let arguments = resolve_argument_sources(fields, context);
    NodeOutcome::success("triggerEvent")
        .with("eventName", Value::str(event_name))
        .with("arguments", Value::Array(arguments))
}
