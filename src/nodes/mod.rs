//! Node system - core data structures and the built-in node library

// Core node system modules
pub mod execution;
pub mod graph;
pub mod node;
pub mod registry;
pub mod validation;
pub mod value;

// Built-in node implementations
pub mod control;
pub mod data;
pub mod math;
pub mod output;
pub mod strings;

// Re-export core types
pub use graph::{
    event_key, function_key, is_file_key, FileDeclaration, FileKind, Graph, Scope, EVENT_PREFIX,
    FUNC_PREFIX,
};
pub use node::{FieldMap, NodeInstance};

// Re-export registry types
pub use registry::{
    FieldSpec, FieldType, NodeCategory, NodeDefinition, NodeRegistry, UnitKind,
};

// Re-export execution types
pub use execution::{
    simulate, simulate_graph, ExecutionContext, NodeOutcome, OutcomeStatus, StepResult,
};

pub use validation::is_valid_lua_identifier;
pub use value::Value;
