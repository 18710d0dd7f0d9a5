//! Luaflow core library
//!
//! The graph model, node-type registry, project codec and execution
//! simulator behind a node-based visual scripting editor for Lua. The
//! editing surface, code generator and storage layer sit on top of the
//! types exposed here.

pub mod nodes;
pub mod project;
pub mod store;

// Re-export commonly used types
pub use nodes::{
    ExecutionContext, FieldMap, FileDeclaration, FileKind, Graph, NodeDefinition, NodeInstance,
    NodeOutcome, NodeRegistry, OutcomeStatus, Scope, StepResult, UnitKind, Value,
};
pub use project::{DecodedProject, ProjectDocument};
pub use store::GraphStore;
