//! Graphs, graph keys, and file declarations

use std::fmt;

use serde::{Deserialize, Serialize};

use super::node::NodeInstance;

/// Key prefix for callable-function graphs
pub const FUNC_PREFIX: &str = "func:";
/// Key prefix for event-handler graphs
pub const EVENT_PREFIX: &str = "event:";

/// Where a program unit runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Client,
    Server,
    Shared,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Client => write!(f, "client"),
            Scope::Server => write!(f, "server"),
            Scope::Shared => write!(f, "shared"),
        }
    }
}

/// Side a file script (or event handler) belongs to. Unlike functions,
/// these are never shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Client,
    Server,
}

impl FileKind {
    pub fn scope(self) -> Scope {
        match self {
            FileKind::Client => Scope::Client,
            FileKind::Server => Scope::Server,
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::Client => write!(f, "client"),
            FileKind::Server => write!(f, "server"),
        }
    }
}

/// A declared script file: name plus side. A declaration and its graph
/// exist strictly together; the store enforces the pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDeclaration {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
}

impl FileDeclaration {
    pub fn new(name: impl Into<String>, kind: FileKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// The graph key this declaration maps to, e.g. `client/main`
    pub fn graph_key(&self) -> String {
        format!("{}/{}", self.kind, self.name)
    }
}

/// Derive the graph key for a function name
pub fn function_key(name: &str) -> String {
    format!("{}{}", FUNC_PREFIX, name)
}

/// Derive the graph key for an event name
pub fn event_key(name: &str) -> String {
    format!("{}{}", EVENT_PREFIX, name)
}

/// True for keys in neither the function nor the event namespace
pub fn is_file_key(key: &str) -> bool {
    !key.starts_with(FUNC_PREFIX) && !key.starts_with(EVENT_PREFIX)
}

/// One named program unit: an ordered node sequence plus unit metadata.
///
/// Node order is execution order, for the simulator and for downstream
/// code generation alike.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    pub nodes: Vec<NodeInstance>,
    /// Declared parameter names (callable-function units)
    pub parameters: Option<Vec<String>>,
    /// Declared argument names (event-handler units)
    pub argument_names: Option<Vec<String>>,
    pub scope: Option<Scope>,
}

impl Graph {
    /// Empty graph for a plain file unit
    pub fn empty_file(scope: Scope) -> Self {
        Self {
            nodes: Vec::new(),
            parameters: None,
            argument_names: None,
            scope: Some(scope),
        }
    }

    /// Empty graph for a callable-function unit
    pub fn function(parameters: Vec<String>, scope: Scope) -> Self {
        Self {
            nodes: Vec::new(),
            parameters: Some(parameters),
            argument_names: None,
            scope: Some(scope),
        }
    }

    /// Empty graph for an event-handler unit
    pub fn event(argument_names: Vec<String>, scope: Scope) -> Self {
        Self {
            nodes: Vec::new(),
            parameters: None,
            argument_names: Some(argument_names),
            scope: Some(scope),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_keys() {
        let decl = FileDeclaration::new("main", FileKind::Client);
        assert_eq!(decl.graph_key(), "client/main");
        assert_eq!(function_key("spawnCar"), "func:spawnCar");
        assert_eq!(event_key("playerDied"), "event:playerDied");
    }

    #[test]
    fn test_file_key_namespace() {
        assert!(is_file_key("client/main"));
        assert!(is_file_key("server/jobs"));
        assert!(!is_file_key("func:spawnCar"));
        assert!(!is_file_key("event:playerDied"));
    }

    #[test]
    fn test_scope_serialization() {
        assert_eq!(serde_json::to_string(&Scope::Shared).unwrap(), "\"shared\"");
        let kind: FileKind = serde_json::from_str("\"server\"").unwrap();
        assert_eq!(kind, FileKind::Server);
        assert_eq!(kind.scope(), Scope::Server);
    }
}
