//! Graph store: the live collection of program units
//!
//! Owns every graph and file declaration plus the unsaved-changes flag.
//! All mutation goes through the methods here; everything else in the
//! crate only reads snapshots.

use std::collections::BTreeMap;

use log::{debug, warn};

use crate::nodes::graph::{
    event_key, function_key, is_file_key, FileDeclaration, FileKind, Graph, Scope,
};
use crate::nodes::node::NodeInstance;
use crate::nodes::registry::NodeRegistry;

/// Live project state: named graphs, declared script files, and whether
/// anything changed since the last successful save or load.
#[derive(Debug, Default)]
pub struct GraphStore {
    graphs: BTreeMap<String, Graph>,
    files: Vec<FileDeclaration>,
    dirty: bool,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn mark_dirty(&mut self, operation: &str) {
        debug!("marking store dirty ({})", operation);
        self.dirty = true;
    }

    /// Whether in-memory state diverges from the last save/load
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Record that the current state was successfully persisted
    pub fn mark_saved(&mut self) {
        debug!("clearing dirty flag (saved)");
        self.dirty = false;
    }

    /// Replace all graphs and file declarations in one step and clear the
    /// dirty flag. This is the load path's commit point: a failed decode
    /// never reaches it, so failure leaves the store untouched.
    pub fn install(&mut self, graphs: BTreeMap<String, Graph>, files: Vec<FileDeclaration>) {
        self.graphs = graphs;
        self.files = files;
        debug!("clearing dirty flag (project installed)");
        self.dirty = false;
    }

    /// Declare a script file and create its empty graph together.
    /// Returns false, changing nothing, when a file with the same name
    /// (case-insensitive) and kind exists or the derived key is taken.
    pub fn add_file(&mut self, declaration: FileDeclaration) -> bool {
        let key = declaration.graph_key();
        let name_taken = self.files.iter().any(|existing| {
            existing.kind == declaration.kind
                && existing.name.eq_ignore_ascii_case(&declaration.name)
        });
        if name_taken || self.graphs.contains_key(&key) {
            warn!("file already exists: {}", key);
            return false;
        }

        self.graphs
            .insert(key, Graph::empty_file(declaration.kind.scope()));
        self.files.push(declaration);
        self.mark_dirty("add_file");
        true
    }

    /// Remove a script file's declaration and graph together. Safe to
    /// call when either is already gone.
    pub fn delete_file(&mut self, declaration: &FileDeclaration) {
        let key = declaration.graph_key();
        self.graphs.remove(&key);
        self.files
            .retain(|existing| !(existing.name == declaration.name && existing.kind == declaration.kind));
        self.mark_dirty("delete_file");
    }

    /// Create an empty callable-function graph. Returns false when
    /// `func:<name>` already exists.
    pub fn add_function_graph(
        &mut self,
        name: &str,
        scope: Scope,
        parameters: Vec<String>,
    ) -> bool {
        let key = function_key(name);
        if self.graphs.contains_key(&key) {
            return false;
        }
        self.graphs.insert(key, Graph::function(parameters, scope));
        self.mark_dirty("add_function_graph");
        true
    }

    /// Create an empty event-handler graph. Returns false when
    /// `event:<name>` already exists.
    pub fn add_event_graph(
        &mut self,
        name: &str,
        scope: FileKind,
        argument_names: Vec<String>,
    ) -> bool {
        let key = event_key(name);
        if self.graphs.contains_key(&key) {
            return false;
        }
        self.graphs
            .insert(key, Graph::event(argument_names, scope.scope()));
        self.mark_dirty("add_event_graph");
        true
    }

    /// Remove the graph at a key. For file-namespace keys the matching
    /// declaration goes too, keeping the file/graph pairing intact.
    pub fn delete_graph(&mut self, key: &str) {
        self.graphs.remove(key);
        if is_file_key(key) {
            self.files
                .retain(|declaration| declaration.graph_key() != key);
        }
        self.mark_dirty("delete_graph");
    }

    /// Append a new placement of the template to a graph's sequence. The
    /// template's field values are cloned and the placement gets a fresh
    /// runtime id. A missing graph is a logged no-op.
    pub fn add_node_to_graph(&mut self, key: &str, template: &NodeInstance) {
        let Some(graph) = self.graphs.get_mut(key) else {
            warn!("graph not found for key: {} in add_node_to_graph", key);
            return;
        };
        graph.nodes.push(template.instantiate());
        self.mark_dirty("add_node_to_graph");
    }

    /// Move the node at `from` to position `to`, preserving identity and
    /// field values. No-op when the graph or `from` is absent; `to` past
    /// the end clamps to the tail.
    pub fn reorder_nodes(&mut self, key: &str, from: usize, to: usize) {
        let Some(graph) = self.graphs.get_mut(key) else {
            return;
        };
        if from >= graph.nodes.len() {
            return;
        }
        let node = graph.nodes.remove(from);
        let target = to.min(graph.nodes.len());
        graph.nodes.insert(target, node);
        self.mark_dirty("reorder_nodes");
    }

    /// Replace the node at `index` wholesale. Out of range is a no-op.
    pub fn update_node(&mut self, key: &str, index: usize, node: NodeInstance) {
        let Some(graph) = self.graphs.get_mut(key) else {
            return;
        };
        let Some(slot) = graph.nodes.get_mut(index) else {
            return;
        };
        *slot = node;
        self.mark_dirty("update_node");
    }

    /// Remove the node at `index`, returning its display label so the
    /// editing surface can show a removal notice. Out of range yields
    /// `None` and changes nothing.
    pub fn delete_node_from_graph(
        &mut self,
        key: &str,
        index: usize,
        registry: &NodeRegistry,
    ) -> Option<String> {
        let graph = self.graphs.get_mut(key)?;
        if index >= graph.nodes.len() {
            return None;
        }
        let node = graph.nodes.remove(index);
        let label = registry
            .lookup(&node.type_id)
            .map(|definition| definition.label.to_string())
            .unwrap_or_else(|| node.type_id.clone());
        self.mark_dirty("delete_node_from_graph");
        Some(label)
    }

    /// Replace a function graph's parameter list and scope. No-op when
    /// the graph is absent.
    pub fn update_function_settings(&mut self, key: &str, parameters: Vec<String>, scope: Scope) {
        let Some(graph) = self.graphs.get_mut(key) else {
            return;
        };
        graph.parameters = Some(parameters);
        graph.scope = Some(scope);
        self.mark_dirty("update_function_settings");
    }

    /// Replace an event graph's argument list and scope. No-op when the
    /// graph is absent.
    pub fn update_event_settings(
        &mut self,
        key: &str,
        argument_names: Vec<String>,
        scope: FileKind,
    ) {
        let Some(graph) = self.graphs.get_mut(key) else {
            return;
        };
        graph.argument_names = Some(argument_names);
        graph.scope = Some(scope.scope());
        self.mark_dirty("update_event_settings");
    }

    // --- Queries (no side effects) ---

    pub fn graph(&self, key: &str) -> Option<&Graph> {
        self.graphs.get(key)
    }

    pub fn graphs(&self) -> &BTreeMap<String, Graph> {
        &self.graphs
    }

    pub fn files(&self) -> &[FileDeclaration] {
        &self.files
    }

    /// Names of all declared functions, without the key prefix
    pub fn function_names(&self) -> Vec<String> {
        self.namespace_names(crate::nodes::graph::FUNC_PREFIX)
    }

    /// Names of all declared event handlers, without the key prefix
    pub fn event_names(&self) -> Vec<String> {
        self.namespace_names(crate::nodes::graph::EVENT_PREFIX)
    }

    fn namespace_names(&self, prefix: &str) -> Vec<String> {
        self.graphs
            .keys()
            .filter_map(|key| key.strip_prefix(prefix))
            .map(str::to_string)
            .collect()
    }

    /// Keys in neither the function nor the event namespace
    pub fn file_keys(&self) -> Vec<String> {
        self.graphs
            .keys()
            .filter(|key| is_file_key(key))
            .cloned()
            .collect()
    }
}
