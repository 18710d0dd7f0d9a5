//! Luaflow - project inspector and simulation preview
//!
//! Reads a saved project document, loads it through the codec, and
//! prints a summary plus a per-node simulation trail for one graph or
//! for every graph in the project.

use std::process::ExitCode;

use luaflow::nodes::{simulate, NodeRegistry, OutcomeStatus};
use luaflow::project;
use luaflow::GraphStore;

fn main() -> ExitCode {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("Usage: luaflow <project.json> [graph-key]");
        return ExitCode::FAILURE;
    };
    let selected_key = args.next();

    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Failed to read {}: {}", path, e);
            return ExitCode::FAILURE;
        }
    };

    let registry = NodeRegistry::builtin();
    let mut store = GraphStore::new();
    let warnings = match project::load_into(&mut store, &text, registry) {
        Ok(warnings) => warnings,
        Err(reason) => {
            eprintln!("Failed to load project: {}", reason);
            return ExitCode::FAILURE;
        }
    };
    for warning in &warnings {
        eprintln!("warning: {}", warning);
    }

    println!("Loaded project from {}", path);
    println!("  files: {}", store.files().len());
    for declaration in store.files() {
        println!("    {}", declaration.graph_key());
    }
    println!("  functions: {}", store.function_names().join(", "));
    println!("  events: {}", store.event_names().join(", "));

    let keys: Vec<String> = match selected_key {
        Some(key) => vec![key],
        None => store.graphs().keys().cloned().collect(),
    };

    for key in keys {
        let Some(graph) = store.graph(&key) else {
            eprintln!("No graph with key \"{}\"", key);
            return ExitCode::FAILURE;
        };

        println!();
        println!("Simulating {} ({} nodes)", key, graph.len());
        let (steps, context) = simulate(graph, registry);
        for step in &steps {
            match step.outcome.status {
                OutcomeStatus::Success => {
                    println!("  [{}] {} ok", step.index, step.outcome.action)
                }
                OutcomeStatus::Error => println!(
                    "  [{}] {} error: {}",
                    step.index,
                    step.outcome.action,
                    step.outcome.message.as_deref().unwrap_or("unknown")
                ),
            }
        }
        for line in context.output() {
            println!("  output> {}", line);
        }
    }

    ExitCode::SUCCESS
}
