use crate::error::RegistryError;
use crate::graph::Graph;
use crate::registry::Registry;
use crate::validate::{ValidationIssue, has_errors, validate};
use ahash::AHashMap;
use std::borrow::Cow;
use tracing::{debug, debug_span, warn};

#[cfg(feature = "debug-tools")]
use std::fs;

mod builder;
pub mod step;
pub mod visualizer;

use builder::StepBuilder;
pub use step::*;
pub use visualizer::DisplaySteps;

/// The result of compiling one graph.
///
/// Steps are produced on a best-effort basis even when `issues` holds errors;
/// callers decide whether to ship them.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileOutput {
    pub steps: Vec<CompiledStep>,
    pub issues: Vec<ValidationIssue>,
}

impl CompileOutput {
    pub fn has_errors(&self) -> bool {
        has_errors(&self.issues)
    }
}

pub struct Compiler<'r> {
    registry: &'r Registry,
    type_aliases: AHashMap<String, String>,
}

pub struct CompilerBuilder<'r> {
    registry: &'r Registry,
    type_aliases: AHashMap<String, String>,
}

impl<'r> CompilerBuilder<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            type_aliases: AHashMap::new(),
        }
    }

    /// Treats nodes of `editor_type` as if they had the registry type `node_type`.
    pub fn with_type_alias(mut self, editor_type: &str, node_type: &str) -> Self {
        self.type_aliases
            .insert(editor_type.to_string(), node_type.to_string());
        self
    }

    pub fn build(self) -> Compiler<'r> {
        Compiler {
            registry: self.registry,
            type_aliases: self.type_aliases,
        }
    }
}

impl<'r> Compiler<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        CompilerBuilder::new(registry).build()
    }

    pub fn builder(registry: &'r Registry) -> CompilerBuilder<'r> {
        CompilerBuilder::new(registry)
    }

    /// Validates the graph, then lowers its control flow into steps.
    ///
    /// Without a start node the step list is empty. With several, the first in
    /// node order is compiled.
    pub fn compile(&self, graph: &Graph) -> Result<CompileOutput, RegistryError> {
        let span = debug_span!("compile", graph = %graph.id);
        let _enter = span.enter();

        let graph = self.resolve_aliases(graph);
        let issues = validate(self.registry, &graph)?;

        let Some(start) = graph
            .nodes
            .iter()
            .find(|n| self.registry.is_start(&n.node_type))
        else {
            warn!("no start node, nothing to compile");
            return Ok(CompileOutput {
                steps: Vec::new(),
                issues,
            });
        };

        let steps = StepBuilder::new(self.registry, &graph).build_from(start);
        debug!(
            start = %start.id,
            steps = steps.len(),
            errors = has_errors(&issues),
            "graph compiled"
        );

        #[cfg(feature = "debug-tools")]
        self.write_debug_file(&graph.id, &steps);

        Ok(CompileOutput { steps, issues })
    }

    fn resolve_aliases<'g>(&self, graph: &'g Graph) -> Cow<'g, Graph> {
        let aliased = |node_type: &str| self.type_aliases.contains_key(node_type);
        if !graph.nodes.iter().any(|n| aliased(&n.node_type)) {
            return Cow::Borrowed(graph);
        }
        let mut graph = graph.clone();
        for node in &mut graph.nodes {
            if let Some(target) = self.type_aliases.get(&node.node_type) {
                node.node_type = target.clone();
            }
        }
        Cow::Owned(graph)
    }

    #[cfg(feature = "debug-tools")]
    fn write_debug_file(&self, graph_id: &str, steps: &[CompiledStep]) {
        let name: String = graph_id
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
            .collect();
        let path = std::path::Path::new("tmp").join(format!("graph_{}_steps.txt", name));
        let result = fs::create_dir_all("tmp")
            .and_then(|_| fs::write(&path, DisplaySteps(steps).to_string()));
        if let Err(e) = result {
            warn!(path = %path.display(), error = %e, "could not write debug file");
        }
    }
}

/// Compiles a graph against a registry with default settings.
pub fn compile(registry: &Registry, graph: &Graph) -> Result<CompileOutput, RegistryError> {
    Compiler::new(registry).compile(graph)
}
