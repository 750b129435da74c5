//! Keeping edges consistent with a node's pin set.
//!
//! When a config change shrinks a node's dynamic pins, edges still pointing at
//! the vanished pins must go. The same pruning applies to canonical edges and to
//! the canvas' visual edges, so it is written once over [`EdgeEndpoints`].

use crate::error::RegistryError;
use crate::graph::{Config, Graph, GraphEdge};
use crate::pins::materialize_definition;
use crate::registry::{PinDefinition, Registry};
use ahash::AHashSet;
use tracing::debug;

/// Read access to the two endpoints of an edge.
pub trait EdgeEndpoints {
    fn source_node(&self) -> &str;
    fn source_pin(&self) -> &str;
    fn target_node(&self) -> &str;
    fn target_pin(&self) -> &str;
}

impl EdgeEndpoints for GraphEdge {
    fn source_node(&self) -> &str {
        &self.from.node_id
    }

    fn source_pin(&self) -> &str {
        &self.from.pin_id
    }

    fn target_node(&self) -> &str {
        &self.to.node_id
    }

    fn target_pin(&self) -> &str {
        &self.to.pin_id
    }
}

/// Drops edges that touch `node_id` through a pin present in `old_pins` but not in `new_pins`.
///
/// Every other edge is kept unchanged and in its original order.
pub fn reconcile<E: EdgeEndpoints + Clone>(
    node_id: &str,
    old_pins: &[PinDefinition],
    new_pins: &[PinDefinition],
    edges: &[E],
) -> Vec<E> {
    let kept: AHashSet<&str> = new_pins.iter().map(|p| p.id.as_str()).collect();
    let removed: AHashSet<&str> = old_pins
        .iter()
        .map(|p| p.id.as_str())
        .filter(|id| !kept.contains(id))
        .collect();

    if removed.is_empty() {
        return edges.to_vec();
    }

    let touches_removed = |node: &str, pin: &str| node == node_id && removed.contains(pin);
    let filtered: Vec<E> = edges
        .iter()
        .filter(|e| {
            !touches_removed(e.source_node(), e.source_pin())
                && !touches_removed(e.target_node(), e.target_pin())
        })
        .cloned()
        .collect();

    debug!(
        node = node_id,
        removed_pins = removed.len(),
        dropped_edges = edges.len() - filtered.len(),
        "edges reconciled"
    );
    filtered
}

/// Replaces one node's config and prunes edges left dangling by the change.
///
/// Returns the graph unchanged when the node does not exist or its type is not
/// registered; validation reports those cases.
pub fn apply_config_change(
    registry: &Registry,
    graph: &Graph,
    node_id: &str,
    new_config: Config,
) -> Result<Graph, RegistryError> {
    let Some(index) = graph.nodes.iter().position(|n| n.id == node_id) else {
        return Ok(graph.clone());
    };
    let node = &graph.nodes[index];
    let Some(definition) = registry.lookup(&node.node_type) else {
        return Ok(graph.clone());
    };

    let old_pins = materialize_definition(definition, &node.config)?;
    let new_pins = materialize_definition(definition, &new_config)?;

    let mut next = graph.clone();
    next.edges = reconcile(node_id, &old_pins, &new_pins, &graph.edges);
    next.nodes[index].config = new_config;
    Ok(next)
}
