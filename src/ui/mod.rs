//! The canvas editor's document format.
//!
//! Canvas documents keep layout alongside the graph and name edge endpoints
//! `source`/`sourceHandle`/`target`/`targetHandle`. [`UiGraph`] converts into the
//! canonical [`Graph`] through [`IntoGraph`], and [`UiEdge`] can be reconciled
//! directly so the editor never has to round-trip through the canonical form.

mod types;

pub use types::*;

use crate::error::GraphConversionError;
use crate::graph::{Graph, GraphEdge, GraphNode, IntoGraph, PinRef};
use crate::reconcile::EdgeEndpoints;

impl IntoGraph for UiGraph {
    fn into_graph(self) -> Result<Graph, GraphConversionError> {
        let mut graph = Graph::new(self.id);

        for node in self.nodes {
            if node.id.is_empty() {
                return Err(GraphConversionError::ValidationError(format!(
                    "a node of type '{}' has an empty id",
                    node.data.node_type
                )));
            }
            graph.nodes.push(GraphNode {
                id: node.id,
                node_type: node.data.node_type,
                config: node.data.config,
            });
        }

        for edge in self.edges {
            let Some(edge_kind) = edge.edge_kind else {
                return Err(GraphConversionError::ValidationError(format!(
                    "edge '{}' does not say whether it is CONTROL or DATA",
                    edge.id
                )));
            };
            let mut converted = GraphEdge::new(
                edge.id,
                edge_kind,
                PinRef::new(edge.source, edge.source_handle),
                PinRef::new(edge.target, edge.target_handle),
            );
            converted.data_type = edge.data_type;
            graph.edges.push(converted);
        }

        Ok(graph)
    }
}

impl EdgeEndpoints for UiEdge {
    fn source_node(&self) -> &str {
        &self.source
    }

    fn source_pin(&self) -> &str {
        &self.source_handle
    }

    fn target_node(&self) -> &str {
        &self.target
    }

    fn target_pin(&self) -> &str {
        &self.target_handle
    }
}
