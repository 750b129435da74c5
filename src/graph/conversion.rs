use super::Graph;
use crate::error::GraphConversionError;

/// A trait for editor-specific graph formats that can be converted into a canonical `Graph`.
///
/// This is the boundary between an editor's own storage shape and the core. Validation,
/// compilation and connection checks all operate on `Graph`, so any format that
/// implements this trait can use them.
///
/// # Example
///
/// ```rust,no_run
/// use kairo::graph::{Graph, GraphNode, IntoGraph};
/// use kairo::error::GraphConversionError;
///
/// struct SavedAbility { id: String, blocks: Vec<(String, String)> }
///
/// impl IntoGraph for SavedAbility {
///     fn into_graph(self) -> Result<Graph, GraphConversionError> {
///         let mut graph = Graph::new(self.id);
///         for (id, node_type) in self.blocks {
///             if id.is_empty() {
///                 return Err(GraphConversionError::ValidationError("empty node id".into()));
///             }
///             graph = graph.with_node(GraphNode::new(id, node_type));
///         }
///         Ok(graph)
///     }
/// }
/// ```
pub trait IntoGraph {
    /// Consumes the object and converts it into a canonical graph snapshot.
    fn into_graph(self) -> Result<Graph, GraphConversionError>;
}

impl IntoGraph for Graph {
    fn into_graph(self) -> Result<Graph, GraphConversionError> {
        Ok(self)
    }
}
