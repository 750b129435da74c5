pub mod conversion;

pub use conversion::*;

use crate::registry::{DataType, PinKind};
use ahash::AHashMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Per-node configuration, validated against the node type's config schema.
pub type Config = AHashMap<String, Value>;

/// Edges share the pin kind vocabulary: CONTROL or DATA.
pub type EdgeKind = PinKind;

/// The canonical, editor-agnostic node graph of one ability.
///
/// The core never mutates a graph in place. Every operation takes a snapshot and
/// returns a new value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub id: String,
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    pub node_type: String,
    #[serde(default)]
    pub config: Config,
}

/// One endpoint of an edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinRef {
    pub node_id: String,
    pub pin_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    pub id: String,
    pub edge_kind: EdgeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,
    pub from: PinRef,
    pub to: PinRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Graph {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn with_node(mut self, node: GraphNode) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn with_edge(mut self, edge: GraphEdge) -> Self {
        self.edges.push(edge);
        self
    }

    /// The first node with the given id.
    pub fn node(&self, node_id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == node_id)
    }

    /// Edges leaving the given output pin, in graph order.
    pub fn edges_from<'a>(
        &'a self,
        node_id: &'a str,
        pin_id: &'a str,
    ) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges
            .iter()
            .filter(move |e| e.from.node_id == node_id && e.from.pin_id == pin_id)
    }

    /// Edges arriving at the given input pin, in graph order.
    pub fn edges_into<'a>(
        &'a self,
        node_id: &'a str,
        pin_id: &'a str,
    ) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges
            .iter()
            .filter(move |e| e.to.node_id == node_id && e.to.pin_id == pin_id)
    }
}

impl GraphNode {
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            config: Config::new(),
        }
    }

    pub fn with_config(mut self, key: impl Into<String>, value: Value) -> Self {
        self.config.insert(key.into(), value);
        self
    }
}

impl PinRef {
    pub fn new(node_id: impl Into<String>, pin_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            pin_id: pin_id.into(),
        }
    }
}

impl GraphEdge {
    pub fn new(id: impl Into<String>, edge_kind: EdgeKind, from: PinRef, to: PinRef) -> Self {
        Self {
            id: id.into(),
            edge_kind,
            data_type: None,
            from,
            to,
            created_at: None,
        }
    }

    pub fn control(id: impl Into<String>, from: PinRef, to: PinRef) -> Self {
        Self::new(id, PinKind::Control, from, to)
    }

    pub fn data(id: impl Into<String>, from: PinRef, to: PinRef) -> Self {
        Self::new(id, PinKind::Data, from, to)
    }

    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    /// Whether this edge joins exactly the same two pins as `other`.
    pub fn same_endpoints(&self, other: &GraphEdge) -> bool {
        self.from == other.from && self.to == other.to
    }
}
