use crate::graph::{Config, EdgeKind};
use crate::registry::DataType;
use serde::Deserialize;

/// Canvas position of a node. Layout only; ignored by the core.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq)]
pub struct UiPosition {
    pub x: f64,
    pub y: f64,
}

/// Node payload as stored by the canvas editor
#[derive(Debug, Deserialize, Clone)]
pub struct UiNodeData {
    #[serde(alias = "nodeType")]
    pub node_type: String,
    #[serde(default)]
    pub config: Config,
}

/// Canvas node with ID, position and data
#[derive(Debug, Deserialize, Clone)]
pub struct UiNode {
    pub id: String,
    #[serde(default)]
    pub position: UiPosition,
    pub data: UiNodeData,
}

/// Visual edge connecting two node handles
#[derive(Debug, Deserialize, Clone)]
pub struct UiEdge {
    pub id: String,
    pub source: String,
    #[serde(alias = "sourceHandle")]
    pub source_handle: String,
    pub target: String,
    #[serde(alias = "targetHandle")]
    pub target_handle: String,
    #[serde(default, alias = "edgeKind")]
    pub edge_kind: Option<EdgeKind>,
    #[serde(default, alias = "dataType")]
    pub data_type: Option<DataType>,
}

/// Complete canvas document for one ability
#[derive(Debug, Deserialize, Clone)]
pub struct UiGraph {
    pub id: String,
    #[serde(default)]
    pub nodes: Vec<UiNode>,
    #[serde(default)]
    pub edges: Vec<UiEdge>,
}
