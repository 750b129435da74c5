//! Edge legality: whether one prospective connection may be added to a graph.

pub mod cycle;

pub use cycle::{control_cycle_edges, reachable_from, would_create_cycle};

use crate::error::{ConnectError, RegistryError};
use crate::graph::{Graph, GraphEdge, PinRef};
use crate::pins::{find_pin, materialize_definition};
use crate::registry::{DataType, PinDefinition, PinDirection, PinKind, Registry};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use uuid::Uuid;

/// Stable codes for refused connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectCode {
    SourcePinMissing,
    TargetPinMissing,
    SourceNotOut,
    TargetNotIn,
    SelfEdge,
    KindMismatch,
    DataTypeMismatch,
    Duplicate,
    TargetAtMax,
    ControlCycle,
}

impl RejectCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectCode::SourcePinMissing => "SOURCE_PIN_MISSING",
            RejectCode::TargetPinMissing => "TARGET_PIN_MISSING",
            RejectCode::SourceNotOut => "SOURCE_NOT_OUT",
            RejectCode::TargetNotIn => "TARGET_NOT_IN",
            RejectCode::SelfEdge => "SELF_EDGE",
            RejectCode::KindMismatch => "KIND_MISMATCH",
            RejectCode::DataTypeMismatch => "DATA_TYPE_MISMATCH",
            RejectCode::Duplicate => "DUPLICATE",
            RejectCode::TargetAtMax => "TARGET_AT_MAX",
            RejectCode::ControlCycle => "CONTROL_CYCLE",
        }
    }
}

impl fmt::Display for RejectCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether a DATA value typed `source` may feed a pin typed `target`.
///
/// A missing type on either side is treated as a wildcard.
pub fn data_types_compatible(source: Option<&DataType>, target: Option<&DataType>) -> bool {
    match (source, target) {
        (Some(source), Some(target)) => source.flows_into(target),
        _ => true,
    }
}

/// Checks one prospective connection and, if legal, returns the edge to add.
///
/// Checks run in a fixed order and stop at the first failure, so a refusal
/// always carries exactly one code. The graph is not modified.
pub fn validate_connect(
    registry: &Registry,
    graph: &Graph,
    source_node_id: &str,
    source_pin_id: &str,
    target_node_id: &str,
    target_pin_id: &str,
) -> Result<GraphEdge, ConnectError> {
    let result = check_connect(
        registry,
        graph,
        source_node_id,
        source_pin_id,
        target_node_id,
        target_pin_id,
    );
    if let Err(ConnectError::Rejected { code, reason }) = &result {
        debug!(
            graph = %graph.id,
            source = %format!("{}.{}", source_node_id, source_pin_id),
            target = %format!("{}.{}", target_node_id, target_pin_id),
            %code,
            reason = %reason,
            "connection rejected"
        );
    }
    result
}

/// Validates a connection and returns a new snapshot with the edge appended.
pub fn connect(
    registry: &Registry,
    graph: &Graph,
    source: &PinRef,
    target: &PinRef,
) -> Result<Graph, ConnectError> {
    let edge = validate_connect(
        registry,
        graph,
        &source.node_id,
        &source.pin_id,
        &target.node_id,
        &target.pin_id,
    )?;
    let mut next = graph.clone();
    next.edges.push(edge);
    Ok(next)
}

fn check_connect(
    registry: &Registry,
    graph: &Graph,
    source_node_id: &str,
    source_pin_id: &str,
    target_node_id: &str,
    target_pin_id: &str,
) -> Result<GraphEdge, ConnectError> {
    // 1. Resolve both pins against each node's current config
    let source_pin = resolve_pin(registry, graph, source_node_id, source_pin_id)?
        .ok_or_else(|| {
            ConnectError::rejected(
                RejectCode::SourcePinMissing,
                format!("pin '{}' not found on node '{}'", source_pin_id, source_node_id),
            )
        })?;
    let target_pin = resolve_pin(registry, graph, target_node_id, target_pin_id)?
        .ok_or_else(|| {
            ConnectError::rejected(
                RejectCode::TargetPinMissing,
                format!("pin '{}' not found on node '{}'", target_pin_id, target_node_id),
            )
        })?;

    // 2-3. Direction
    if source_pin.direction != PinDirection::Out {
        return Err(ConnectError::rejected(
            RejectCode::SourceNotOut,
            format!("source pin '{}' is not an output", source_pin.id),
        ));
    }
    if target_pin.direction != PinDirection::In {
        return Err(ConnectError::rejected(
            RejectCode::TargetNotIn,
            format!("target pin '{}' is not an input", target_pin.id),
        ));
    }

    // 4. Self edge
    if source_node_id == target_node_id {
        return Err(ConnectError::rejected(
            RejectCode::SelfEdge,
            format!("node '{}' cannot connect to itself", source_node_id),
        ));
    }

    // 5. Kind
    if source_pin.kind != target_pin.kind {
        return Err(ConnectError::rejected(
            RejectCode::KindMismatch,
            format!(
                "cannot connect a {} pin to a {} pin",
                source_pin.kind, target_pin.kind
            ),
        ));
    }
    let kind = source_pin.kind;

    // 6. Data type
    if kind == PinKind::Data
        && !data_types_compatible(source_pin.data_type.as_ref(), target_pin.data_type.as_ref())
    {
        return Err(ConnectError::rejected(
            RejectCode::DataTypeMismatch,
            format!(
                "'{}' does not accept '{}'",
                describe_type(&target_pin),
                describe_type(&source_pin)
            ),
        ));
    }

    // 7. Duplicate
    let is_duplicate = graph.edges.iter().any(|e| {
        e.edge_kind == kind
            && e.from.node_id == source_node_id
            && e.from.pin_id == source_pin_id
            && e.to.node_id == target_node_id
            && e.to.pin_id == target_pin_id
    });
    if is_duplicate {
        return Err(ConnectError::rejected(
            RejectCode::Duplicate,
            "these pins are already connected",
        ));
    }

    // 8. Target capacity
    if let Some(max) = target_pin.effective_max_connections() {
        let inbound = graph
            .edges_into(target_node_id, target_pin_id)
            .filter(|e| e.edge_kind == kind)
            .count();
        if inbound >= max {
            return Err(ConnectError::rejected(
                RejectCode::TargetAtMax,
                format!(
                    "pin '{}' accepts at most {} connection(s)",
                    target_pin.id, max
                ),
            ));
        }
    }

    let mut edge = GraphEdge::new(
        Uuid::new_v4().to_string(),
        kind,
        PinRef::new(source_node_id, source_pin_id),
        PinRef::new(target_node_id, target_pin_id),
    );
    edge.created_at = Some(Utc::now());
    if kind == PinKind::Data {
        edge.data_type = source_pin.data_type.or(target_pin.data_type);
    }

    // 9. Control cycle
    if kind == PinKind::Control && would_create_cycle(&graph.edges, &edge) {
        return Err(ConnectError::rejected(
            RejectCode::ControlCycle,
            format!(
                "connecting '{}' to '{}' would create a control-flow loop",
                source_node_id, target_node_id
            ),
        ));
    }

    Ok(edge)
}

/// Resolves a pin on a graph node. A missing node or unknown node type
/// resolves to `None`, like a missing pin.
pub(crate) fn resolve_pin(
    registry: &Registry,
    graph: &Graph,
    node_id: &str,
    pin_id: &str,
) -> Result<Option<PinDefinition>, RegistryError> {
    let Some(node) = graph.node(node_id) else {
        return Ok(None);
    };
    let Some(definition) = registry.lookup(&node.node_type) else {
        return Ok(None);
    };
    let pins = materialize_definition(definition, &node.config)?;
    Ok(find_pin(&pins, pin_id).cloned())
}

fn describe_type(pin: &PinDefinition) -> String {
    pin.data_type
        .as_ref()
        .map_or_else(|| DataType::ANY.to_string(), |t| t.to_string())
}
