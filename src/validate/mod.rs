//! Whole-graph structural validation.
//!
//! Validation never fails on a malformed graph: every user-correctable defect is
//! reported as a [`ValidationIssue`]. Only registry defects are returned as errors.

mod config;
mod issue;

pub use issue::*;

use crate::connect::{control_cycle_edges, data_types_compatible, reachable_from};
use crate::error::RegistryError;
use crate::graph::{Graph, GraphNode};
use crate::pins::{find_pin, materialize_definition};
use crate::registry::{PinDefinition, PinDirection, PinKind, Registry};
use ahash::{AHashMap, AHashSet};
use itertools::Itertools;
use tracing::debug;

/// Validates a graph snapshot.
///
/// Issues are ordered node checks first, then edge checks, then whole-graph
/// checks. A clean graph yields a single INFO `OK` entry.
pub fn validate(registry: &Registry, graph: &Graph) -> Result<Vec<ValidationIssue>, RegistryError> {
    let mut issues = Vec::new();

    // 1. Id uniqueness
    for node_id in graph.nodes.iter().map(|n| n.id.as_str()).duplicates() {
        issues.push(
            ValidationIssue::error(
                IssueCode::DuplicateNodeId,
                format!("node id '{}' is used more than once", node_id),
            )
            .at(IssuePath::node(node_id)),
        );
    }
    for edge_id in graph.edges.iter().map(|e| e.id.as_str()).duplicates() {
        issues.push(
            ValidationIssue::error(
                IssueCode::DuplicateEdgeId,
                format!("edge id '{}' is used more than once", edge_id),
            )
            .at(IssuePath::edge(edge_id)),
        );
    }

    // 2. Node types, config, required pins
    let mut pin_table: AHashMap<&str, Vec<PinDefinition>> = AHashMap::new();
    for node in &graph.nodes {
        let Some(definition) = registry.lookup(&node.node_type) else {
            issues.push(
                ValidationIssue::error(
                    IssueCode::UnknownNode,
                    format!("node '{}' has unknown type '{}'", node.id, node.node_type),
                )
                .at(IssuePath::node(&node.id)),
            );
            continue;
        };
        issues.extend(config::check_config(definition, node));

        let pins = materialize_definition(definition, &node.config)?;
        for pin in pins.iter().filter(|p| p.required && p.default_value.is_none()) {
            if !pin_is_connected(graph, node, pin) {
                issues.push(
                    ValidationIssue::error(
                        IssueCode::RequiredPin,
                        format!(
                            "required pin '{}' of node '{}' is not connected",
                            pin.label, node.id
                        ),
                    )
                    .at(IssuePath::pin(&node.id, &pin.id)),
                );
            }
        }
        pin_table.entry(node.id.as_str()).or_insert(pins);
    }

    // 3. Edges
    let node_ids: AHashSet<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
    for edge in &graph.edges {
        if !node_ids.contains(edge.from.node_id.as_str())
            || !node_ids.contains(edge.to.node_id.as_str())
        {
            issues.push(
                ValidationIssue::error(
                    IssueCode::EdgeNodeMissing,
                    format!(
                        "edge '{}' connects '{}' to '{}', but one of them does not exist",
                        edge.id, edge.from.node_id, edge.to.node_id
                    ),
                )
                .at(IssuePath::edge(&edge.id)),
            );
            continue;
        }
        // Nodes of unknown type were already reported above.
        let (Some(from_pins), Some(to_pins)) = (
            pin_table.get(edge.from.node_id.as_str()),
            pin_table.get(edge.to.node_id.as_str()),
        ) else {
            continue;
        };
        let (Some(from_pin), Some(to_pin)) = (
            find_pin(from_pins, &edge.from.pin_id),
            find_pin(to_pins, &edge.to.pin_id),
        ) else {
            issues.push(
                ValidationIssue::error(
                    IssueCode::EdgePinMissing,
                    format!(
                        "edge '{}' references pin '{}.{}' or '{}.{}', which does not exist",
                        edge.id,
                        edge.from.node_id,
                        edge.from.pin_id,
                        edge.to.node_id,
                        edge.to.pin_id
                    ),
                )
                .at(IssuePath::edge(&edge.id)),
            );
            continue;
        };

        if from_pin.direction != PinDirection::Out || to_pin.direction != PinDirection::In {
            issues.push(
                ValidationIssue::error(
                    IssueCode::EdgeDirection,
                    format!("edge '{}' must run from an output to an input", edge.id),
                )
                .at(IssuePath::edge(&edge.id)),
            );
        }
        if from_pin.kind != to_pin.kind {
            issues.push(
                ValidationIssue::error(
                    IssueCode::PinKindMismatch,
                    format!(
                        "edge '{}' joins a {} pin to a {} pin",
                        edge.id, from_pin.kind, to_pin.kind
                    ),
                )
                .at(IssuePath::edge(&edge.id)),
            );
        } else if edge.edge_kind != from_pin.kind {
            issues.push(
                ValidationIssue::error(
                    IssueCode::EdgeKindIncorrect,
                    format!(
                        "edge '{}' is recorded as {} but joins {} pins",
                        edge.id, edge.edge_kind, from_pin.kind
                    ),
                )
                .at(IssuePath::edge(&edge.id)),
            );
        } else if from_pin.kind == PinKind::Data
            && !data_types_compatible(from_pin.data_type.as_ref(), to_pin.data_type.as_ref())
        {
            issues.push(
                ValidationIssue::error(
                    IssueCode::DataTypeMismatch,
                    format!(
                        "edge '{}' feeds a value of an incompatible type into '{}.{}'",
                        edge.id, edge.to.node_id, edge.to.pin_id
                    ),
                )
                .at(IssuePath::edge(&edge.id)),
            );
        }
    }

    // 4. Input capacity
    let mut inbound_counts: AHashMap<(&str, &str, PinKind), usize> = AHashMap::new();
    for edge in &graph.edges {
        *inbound_counts
            .entry((edge.to.node_id.as_str(), edge.to.pin_id.as_str(), edge.edge_kind))
            .or_insert(0) += 1;
    }
    let mut seen: AHashSet<&str> = AHashSet::new();
    for node in &graph.nodes {
        if !seen.insert(node.id.as_str()) {
            continue;
        }
        let Some(pins) = pin_table.get(node.id.as_str()) else {
            continue;
        };
        for pin in pins.iter().filter(|p| p.direction == PinDirection::In) {
            let Some(max) = pin.effective_max_connections() else {
                continue;
            };
            let inbound = inbound_counts
                .get(&(node.id.as_str(), pin.id.as_str(), pin.kind))
                .copied()
                .unwrap_or(0);
            if inbound > max {
                issues.push(
                    ValidationIssue::error(
                        IssueCode::TargetOverCapacity,
                        format!(
                            "pin '{}' of node '{}' has {} connections but accepts at most {}",
                            pin.label, node.id, inbound, max
                        ),
                    )
                    .at(IssuePath::pin(&node.id, &pin.id)),
                );
            }
        }
    }

    // 5. Start node
    let starts: Vec<&GraphNode> = graph
        .nodes
        .iter()
        .filter(|n| registry.is_start(&n.node_type))
        .collect();
    match starts.split_first() {
        None => issues.push(ValidationIssue::error(
            IssueCode::MissingStart,
            format!(
                "the graph has no '{}' node",
                registry.start_node_type()
            ),
        )),
        Some((start, extra)) => {
            for node in extra {
                issues.push(
                    ValidationIssue::error(
                        IssueCode::MultipleStart,
                        format!(
                            "node '{}' is an additional start node; only one is allowed",
                            node.id
                        ),
                    )
                    .at(IssuePath::node(&node.id)),
                );
            }
            let primary = registry
                .lookup(&start.node_type)
                .and_then(|def| def.compile.primary_control_out());
            let connected = primary.is_some_and(|pin_id| {
                graph
                    .edges_from(&start.id, pin_id)
                    .any(|e| e.edge_kind == PinKind::Control)
            });
            if !connected {
                issues.push(
                    ValidationIssue::error(
                        IssueCode::StartUnconnected,
                        format!("start node '{}' is not connected to anything", start.id),
                    )
                    .at(IssuePath::pin(&start.id, primary.unwrap_or_default())),
                );
            }

            // 6. Reachability
            let reachable = reachable_from(&graph.edges, &start.id);
            for node in &graph.nodes {
                if registry.is_start(&node.node_type) || reachable.contains(node.id.as_str()) {
                    continue;
                }
                let has_control = pin_table
                    .get(node.id.as_str())
                    .is_some_and(|pins| pins.iter().any(|p| p.kind == PinKind::Control));
                if has_control {
                    issues.push(
                        ValidationIssue::warn(
                            IssueCode::UnreachableNode,
                            format!("node '{}' can never run from the start node", node.id),
                        )
                        .at(IssuePath::node(&node.id)),
                    );
                }
            }
        }
    }

    // 7. Control cycles
    for edge in control_cycle_edges(&graph.edges) {
        issues.push(
            ValidationIssue::error(
                IssueCode::ControlCycle,
                format!("edge '{}' is part of a control-flow loop", edge.id),
            )
            .at(IssuePath::edge(&edge.id)),
        );
    }

    debug!(
        graph = %graph.id,
        issues = issues.len(),
        errors = issues.iter().filter(|i| i.is_error()).count(),
        "graph validated"
    );

    if issues.is_empty() {
        issues.push(ValidationIssue::info(IssueCode::Ok, "graph is valid"));
    }
    Ok(issues)
}

fn pin_is_connected(graph: &Graph, node: &GraphNode, pin: &PinDefinition) -> bool {
    match pin.direction {
        PinDirection::In => graph
            .edges_into(&node.id, &pin.id)
            .any(|e| e.edge_kind == pin.kind),
        PinDirection::Out => graph
            .edges_from(&node.id, &pin.id)
            .any(|e| e.edge_kind == pin.kind),
    }
}
