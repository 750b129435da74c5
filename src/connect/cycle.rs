//! Reachability over CONTROL edges.
//!
//! DATA edges never take part: a DATA cycle is not reported here.

use crate::graph::GraphEdge;
use crate::registry::PinKind;
use ahash::{AHashMap, AHashSet};
use std::collections::VecDeque;
use std::iter;

type Adjacency<'a> = AHashMap<&'a str, Vec<&'a str>>;

/// Whether adding `candidate` to `existing` would close a CONTROL cycle.
///
/// Runs a breadth-first search from the candidate's target node; the candidate
/// closes a cycle iff its source node is reachable from there.
pub fn would_create_cycle(existing: &[GraphEdge], candidate: &GraphEdge) -> bool {
    if candidate.edge_kind != PinKind::Control {
        return false;
    }
    let adjacency = control_adjacency(existing.iter().chain(iter::once(candidate)));
    is_reachable(
        &adjacency,
        &candidate.to.node_id,
        &candidate.from.node_id,
    )
}

/// Every CONTROL edge of a snapshot that lies on a CONTROL cycle, in graph order.
///
/// An edge lies on a cycle iff both of its endpoints fall into the same strongly
/// connected component, which keeps the whole pass linear in graph size.
pub fn control_cycle_edges(edges: &[GraphEdge]) -> Vec<&GraphEdge> {
    let adjacency = control_adjacency(edges.iter());
    let component = strongly_connected_components(&adjacency);
    edges
        .iter()
        .filter(|e| e.edge_kind == PinKind::Control)
        .filter(|e| {
            let from = component.get(e.from.node_id.as_str());
            from.is_some() && from == component.get(e.to.node_id.as_str())
        })
        .collect()
}

/// Node ids reachable from `start` over CONTROL edges, `start` included.
pub fn reachable_from<'a>(edges: &'a [GraphEdge], start: &'a str) -> AHashSet<&'a str> {
    let adjacency = control_adjacency(edges.iter());
    breadth_first(&adjacency, start, |_| false)
}

fn control_adjacency<'a>(edges: impl Iterator<Item = &'a GraphEdge>) -> Adjacency<'a> {
    let mut adjacency: Adjacency<'a> = AHashMap::new();
    for edge in edges.filter(|e| e.edge_kind == PinKind::Control) {
        adjacency
            .entry(edge.from.node_id.as_str())
            .or_default()
            .push(edge.to.node_id.as_str());
    }
    adjacency
}

fn is_reachable<'a>(adjacency: &Adjacency<'a>, start: &'a str, goal: &str) -> bool {
    breadth_first(adjacency, start, |node| node == goal).contains(goal)
}

/// Visits nodes breadth-first from `start`, stopping early once `stop` matches.
fn breadth_first<'a>(
    adjacency: &Adjacency<'a>,
    start: &'a str,
    stop: impl Fn(&str) -> bool,
) -> AHashSet<&'a str> {
    let mut visited: AHashSet<&'a str> = AHashSet::new();
    let mut queue = VecDeque::from([start]);
    visited.insert(start);

    while let Some(node) = queue.pop_front() {
        if stop(node) {
            break;
        }
        for &next in adjacency.get(node).into_iter().flatten() {
            if visited.insert(next) {
                queue.push_back(next);
            }
        }
    }
    visited
}

/// Kosaraju's algorithm with explicit stacks. Maps every node to a component id.
fn strongly_connected_components<'a>(adjacency: &Adjacency<'a>) -> AHashMap<&'a str, usize> {
    let mut reverse: Adjacency<'a> = AHashMap::new();
    let mut nodes: Vec<&'a str> = Vec::new();
    let mut seen: AHashSet<&'a str> = AHashSet::new();
    for (&from, targets) in adjacency {
        if seen.insert(from) {
            nodes.push(from);
        }
        for &to in targets {
            if seen.insert(to) {
                nodes.push(to);
            }
            reverse.entry(to).or_default().push(from);
        }
    }

    // First pass: nodes in order of DFS completion.
    let mut finished: Vec<&'a str> = Vec::with_capacity(nodes.len());
    let mut visited: AHashSet<&'a str> = AHashSet::new();
    for &root in &nodes {
        if !visited.insert(root) {
            continue;
        }
        let mut stack = vec![(root, 0usize)];
        while let Some((node, cursor)) = stack.pop() {
            let next = adjacency.get(node).and_then(|targets| targets.get(cursor));
            match next {
                Some(&target) => {
                    stack.push((node, cursor + 1));
                    if visited.insert(target) {
                        stack.push((target, 0));
                    }
                }
                None => finished.push(node),
            }
        }
    }

    // Second pass over the reversed graph, latest finisher first.
    let mut component: AHashMap<&'a str, usize> = AHashMap::with_capacity(nodes.len());
    for (id, &root) in finished.iter().rev().enumerate() {
        if component.contains_key(root) {
            continue;
        }
        component.insert(root, id);
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            for &source in reverse.get(node).into_iter().flatten() {
                if !component.contains_key(source) {
                    component.insert(source, id);
                    stack.push(source);
                }
            }
        }
    }
    component
}
