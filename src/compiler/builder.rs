use super::step::{ActionStep, BranchStep, CompiledStep, Condition, ElseIfClause};
use crate::graph::{Graph, GraphNode};
use crate::pins::{dynamic_count, substitute};
use crate::registry::{CompileDescriptor, NodeDefinition, PinKind, Registry};
use ahash::{AHashMap, AHashSet};
use serde_json::{Map, Value};
use tracing::trace;

type PinIndex<'a, T> = AHashMap<&'a str, AHashMap<&'a str, T>>;

/// Index of the top-level sequence in the builder's sequence table.
const ROOT_SEQUENCE: usize = 0;

/// A node waiting to be lowered into the sequence with the given index.
struct Lower<'a> {
    node_id: &'a str,
    sequence: usize,
}

/// A step whose child sequences may still be filling up.
enum PendingStep {
    Ready(CompiledStep),
    Branch(PendingBranch),
}

struct PendingBranch {
    step_type: String,
    condition: Condition,
    then: usize,
    else_if: Vec<(Condition, usize)>,
    otherwise: usize,
}

/// Lowers the control flow of one graph into steps, depth first.
///
/// A builder lives for a single compile call. Its visited set guarantees each
/// node is emitted at most once, so branches that rejoin at a shared node do
/// not duplicate it and the walk always terminates.
pub(super) struct StepBuilder<'a> {
    registry: &'a Registry,
    nodes: AHashMap<&'a str, &'a GraphNode>,
    /// `(node, control output) -> target nodes`, in edge order.
    control_out: PinIndex<'a, Vec<&'a str>>,
    /// `(node, data input) -> first source node`.
    data_in: PinIndex<'a, &'a str>,
    visited: AHashSet<&'a str>,
}

impl<'a> StepBuilder<'a> {
    pub(super) fn new(registry: &'a Registry, graph: &'a Graph) -> Self {
        let mut nodes = AHashMap::with_capacity(graph.nodes.len());
        for node in &graph.nodes {
            nodes.entry(node.id.as_str()).or_insert(node);
        }

        let mut control_out: PinIndex<'a, Vec<&'a str>> = AHashMap::new();
        let mut data_in: PinIndex<'a, &'a str> = AHashMap::new();
        for edge in &graph.edges {
            match edge.edge_kind {
                PinKind::Control => control_out
                    .entry(edge.from.node_id.as_str())
                    .or_default()
                    .entry(edge.from.pin_id.as_str())
                    .or_default()
                    .push(edge.to.node_id.as_str()),
                PinKind::Data => {
                    data_in
                        .entry(edge.to.node_id.as_str())
                        .or_default()
                        .entry(edge.to.pin_id.as_str())
                        .or_insert(edge.from.node_id.as_str());
                }
            }
        }

        Self {
            registry,
            nodes,
            control_out,
            data_in,
            visited: AHashSet::new(),
        }
    }

    /// Compiles everything reachable from the given start node.
    ///
    /// The walk keeps its own work stack, so graph depth is not limited by the
    /// host call stack. Tasks are pushed in reverse so they pop in the same
    /// depth-first order a recursive walk would visit them.
    pub(super) fn build_from(mut self, start: &'a GraphNode) -> Vec<CompiledStep> {
        let mut sequences: Vec<Vec<PendingStep>> = vec![Vec::new()];
        let mut work = vec![Lower {
            node_id: start.id.as_str(),
            sequence: ROOT_SEQUENCE,
        }];
        while let Some(task) = work.pop() {
            self.lower_node(task, &mut sequences, &mut work);
        }
        assemble(sequences)
    }

    /// Queues the nodes connected to one control output, in edge order.
    fn schedule(&self, node_id: &str, pin_id: &str, sequence: usize, work: &mut Vec<Lower<'a>>) {
        if let Some(targets) = self.control_out.get(node_id).and_then(|pins| pins.get(pin_id)) {
            work.extend(
                targets
                    .iter()
                    .rev()
                    .map(|&node_id| Lower { node_id, sequence }),
            );
        }
    }

    fn lower_node(
        &mut self,
        task: Lower<'a>,
        sequences: &mut Vec<Vec<PendingStep>>,
        work: &mut Vec<Lower<'a>>,
    ) {
        let Lower { node_id, sequence } = task;
        if !self.visited.insert(node_id) {
            trace!(node = node_id, "already emitted, skipping");
            return;
        }
        // Dangling edges and unknown node types are reported by the validator.
        let Some(&node) = self.nodes.get(node_id) else {
            return;
        };
        let Some(definition) = self.registry.lookup(&node.node_type) else {
            return;
        };

        match &definition.compile {
            CompileDescriptor::Entry { next } => self.schedule(node_id, next, sequence, work),
            CompileDescriptor::Step {
                step_type,
                fields,
                next,
            } => {
                sequences[sequence].push(PendingStep::Ready(CompiledStep::Action(ActionStep {
                    step_type: step_type.clone(),
                    fields: read_fields(definition, node, fields),
                })));
                if let Some(next) = next {
                    self.schedule(node_id, next, sequence, work);
                }
            }
            CompileDescriptor::Branch {
                step_type,
                condition,
                then,
                else_if,
                otherwise,
                next,
            } => {
                let mut open = || {
                    sequences.push(Vec::new());
                    sequences.len() - 1
                };
                let then_sequence = open();
                let mut clauses = Vec::new();
                let mut clause_pins = Vec::new();
                if let Some(slot) = else_if {
                    for index in 0..dynamic_count(definition, &node.config) {
                        let clause_sequence = open();
                        clauses.push((
                            self.resolve_condition(node_id, &substitute(&slot.condition, index)),
                            clause_sequence,
                        ));
                        clause_pins.push((substitute(&slot.then, index), clause_sequence));
                    }
                }
                let otherwise_sequence = open();

                sequences[sequence].push(PendingStep::Branch(PendingBranch {
                    step_type: step_type.clone(),
                    condition: self.resolve_condition(node_id, condition),
                    then: then_sequence,
                    else_if: clauses,
                    otherwise: otherwise_sequence,
                }));

                if let Some(next) = next
                    .as_deref()
                    .filter(|n| *n != then.as_str() && *n != otherwise.as_str())
                {
                    self.schedule(node_id, next, sequence, work);
                }
                self.schedule(node_id, otherwise, otherwise_sequence, work);
                for (pin_id, clause_sequence) in clause_pins.iter().rev() {
                    self.schedule(node_id, pin_id, *clause_sequence, work);
                }
                self.schedule(node_id, then, then_sequence, work);
            }
            CompileDescriptor::Literal { .. } | CompileDescriptor::Data => {}
        }
    }

    /// Resolves the condition wired into a DATA input.
    ///
    /// Only literal nodes produce a value; anything else, or nothing at all,
    /// degrades to an always-true leaf.
    fn resolve_condition(&self, node_id: &str, pin_id: &str) -> Condition {
        let Some(source_id) = self.data_in.get(node_id).and_then(|pins| pins.get(pin_id)) else {
            return Condition::Always;
        };
        let Some(&source) = self.nodes.get(source_id) else {
            return Condition::Always;
        };
        let Some(definition) = self.registry.lookup(&source.node_type) else {
            return Condition::Always;
        };
        match &definition.compile {
            CompileDescriptor::Literal { field } => config_value(definition, source, field)
                .map_or(Condition::Always, |value| Condition::Literal {
                    value: value.clone(),
                }),
            _ => Condition::Always,
        }
    }
}

/// Turns the sequence table into nested steps.
///
/// A branch's child sequences are always opened after the sequence holding the
/// branch, so building from the highest index down finds every child finished.
fn assemble(sequences: Vec<Vec<PendingStep>>) -> Vec<CompiledStep> {
    let mut built: Vec<Option<Vec<CompiledStep>>> = (0..sequences.len()).map(|_| None).collect();
    for (index, pending) in sequences.into_iter().enumerate().rev() {
        let mut steps = Vec::with_capacity(pending.len());
        for step in pending {
            match step {
                PendingStep::Ready(step) => steps.push(step),
                PendingStep::Branch(branch) => {
                    let mut else_if = Vec::with_capacity(branch.else_if.len());
                    for (condition, clause) in branch.else_if {
                        else_if.push(ElseIfClause {
                            condition,
                            steps: take_sequence(&mut built, clause),
                        });
                    }
                    steps.push(CompiledStep::Branch(BranchStep {
                        step_type: branch.step_type,
                        condition: branch.condition,
                        then: take_sequence(&mut built, branch.then),
                        else_if,
                        otherwise: take_sequence(&mut built, branch.otherwise),
                    }));
                }
            }
        }
        built[index] = Some(steps);
    }
    take_sequence(&mut built, ROOT_SEQUENCE)
}

fn take_sequence(built: &mut [Option<Vec<CompiledStep>>], index: usize) -> Vec<CompiledStep> {
    built.get_mut(index).and_then(Option::take).unwrap_or_default()
}

/// Copies the listed config fields into a step, falling back to schema defaults.
fn read_fields(definition: &NodeDefinition, node: &GraphNode, fields: &[String]) -> Map<String, Value> {
    fields
        .iter()
        .filter_map(|name| {
            config_value(definition, node, name).map(|value| (name.clone(), value.clone()))
        })
        .collect()
}

fn config_value<'v>(
    definition: &'v NodeDefinition,
    node: &'v GraphNode,
    field: &str,
) -> Option<&'v Value> {
    node.config
        .get(field)
        .filter(|v| !v.is_null())
        .or_else(|| {
            definition
                .config_schema
                .get(field)
                .and_then(|f| f.default.as_ref())
        })
}
