use ahash::AHashMap;
use clap::Parser;
use itertools::Itertools;
use kairo::prelude::*;
use kairo::registry::builtin::{ELSE_IF_COUNT, MAX_ELSE_IF};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde_json::json;
use std::fs;

/// A CLI tool to generate random ability graphs through the connection checker
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The path to write the generated graph JSON to
    #[arg(short, long, default_value = "generated_graph.json")]
    output: String,

    /// Number of nodes besides the start node
    #[arg(short, long, default_value_t = 12)]
    nodes: usize,

    /// Number of random connection attempts
    #[arg(short, long, default_value_t = 200)]
    attempts: usize,

    /// Seed for reproducible graphs
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let registry = Registry::builtin();

    println!(
        "Generating a graph with {} node(s) from {} connection attempt(s)...",
        cli.nodes + 1,
        cli.attempts
    );

    let mut graph = generate_nodes(&registry, &mut rng, cli.nodes);
    let rejections = generate_edges(&registry, &mut rng, &mut graph, cli.attempts)?;

    println!("-> Accepted {} edge(s).", graph.edges.len());
    for (code, count) in rejections.iter().sorted_by_key(|(code, _)| code.as_str()) {
        println!("-> Rejected {:>4} x {}", count, code);
    }

    let output = Compiler::new(&registry).compile(&graph)?;
    let cycles = output
        .issues
        .iter()
        .filter(|i| i.code == IssueCode::ControlCycle)
        .count();
    if cycles > 0 {
        return Err(format!("generated graph has {} control cycle edge(s)", cycles).into());
    }
    println!(
        "-> Compiled to {} top-level step(s) with {} issue(s).",
        output.steps.len(),
        output.issues.len()
    );

    fs::write(&cli.output, serde_json::to_string_pretty(&graph)?)?;
    println!(
        "Successfully generated and saved graph to '{}'",
        cli.output
    );

    Ok(())
}

/// One start node plus `count` nodes of random non-start types.
fn generate_nodes(registry: &Registry, rng: &mut StdRng, count: usize) -> Graph {
    let candidates: Vec<&NodeDefinition> = registry
        .definitions()
        .filter(|def| !registry.is_start(&def.node_type))
        .collect();

    let mut graph = Graph::new("generated")
        .with_node(GraphNode::new("start", registry.start_node_type()));
    if candidates.is_empty() {
        return graph;
    }

    for index in 0..count {
        let def = candidates[rng.random_range(0..candidates.len())];
        let mut node = GraphNode::new(format!("n{}", index), def.node_type.clone());
        if def.config_schema.contains_key(ELSE_IF_COUNT) {
            node = node.with_config(ELSE_IF_COUNT, json!(rng.random_range(0..=MAX_ELSE_IF)));
        }
        graph = graph.with_node(node);
    }
    graph
}

/// Tries random OUT -> IN connections, keeping the ones the checker accepts.
fn generate_edges(
    registry: &Registry,
    rng: &mut StdRng,
    graph: &mut Graph,
    attempts: usize,
) -> Result<AHashMap<RejectCode, usize>> {
    let mut rejections = AHashMap::new();
    if graph.nodes.len() < 2 {
        return Ok(rejections);
    }

    for _ in 0..attempts {
        let source = &graph.nodes[rng.random_range(0..graph.nodes.len())];
        let target = &graph.nodes[rng.random_range(0..graph.nodes.len())];

        let source_pins = registry.materialize(&source.node_type, &source.config)?;
        let target_pins = registry.materialize(&target.node_type, &target.config)?;
        let outs: Vec<&PinDefinition> = source_pins
            .iter()
            .filter(|p| p.direction == PinDirection::Out)
            .collect();
        let ins: Vec<&PinDefinition> = target_pins
            .iter()
            .filter(|p| p.direction == PinDirection::In)
            .collect();
        if outs.is_empty() || ins.is_empty() {
            continue;
        }
        let from = PinRef::new(&source.id, &outs[rng.random_range(0..outs.len())].id);
        let to = PinRef::new(&target.id, &ins[rng.random_range(0..ins.len())].id);

        match connect(registry, graph, &from, &to) {
            Ok(next) => *graph = next,
            Err(ConnectError::Rejected { code, .. }) => *rejections.entry(code).or_insert(0) += 1,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(rejections)
}
