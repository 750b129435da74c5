use clap::{Parser, Subcommand};
use kairo::compiler::DisplaySteps;
use kairo::graph::Config;
use kairo::prelude::*;
use std::fs;
use std::time::Instant;
use tracing_subscriber::{EnvFilter, fmt};

/// Inspect, validate and compile ability graphs
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Node catalog JSON; the built-in catalog is used when omitted
    #[arg(short, long, global = true)]
    registry: Option<String>,

    /// Read graph files in the canvas editor format instead of the canonical one
    #[arg(long, global = true)]
    canvas: bool,

    /// Raise log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the node types of the catalog
    Nodes,
    /// Show the pins a node type materializes for a config
    Pins {
        node_type: String,
        /// Config object as JSON, e.g. '{"elseIfCount": 2}'
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Check one connection and write the updated graph
    Connect {
        graph_path: String,
        /// Source pin as `node.pin`
        from: String,
        /// Target pin as `node.pin`
        to: String,
        /// Where to write the updated graph; printed when omitted
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Report every structural issue of a graph
    Validate { graph_path: String },
    /// Compile a graph into runtime steps
    Compile {
        graph_path: String,
        /// Print an indented tree instead of JSON
        #[arg(long)]
        tree: bool,
        /// Where to write the steps JSON; printed when omitted
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let registry = match &cli.registry {
        Some(path) => Registry::from_file(path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to load registry: {}", e))),
        None => Registry::builtin(),
    };

    match cli.command {
        Command::Nodes => run_nodes(&registry),
        Command::Pins { node_type, config } => run_pins(&registry, &node_type, config.as_deref()),
        Command::Connect {
            graph_path,
            from,
            to,
            output,
        } => {
            let graph = load_graph(&graph_path, cli.canvas);
            run_connect(&registry, &graph, &from, &to, output.as_deref());
        }
        Command::Validate { graph_path } => {
            let graph = load_graph(&graph_path, cli.canvas);
            run_validate(&registry, &graph);
        }
        Command::Compile {
            graph_path,
            tree,
            output,
        } => {
            let graph = load_graph(&graph_path, cli.canvas);
            run_compile(&registry, &graph, tree, output.as_deref());
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_graph(path: &str, canvas: bool) -> Graph {
    let json = fs::read_to_string(path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to read graph file '{}': {}", path, e)));
    if canvas {
        let ui: UiGraph = serde_json::from_str(&json)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse canvas JSON: {}", e)));
        ui.into_graph()
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to convert canvas graph: {}", e)))
    } else {
        serde_json::from_str(&json)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse graph JSON: {}", e)))
    }
}

fn run_nodes(registry: &Registry) {
    println!("{:<16} {:<12} {:<16} {}", "TYPE", "CATEGORY", "LABEL", "PINS");
    for def in registry.definitions() {
        let dynamic = def
            .dynamic_pins
            .as_ref()
            .map_or(String::new(), |t| format!(" (+{} per '{}')", t.pins.len(), t.count_field));
        let marker = if registry.is_start(&def.node_type) { "*" } else { "" };
        println!(
            "{:<16} {:<12} {:<16} {}{}",
            format!("{}{}", def.node_type, marker),
            def.category,
            def.label,
            def.pins.len(),
            dynamic
        );
    }
}

fn run_pins(registry: &Registry, node_type: &str, config: Option<&str>) {
    let config: Config = match config {
        Some(json) => serde_json::from_str(json)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse config JSON: {}", e))),
        None => Config::new(),
    };
    let pins = registry
        .materialize(node_type, &config)
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));

    println!(
        "{:<20} {:<8} {:<4} {:<16} {:<4} {}",
        "ID", "KIND", "DIR", "TYPE", "MAX", "LABEL"
    );
    for pin in pins {
        let data_type = pin
            .data_type
            .as_ref()
            .map_or("-".to_string(), |t| t.to_string());
        let max = pin
            .effective_max_connections()
            .map_or("*".to_string(), |m| m.to_string());
        let required = if pin.required { " (required)" } else { "" };
        println!(
            "{:<20} {:<8} {:<4} {:<16} {:<4} {}{}",
            pin.id,
            pin.kind.to_string(),
            pin.direction.to_string(),
            data_type,
            max,
            pin.label,
            required
        );
    }
}

fn run_connect(registry: &Registry, graph: &Graph, from: &str, to: &str, output: Option<&str>) {
    let source = parse_pin_ref(from);
    let target = parse_pin_ref(to);

    match connect(registry, graph, &source, &target) {
        Ok(next) => {
            println!("Connected {} -> {}", from, to);
            write_json(&next, output);
        }
        Err(ConnectError::Rejected { code, reason }) => {
            eprintln!("Rejected [{}]: {}", code, reason);
            std::process::exit(2);
        }
        Err(e) => exit_with_error(&e.to_string()),
    }
}

fn run_validate(registry: &Registry, graph: &Graph) {
    let issues = validate(registry, graph).unwrap_or_else(|e| exit_with_error(&e.to_string()));
    for issue in &issues {
        println!("{}", issue);
    }
    if issues.iter().any(ValidationIssue::is_error) {
        std::process::exit(1);
    }
}

fn run_compile(registry: &Registry, graph: &Graph, tree: bool, output: Option<&str>) {
    let start = Instant::now();
    let compiled = Compiler::new(registry)
        .compile(graph)
        .unwrap_or_else(|e| exit_with_error(&format!("Compilation failed: {}", e)));
    let duration = start.elapsed();

    for issue in compiled.issues.iter().filter(|i| i.severity != Severity::Info) {
        eprintln!("{}", issue);
    }

    if tree {
        print!("{}", DisplaySteps(&compiled.steps));
    } else {
        write_json(&compiled.steps, output);
    }
    eprintln!(
        "Compiled {} top-level step(s) in {:?}",
        compiled.steps.len(),
        duration
    );

    if compiled.has_errors() {
        std::process::exit(1);
    }
}

fn parse_pin_ref(value: &str) -> PinRef {
    match value.split_once('.') {
        Some((node, pin)) if !node.is_empty() && !pin.is_empty() => PinRef::new(node, pin),
        _ => exit_with_error(&format!("Expected a pin as 'node.pin', got '{}'", value)),
    }
}

fn write_json<T: serde::Serialize>(value: &T, output: Option<&str>) {
    let json = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to serialize output: {}", e)));
    match output {
        Some(path) => {
            fs::write(path, json)
                .unwrap_or_else(|e| exit_with_error(&format!("Failed to write '{}': {}", path, e)));
            println!("Wrote '{}'", path);
        }
        None => println!("{}", json),
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
