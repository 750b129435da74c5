//! # Kairo - Ability Graph Validation and Step Compilation
//!
//! **Kairo** is the editor-agnostic core of a visual ability editor. Abilities are
//! authored as node graphs: CONTROL edges decide what runs next, DATA edges carry
//! values between nodes. Kairo checks those graphs while they are being edited and
//! compiles finished graphs into the flat step format a game runtime executes.
//!
//! ## Core Workflow
//!
//! Every operation is a pure function over an immutable graph snapshot and a
//! read-only node catalog. The primary workflow is:
//!
//! 1.  **Load a Registry**: Use `Registry::builtin()` or load a catalog of node types from JSON.
//! 2.  **Convert to Kairo's Model**: Implement the `IntoGraph` trait for your editor's format, or use the canvas `UiGraph`.
//! 3.  **Edit**: Ask `validate_connect` before drawing an edge, and call `apply_config_change` when a node's config changes so edges to vanished dynamic pins are pruned.
//! 4.  **Validate and Compile**: `Compiler::compile` validates the whole graph and lowers its control flow into `CompiledStep`s.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kairo::prelude::*;
//! use serde_json::json;
//!
//! fn main() -> Result<()> {
//!     let registry = Registry::builtin();
//!
//!     let graph = Graph::new("fireball")
//!         .with_node(GraphNode::new("start", "start"))
//!         .with_node(GraphNode::new("say", "showText").with_config("text", json!("Hello")));
//!
//!     // Ask before connecting: illegal edges come back as a rejection code.
//!     let graph = connect(
//!         &registry,
//!         &graph,
//!         &PinRef::new("start", "execOut"),
//!         &PinRef::new("say", "execIn"),
//!     )?;
//!
//!     let output = Compiler::new(&registry).compile(&graph)?;
//!     for issue in &output.issues {
//!         println!("{}", issue);
//!     }
//!     if !output.has_errors() {
//!         println!("{}", serde_json::to_string_pretty(&output.steps)?);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod compiler;
pub mod connect;
pub mod error;
pub mod graph;
pub mod pins;
pub mod prelude;
pub mod reconcile;
pub mod registry;
pub mod ui;
pub mod validate;
