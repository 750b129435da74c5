//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and functions from the kairo crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use kairo::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let registry = Registry::from_file("path/to/nodes.json")?;
//! let graph: Graph = serde_json::from_str(&std::fs::read_to_string("path/to/ability.json")?)?;
//!
//! let output = Compiler::new(&registry).compile(&graph)?;
//! println!("{} steps, {} issues", output.steps.len(), output.issues.len());
//! # Ok(())
//! # }
//! ```

// Node catalog and pins
pub use crate::pins::materialize;
pub use crate::registry::{
    CompileDescriptor, ConfigField, DataType, FieldType, NodeDefinition, PinDefinition,
    PinDirection, PinKind, Registry,
};

// Graph model
pub use crate::graph::{Config, Graph, GraphEdge, GraphNode, IntoGraph, PinRef};
pub use crate::ui::UiGraph;

// Editing operations
pub use crate::connect::{RejectCode, connect, validate_connect};
pub use crate::reconcile::{EdgeEndpoints, apply_config_change, reconcile};

// Validation and compilation
pub use crate::compiler::{CompileOutput, CompiledStep, Compiler, Condition};
pub use crate::validate::{
    IssueCode, IssuePath, Severity, ValidationIssue, has_errors, validate,
};

// Error types
pub use crate::error::{ConnectError, GraphConversionError, MaterializeError, RegistryError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
