pub mod builtin;
pub mod definition;

pub use definition::*;

use crate::error::RegistryError;
use crate::graph::Config;
use crate::pins::{self, MAX_DYNAMIC_SLOTS};
use ahash::AHashMap;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Node type of the designated start node in the built-in catalog.
pub const DEFAULT_START_NODE_TYPE: &str = "start";

/// Slot counts checked when a dynamic template declares no maximum.
const UNBOUNDED_SLOT_COUNTS: [usize; 3] = [0, 1, 2];

/// Keys a step field may not use: `type` carries the step type, and the rest
/// are the keys that mark a compiled step as a branch when it is read back.
pub const RESERVED_STEP_KEYS: [&str; 5] = ["type", "condition", "then", "elseIf", "else"];

/// The read-only catalog of node types.
///
/// A registry is validated once when it is built and never mutated afterwards;
/// an editor that needs different node types builds a new registry.
#[derive(Debug, Clone)]
pub struct Registry {
    definitions: AHashMap<String, NodeDefinition>,
    order: Vec<String>,
    start_node_type: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistryFile {
    #[serde(default = "default_start_node_type")]
    start_node_type: String,
    nodes: Vec<NodeDefinition>,
}

fn default_start_node_type() -> String {
    DEFAULT_START_NODE_TYPE.to_string()
}

impl Registry {
    /// Builds a registry, rejecting any definition that is internally inconsistent.
    pub fn new(
        definitions: Vec<NodeDefinition>,
        start_node_type: impl Into<String>,
    ) -> Result<Self, RegistryError> {
        let registry = Self::assemble(definitions, start_node_type.into())?;
        registry.check()?;
        debug!(
            node_types = registry.order.len(),
            start = %registry.start_node_type,
            "registry loaded"
        );
        Ok(registry)
    }

    /// The built-in ability node catalog.
    pub fn builtin() -> Self {
        let definitions = builtin::definitions();
        let registry = Self {
            order: definitions.iter().map(|def| def.node_type.clone()).collect(),
            definitions: definitions
                .into_iter()
                .map(|def| (def.node_type.clone(), def))
                .collect(),
            start_node_type: DEFAULT_START_NODE_TYPE.to_string(),
        };
        debug_assert!(
            registry.check().is_ok(),
            "built-in registry is inconsistent: {:?}",
            registry.check()
        );
        registry
    }

    /// Loads a catalog from JSON: `{"startNodeType": "...", "nodes": [...]}`.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let file: RegistryFile = serde_json::from_str(json)
            .map_err(|e| RegistryError::JsonParseError(e.to_string()))?;
        Self::new(file.nodes, file.start_node_type)
    }

    /// Loads a catalog from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| RegistryError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&content)
    }

    pub fn lookup(&self, node_type: &str) -> Option<&NodeDefinition> {
        self.definitions.get(node_type)
    }

    /// All definitions, in load order.
    pub fn definitions(&self) -> impl Iterator<Item = &NodeDefinition> {
        self.order.iter().filter_map(|t| self.definitions.get(t))
    }

    pub fn start_node_type(&self) -> &str {
        &self.start_node_type
    }

    pub fn is_start(&self, node_type: &str) -> bool {
        node_type == self.start_node_type
    }

    /// Convenience wrapper around [`pins::materialize`].
    pub fn materialize(
        &self,
        node_type: &str,
        config: &Config,
    ) -> Result<Vec<PinDefinition>, crate::error::MaterializeError> {
        pins::materialize(self, node_type, config)
    }

    fn assemble(
        definitions: Vec<NodeDefinition>,
        start_node_type: String,
    ) -> Result<Self, RegistryError> {
        let mut map = AHashMap::with_capacity(definitions.len());
        let mut order = Vec::with_capacity(definitions.len());
        for def in definitions {
            if map.contains_key(&def.node_type) {
                return Err(RegistryError::DuplicateNodeType(def.node_type));
            }
            order.push(def.node_type.clone());
            map.insert(def.node_type.clone(), def);
        }
        Ok(Self {
            definitions: map,
            order,
            start_node_type,
        })
    }

    fn check(&self) -> Result<(), RegistryError> {
        match self.lookup(&self.start_node_type) {
            Some(def) if matches!(def.compile, CompileDescriptor::Entry { .. }) => {}
            _ => return Err(RegistryError::MissingStartType(self.start_node_type.clone())),
        }
        for def in self.definitions() {
            check_definition(def)?;
        }
        Ok(())
    }
}

/// Checks one definition for authoring bugs that would otherwise surface later
/// as confusing compile output.
fn check_definition(def: &NodeDefinition) -> Result<(), RegistryError> {
    let boundary_counts: Vec<usize> = match &def.dynamic_pins {
        Some(template) => {
            let field = def.config_schema.get(&template.count_field).ok_or_else(|| {
                RegistryError::UnknownCountField {
                    node_type: def.node_type.clone(),
                    field: template.count_field.clone(),
                }
            })?;
            match field.maximum {
                Some(max) => vec![0, 1, (max.max(0.0).floor() as usize).min(MAX_DYNAMIC_SLOTS)],
                None => UNBOUNDED_SLOT_COUNTS.to_vec(),
            }
        }
        None => vec![0],
    };
    for count in boundary_counts {
        pins::instantiate(def, count)?;
    }

    let invalid = |message: String| RegistryError::InvalidDescriptor {
        node_type: def.node_type.clone(),
        message,
    };
    let expect_static = |pin_id: &str, kind: PinKind, direction: PinDirection| match def
        .static_pin(pin_id)
    {
        Some(pin) if pin.is(kind, direction) => Ok(()),
        Some(_) => Err(invalid(format!(
            "pin '{}' must be a {} {} pin",
            pin_id, kind, direction
        ))),
        None => Err(invalid(format!("pin '{}' is not a static pin", pin_id))),
    };

    match &def.compile {
        CompileDescriptor::Entry { next } => {
            expect_static(next, PinKind::Control, PinDirection::Out)?;
        }
        CompileDescriptor::Step { fields, next, .. } => {
            if let Some(field) = fields
                .iter()
                .find(|f| RESERVED_STEP_KEYS.contains(&f.as_str()))
            {
                return Err(invalid(format!("step field '{}' is reserved", field)));
            }
            if let Some(field) = fields.iter().find(|f| !def.config_schema.contains_key(*f)) {
                return Err(invalid(format!(
                    "step field '{}' is not in the config schema",
                    field
                )));
            }
            if let Some(next) = next {
                expect_static(next, PinKind::Control, PinDirection::Out)?;
            }
        }
        CompileDescriptor::Branch {
            condition,
            then,
            else_if,
            otherwise,
            next,
            ..
        } => {
            expect_static(condition, PinKind::Data, PinDirection::In)?;
            expect_static(then, PinKind::Control, PinDirection::Out)?;
            expect_static(otherwise, PinKind::Control, PinDirection::Out)?;
            if let Some(next) = next {
                expect_static(next, PinKind::Control, PinDirection::Out)?;
            }
            if let Some(slot) = else_if {
                let template = def.dynamic_pins.as_ref().ok_or_else(|| {
                    invalid("else-if pins declared without a dynamic pin template".to_string())
                })?;
                let templated = |pin_id: &str, kind: PinKind, direction: PinDirection| {
                    template
                        .pins
                        .iter()
                        .any(|p| p.id == pin_id && p.is(kind, direction))
                };
                if !templated(&slot.condition, PinKind::Data, PinDirection::In) {
                    return Err(invalid(format!(
                        "else-if condition '{}' is not a templated DATA IN pin",
                        slot.condition
                    )));
                }
                if !templated(&slot.then, PinKind::Control, PinDirection::Out) {
                    return Err(invalid(format!(
                        "else-if output '{}' is not a templated CONTROL OUT pin",
                        slot.then
                    )));
                }
            }
        }
        CompileDescriptor::Literal { field } => {
            if !def.config_schema.contains_key(field) {
                return Err(invalid(format!(
                    "literal field '{}' is not in the config schema",
                    field
                )));
            }
        }
        CompileDescriptor::Data => {}
    }
    Ok(())
}
