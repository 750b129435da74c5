//! Pin materialization: the concrete pin list of one node instance.
//!
//! Pins are never cached on the node. They are recomputed from the node's
//! definition and current config whenever they are needed, so a config edit is
//! reflected immediately by every consumer.

use crate::error::{MaterializeError, RegistryError};
use crate::graph::Config;
use crate::registry::{NodeDefinition, PinDefinition, Registry};
use itertools::Itertools;
use serde_json::Value;
use tracing::trace;

/// Placeholder substituted with the slot index in dynamic pin templates.
pub const INDEX_PLACEHOLDER: &str = "{i}";

/// Hard upper bound on the slot count of any dynamic pin template, whatever
/// the config value or the schema's `maximum` says.
pub const MAX_DYNAMIC_SLOTS: usize = 64;

/// Materializes the pins of a node of type `node_type` with the given config.
pub fn materialize(
    registry: &Registry,
    node_type: &str,
    config: &Config,
) -> Result<Vec<PinDefinition>, MaterializeError> {
    let definition = registry
        .lookup(node_type)
        .ok_or_else(|| MaterializeError::UnknownNodeType(node_type.to_string()))?;
    Ok(materialize_definition(definition, config)?)
}

/// Materializes the pins of an already resolved definition.
///
/// Static pins come first, followed by each dynamic slot's pins in index order.
pub fn materialize_definition(
    definition: &NodeDefinition,
    config: &Config,
) -> Result<Vec<PinDefinition>, RegistryError> {
    instantiate(definition, dynamic_count(definition, config))
}

/// Expands a definition with an explicit slot count.
pub(crate) fn instantiate(
    definition: &NodeDefinition,
    count: usize,
) -> Result<Vec<PinDefinition>, RegistryError> {
    let mut pins = definition.pins.clone();
    if let Some(template) = &definition.dynamic_pins {
        trace!(
            node_type = %definition.node_type,
            count,
            "expanding dynamic pin template"
        );
        for index in 0..count {
            pins.extend(template.pins.iter().map(|pin| expand_pin(pin, index)));
        }
    }

    if let Some(pin_id) = pins.iter().map(|p| p.id.as_str()).duplicates().next() {
        return Err(RegistryError::DuplicatePinId {
            node_type: definition.node_type.clone(),
            pin_id: pin_id.to_string(),
        });
    }
    Ok(pins)
}

/// Number of dynamic slots a node instance has.
///
/// The count field is read from config (falling back to the schema default),
/// coerced to a non-negative integer, then clamped into the schema's
/// `[minimum, maximum]` and finally capped at [`MAX_DYNAMIC_SLOTS`].
pub fn dynamic_count(definition: &NodeDefinition, config: &Config) -> usize {
    let Some(template) = &definition.dynamic_pins else {
        return 0;
    };
    let field = definition.config_schema.get(&template.count_field);
    let raw = config
        .get(&template.count_field)
        .filter(|v| !v.is_null())
        .or_else(|| field.and_then(|f| f.default.as_ref()));

    let mut count = raw.map(coerce_count).unwrap_or(0.0);
    if let Some(field) = field {
        if let Some(minimum) = field.minimum {
            count = count.max(minimum.ceil());
        }
        if let Some(maximum) = field.maximum {
            count = count.min(maximum.floor());
        }
    }
    count.clamp(0.0, MAX_DYNAMIC_SLOTS as f64) as usize
}

/// Substitutes a slot index into an id, label or group template.
pub fn substitute(template: &str, index: usize) -> String {
    template.replace(INDEX_PLACEHOLDER, &index.to_string())
}

/// Finds a pin by id in a materialized pin list.
pub fn find_pin<'a>(pins: &'a [PinDefinition], pin_id: &str) -> Option<&'a PinDefinition> {
    pins.iter().find(|p| p.id == pin_id)
}

fn expand_pin(template: &PinDefinition, index: usize) -> PinDefinition {
    PinDefinition {
        id: substitute(&template.id, index),
        label: substitute(&template.label, index),
        group: template.group.as_deref().map(|g| substitute(g, index)),
        ..template.clone()
    }
}

fn coerce_count(value: &Value) -> f64 {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(n) if n.is_finite() && n > 0.0 => n.trunc(),
        _ => 0.0,
    }
}
