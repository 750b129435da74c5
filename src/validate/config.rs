use super::{IssueCode, IssuePath, ValidationIssue};
use crate::graph::GraphNode;
use crate::registry::{ConfigField, NodeDefinition};
use itertools::Itertools;
use serde_json::Value;

/// Checks a node's config against its definition's schema.
///
/// `null` values count as unset and are never reported.
pub(super) fn check_config(definition: &NodeDefinition, node: &GraphNode) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    for (key, value) in node.config.iter().sorted_by(|a, b| a.0.cmp(b.0)) {
        match definition.config_schema.get(key) {
            None => issues.push(
                ValidationIssue::warn(
                    IssueCode::UnknownConfigField,
                    format!(
                        "'{}' is not a config field of {} node '{}'",
                        key, definition.node_type, node.id
                    ),
                )
                .at(IssuePath::node(&node.id)),
            ),
            Some(_) if value.is_null() => {}
            Some(field) => {
                if let Err(reason) = check_value(field, value) {
                    issues.push(
                        ValidationIssue::error(
                            IssueCode::InvalidConfig,
                            format!("config '{}' of node '{}' {}", key, node.id, reason),
                        )
                        .at(IssuePath::node(&node.id)),
                    );
                }
            }
        }
    }
    issues
}

fn check_value(field: &ConfigField, value: &Value) -> Result<(), String> {
    if !field.field_type.admits(value) {
        return Err(format!("must be of type {}, found {}", field.field_type, value));
    }
    if let Some(allowed) = &field.enum_values {
        if !allowed.contains(value) {
            return Err(format!(
                "must be one of [{}], found {}",
                allowed.iter().join(", "),
                value
            ));
        }
    }
    if let Some(n) = value.as_f64() {
        if let Some(minimum) = field.minimum {
            if n < minimum {
                return Err(format!("must be at least {}, found {}", minimum, n));
            }
        }
        if let Some(maximum) = field.maximum {
            if n > maximum {
                return Err(format!("must be at most {}, found {}", maximum, n));
            }
        }
    }
    Ok(())
}
