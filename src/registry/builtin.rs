//! The built-in ability node catalog.

use super::definition::*;
use serde_json::json;

pub const EXEC_IN: &str = "execIn";
pub const EXEC_OUT: &str = "execOut";
pub const VALUE_OUT: &str = "valueOut";

pub const BRANCH_CONDITION: &str = "condIn";
pub const BRANCH_THEN: &str = "thenOut";
pub const BRANCH_ELSE: &str = "elseOut";
pub const ELSE_IF_COUNT: &str = "elseIfCount";
pub const ELSE_IF_CONDITION: &str = "elseIfCondIn_{i}";
pub const ELSE_IF_EXEC_OUT: &str = "elseIfExecOut_{i}";

/// Upper bound on else-if slots of a `branch` node.
pub const MAX_ELSE_IF: u32 = 8;

/// Defines linear action nodes: one CONTROL in, one CONTROL out, and a step
/// built from the listed config fields.
macro_rules! define_action_nodes {
    ( $( ($node_type:expr, $label:expr, $step_type:expr, [ $( ($field:expr, $schema:expr) ),* $(,)? ]) ),* $(,)? ) => {
        fn action_definitions() -> Vec<NodeDefinition> {
            vec![
                $(
                    NodeDefinition::new(
                        $node_type,
                        $label,
                        "action",
                        CompileDescriptor::Step {
                            step_type: $step_type.to_string(),
                            fields: vec![$($field.to_string()),*],
                            next: Some(EXEC_OUT.to_string()),
                        },
                    )
                    .with_pin(PinDefinition::control_in(EXEC_IN, "In").multi())
                    .with_pin(PinDefinition::control_out(EXEC_OUT, "Out"))
                    $( .with_field($field, $schema) )*
                ),*
            ]
        }
    };
}

define_action_nodes! {
    ("showText", "Show Text", "SHOW_TEXT", [
        ("text", ConfigField::new(FieldType::String).with_default(json!(""))),
    ]),
    ("dealDamage", "Deal Damage", "DEAL_DAMAGE", [
        ("amount", ConfigField::new(FieldType::Integer).with_default(json!(1)).range(0.0, 999.0)),
        ("target", target_field()),
    ]),
    ("heal", "Heal", "HEAL", [
        ("amount", ConfigField::new(FieldType::Integer).with_default(json!(1)).range(0.0, 999.0)),
        ("target", target_field()),
    ]),
    ("drawCards", "Draw Cards", "DRAW_CARDS", [
        ("count", ConfigField::new(FieldType::Integer).with_default(json!(1)).range(0.0, 10.0)),
    ]),
    ("setFlag", "Set Flag", "SET_FLAG", [
        ("key", ConfigField::new(FieldType::String)),
        ("value", ConfigField::new(FieldType::Json).with_default(json!(true))),
    ]),
}

fn target_field() -> ConfigField {
    ConfigField::new(FieldType::String)
        .with_default(json!("opponent"))
        .one_of(vec![json!("opponent"), json!("self"), json!("all")])
}

fn literal_node(node_type: &str, label: &str, field: ConfigField, data_type: &str) -> NodeDefinition {
    NodeDefinition::new(
        node_type,
        label,
        "literal",
        CompileDescriptor::Literal {
            field: "value".to_string(),
        },
    )
    .with_field("value", field)
    .with_pin(PinDefinition::data_out(VALUE_OUT, "Value", data_type.into()))
}

/// Every node type of the built-in catalog, in display order.
pub fn definitions() -> Vec<NodeDefinition> {
    let mut definitions = vec![
        NodeDefinition::new(
            "start",
            "Start",
            "flow",
            CompileDescriptor::Entry {
                next: EXEC_OUT.to_string(),
            },
        )
        .with_pin(PinDefinition::control_out(EXEC_OUT, "Start")),
        NodeDefinition::new(
            "branch",
            "Branch",
            "flow",
            CompileDescriptor::Branch {
                step_type: "IF".to_string(),
                condition: BRANCH_CONDITION.to_string(),
                then: BRANCH_THEN.to_string(),
                else_if: Some(ElseIfPins {
                    condition: ELSE_IF_CONDITION.to_string(),
                    then: ELSE_IF_EXEC_OUT.to_string(),
                }),
                otherwise: BRANCH_ELSE.to_string(),
                next: Some(EXEC_OUT.to_string()),
            },
        )
        .with_field(
            ELSE_IF_COUNT,
            ConfigField::new(FieldType::Integer)
                .with_default(json!(0))
                .range(0.0, f64::from(MAX_ELSE_IF)),
        )
        .with_pin(PinDefinition::control_in(EXEC_IN, "In").multi())
        .with_pin(PinDefinition::data_in(BRANCH_CONDITION, "Condition", "boolean".into()).required())
        .with_pin(PinDefinition::control_out(BRANCH_THEN, "Then"))
        .with_pin(PinDefinition::control_out(BRANCH_ELSE, "Else"))
        .with_pin(PinDefinition::control_out(EXEC_OUT, "Done"))
        .with_dynamic_pins(DynamicPinTemplate {
            count_field: ELSE_IF_COUNT.to_string(),
            pins: vec![
                PinDefinition::data_in(ELSE_IF_CONDITION, "Else If {i}", "boolean".into())
                    .in_group("elseIf_{i}"),
                PinDefinition::control_out(ELSE_IF_EXEC_OUT, "Else If {i} Then")
                    .in_group("elseIf_{i}"),
            ],
        }),
    ];

    definitions.extend(action_definitions());

    definitions.extend([
        literal_node(
            "boolLiteral",
            "Boolean",
            ConfigField::new(FieldType::Boolean).with_default(json!(false)),
            "boolean",
        ),
        literal_node(
            "numberLiteral",
            "Number",
            ConfigField::new(FieldType::Number).with_default(json!(0)),
            "number",
        ),
        literal_node(
            "stringLiteral",
            "Text",
            ConfigField::new(FieldType::String).with_default(json!("")),
            "string",
        ),
        NodeDefinition::new("readFlag", "Read Flag", "data", CompileDescriptor::Data)
            .with_field("key", ConfigField::new(FieldType::String))
            .with_pin(PinDefinition::data_out(VALUE_OUT, "Value", DataType::ANY.into())),
        NodeDefinition::new("compare", "Compare", "data", CompileDescriptor::Data)
            .with_field(
                "op",
                ConfigField::new(FieldType::String)
                    .with_default(json!("=="))
                    .one_of(vec![
                        json!("=="),
                        json!("!="),
                        json!("<"),
                        json!("<="),
                        json!(">"),
                        json!(">="),
                    ]),
            )
            .with_pin(PinDefinition::data_in(
                "left",
                "Left",
                DataType::OneOf(vec!["number".to_string(), "string".to_string()]),
            ))
            .with_pin(PinDefinition::data_in(
                "right",
                "Right",
                DataType::OneOf(vec!["number".to_string(), "string".to_string()]),
            ))
            .with_pin(PinDefinition::data_out("result", "Result", "boolean".into())),
    ]);

    definitions
}
