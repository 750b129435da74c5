//! Common test utilities for building ability graphs.
use kairo::prelude::*;
use serde_json::{Value, json};

#[allow(dead_code)]
pub fn registry() -> Registry {
    Registry::builtin()
}

#[allow(dead_code)]
pub fn node(id: &str, node_type: &str) -> GraphNode {
    GraphNode::new(id, node_type)
}

#[allow(dead_code)]
pub fn text_node(id: &str, text: &str) -> GraphNode {
    GraphNode::new(id, "showText").with_config("text", json!(text))
}

#[allow(dead_code)]
pub fn bool_node(id: &str, value: bool) -> GraphNode {
    GraphNode::new(id, "boolLiteral").with_config("value", json!(value))
}

#[allow(dead_code)]
pub fn control(id: &str, from: (&str, &str), to: (&str, &str)) -> GraphEdge {
    GraphEdge::control(id, PinRef::new(from.0, from.1), PinRef::new(to.0, to.1))
}

#[allow(dead_code)]
pub fn data(id: &str, from: (&str, &str), to: (&str, &str)) -> GraphEdge {
    GraphEdge::data(id, PinRef::new(from.0, from.1), PinRef::new(to.0, to.1))
}

/// `start.execOut -> showText("Hello").execIn`
#[allow(dead_code)]
pub fn hello_graph() -> Graph {
    Graph::new("hello")
        .with_node(node("start", "start"))
        .with_node(text_node("hello", "Hello"))
        .with_edge(control("e1", ("start", "execOut"), ("hello", "execIn")))
}

/// A branch with `else_if_count` slots. The primary condition is fed `true`,
/// the first else-if slot (when present) is fed `false`, and each output runs
/// its own text node.
#[allow(dead_code)]
pub fn branch_graph(else_if_count: u32) -> Graph {
    let mut graph = Graph::new("branching")
        .with_node(node("start", "start"))
        .with_node(node("if", "branch").with_config("elseIfCount", json!(else_if_count)))
        .with_node(bool_node("yes", true))
        .with_node(text_node("then", "then"))
        .with_node(text_node("else", "else"))
        .with_edge(control("e-start", ("start", "execOut"), ("if", "execIn")))
        .with_edge(data("e-cond", ("yes", "valueOut"), ("if", "condIn")))
        .with_edge(control("e-then", ("if", "thenOut"), ("then", "execIn")))
        .with_edge(control("e-else", ("if", "elseOut"), ("else", "execIn")));

    if else_if_count > 0 {
        graph = graph
            .with_node(bool_node("no", false))
            .with_node(text_node("elif", "else if"))
            .with_edge(data("e-elif-cond", ("no", "valueOut"), ("if", "elseIfCondIn_0")))
            .with_edge(control("e-elif", ("if", "elseIfExecOut_0"), ("elif", "execIn")));
    }
    graph
}

/// Every code in an issue list, in order.
#[allow(dead_code)]
pub fn codes(issues: &[ValidationIssue]) -> Vec<IssueCode> {
    issues.iter().map(|i| i.code).collect()
}

/// Codes of ERROR issues only.
#[allow(dead_code)]
pub fn error_codes(issues: &[ValidationIssue]) -> Vec<IssueCode> {
    issues.iter().filter(|i| i.is_error()).map(|i| i.code).collect()
}

#[allow(dead_code)]
pub fn pin_ids(pins: &[PinDefinition]) -> Vec<&str> {
    pins.iter().map(|p| p.id.as_str()).collect()
}

#[allow(dead_code)]
pub fn config(value: Value) -> Config {
    serde_json::from_value(value).expect("config must be a JSON object")
}

#[allow(dead_code)]
pub fn steps_json(steps: &[CompiledStep]) -> Value {
    serde_json::to_value(steps).expect("steps serialize")
}

/// A small catalog using pin features the built-in one leaves out: an
/// unbounded dynamic template with a non-zero default, explicit
/// `maxConnections`, and a required pin with a `defaultValue`.
#[allow(dead_code)]
pub const CUSTOM_CATALOG: &str = r#"{
    "nodes": [
        {
            "nodeType": "start",
            "label": "Start",
            "category": "flow",
            "pins": [{ "id": "execOut", "label": "Start", "kind": "CONTROL", "direction": "OUT" }],
            "compile": { "kind": "entry", "next": "execOut" }
        },
        {
            "nodeType": "fan",
            "label": "Fan Out",
            "category": "flow",
            "configSchema": { "n": { "type": "integer", "default": 2, "minimum": 0 } },
            "pins": [{ "id": "in", "label": "In", "kind": "CONTROL", "direction": "IN", "multi": true }],
            "dynamicPins": {
                "countField": "n",
                "pins": [{ "id": "out_{i}", "label": "Out {i}", "kind": "CONTROL", "direction": "OUT" }]
            },
            "compile": { "kind": "step", "stepType": "FAN", "fields": ["n"] }
        },
        {
            "nodeType": "number",
            "label": "Number",
            "category": "literal",
            "configSchema": { "value": { "type": "number", "default": 0 } },
            "pins": [{ "id": "valueOut", "label": "Value", "kind": "DATA", "direction": "OUT", "dataType": "number" }],
            "compile": { "kind": "literal", "field": "value" }
        },
        {
            "nodeType": "sum",
            "label": "Sum",
            "category": "action",
            "pins": [
                { "id": "in", "label": "In", "kind": "CONTROL", "direction": "IN", "multi": true, "maxConnections": 1 },
                { "id": "terms", "label": "Terms", "kind": "DATA", "direction": "IN", "dataType": "number", "maxConnections": 2 },
                { "id": "scale", "label": "Scale", "kind": "DATA", "direction": "IN", "dataType": "number", "required": true, "defaultValue": 1 },
                { "id": "offset", "label": "Offset", "kind": "DATA", "direction": "IN", "dataType": "number", "required": true },
                { "id": "out", "label": "Out", "kind": "CONTROL", "direction": "OUT" }
            ],
            "compile": { "kind": "step", "stepType": "SUM", "next": "out" }
        }
    ]
}"#;

#[allow(dead_code)]
pub fn custom_registry() -> Registry {
    Registry::from_json(CUSTOM_CATALOG).expect("custom catalog loads")
}
