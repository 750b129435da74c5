//! Integration tests for Kairo
//!
//! End-to-end tests that take editor documents through connection checks,
//! validation and compilation.
mod common;
use common::*;
use kairo::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::json;

const CANVAS_JSON: &str = r#"{
    "id": "fireball",
    "nodes": [
        { "id": "start", "position": { "x": 0, "y": 0 }, "data": { "nodeType": "start" } },
        { "id": "hit", "position": { "x": 200, "y": 0 },
          "data": { "nodeType": "dealDamage", "config": { "amount": 4 } } },
        { "id": "say", "position": { "x": 400, "y": 0 },
          "data": { "nodeType": "showText", "config": { "text": "Burn!" } } }
    ],
    "edges": [
        { "id": "c1", "source": "start", "sourceHandle": "execOut",
          "target": "hit", "targetHandle": "execIn", "edgeKind": "CONTROL" },
        { "id": "c2", "source": "hit", "sourceHandle": "execOut",
          "target": "say", "targetHandle": "execIn", "edgeKind": "CONTROL" }
    ]
}"#;

const CUSTOM_REGISTRY_JSON: &str = r#"{
    "startNodeType": "onCast",
    "nodes": [
        {
            "nodeType": "onCast",
            "label": "On Cast",
            "category": "event",
            "pins": [{ "id": "then", "label": "Then", "kind": "CONTROL", "direction": "OUT" }],
            "compile": { "kind": "entry", "next": "then" }
        },
        {
            "nodeType": "playSound",
            "label": "Play Sound",
            "category": "action",
            "configSchema": {
                "clip": { "type": "string" },
                "volume": { "type": "number", "default": 0.5, "minimum": 0, "maximum": 1 }
            },
            "pins": [
                { "id": "in", "label": "In", "kind": "CONTROL", "direction": "IN", "multi": true },
                { "id": "out", "label": "Out", "kind": "CONTROL", "direction": "OUT" }
            ],
            "compile": { "kind": "step", "stepType": "PLAY_SOUND", "fields": ["clip", "volume"], "next": "out" }
        }
    ]
}"#;

#[test]
fn test_canvas_document_compiles() {
    let ui: UiGraph = serde_json::from_str(CANVAS_JSON).expect("canvas JSON parses");
    let graph = ui.into_graph().expect("canvas converts");
    assert_eq!(graph.id, "fireball");
    assert_eq!(graph.edges[0].edge_kind, PinKind::Control);

    let output = Compiler::new(&registry()).compile(&graph).expect("compiles");
    assert!(!output.has_errors());
    assert_eq!(
        steps_json(&output.steps),
        json!([
            { "type": "DEAL_DAMAGE", "amount": 4, "target": "opponent" },
            { "type": "SHOW_TEXT", "text": "Burn!" }
        ])
    );
}

#[test]
fn test_canvas_edge_without_kind_is_rejected() {
    let ui: UiGraph = serde_json::from_value(json!({
        "id": "g",
        "nodes": [{ "id": "start", "data": { "nodeType": "start" } }],
        "edges": [{ "id": "c1", "source": "start", "sourceHandle": "execOut",
                    "target": "x", "targetHandle": "execIn" }]
    }))
    .expect("canvas JSON parses");

    let result = ui.into_graph();
    assert!(matches!(
        result,
        Err(GraphConversionError::ValidationError(message)) if message.contains("c1")
    ));
}

#[test]
fn test_edit_session_end_to_end() {
    let registry = registry();
    let mut graph = Graph::new("session")
        .with_node(node("start", "start"))
        .with_node(node("if", "branch"))
        .with_node(bool_node("yes", true))
        .with_node(text_node("a", "A"))
        .with_node(text_node("b", "B"));

    // Growing the branch exposes a new slot.
    graph = apply_config_change(&registry, &graph, "if", config(json!({ "elseIfCount": 1 })))
        .expect("config change applies");

    for (from, to) in [
        (("start", "execOut"), ("if", "execIn")),
        (("yes", "valueOut"), ("if", "condIn")),
        (("if", "thenOut"), ("a", "execIn")),
        (("if", "elseIfExecOut_0"), ("b", "execIn")),
    ] {
        graph = connect(
            &registry,
            &graph,
            &PinRef::new(from.0, from.1),
            &PinRef::new(to.0, to.1),
        )
        .expect("legal connection");
    }

    // Closing the loop back to the branch is refused.
    let refused = connect(
        &registry,
        &graph,
        &PinRef::new("b", "execOut"),
        &PinRef::new("if", "execIn"),
    );
    assert_eq!(
        refused.err().and_then(|e| e.code()),
        Some(RejectCode::ControlCycle)
    );

    let output = Compiler::new(&registry).compile(&graph).expect("compiles");
    assert!(!output.has_errors());
    let branch = output.steps[0].as_branch().expect("a branch step");
    assert_eq!(branch.else_if.len(), 1);
    assert_eq!(branch.else_if[0].steps.len(), 1);

    // Dropping the slot prunes its edge and its steps.
    graph = apply_config_change(&registry, &graph, "if", config(json!({ "elseIfCount": 0 })))
        .expect("config change applies");
    assert_eq!(graph.edges.len(), 3);
    let output = Compiler::new(&registry).compile(&graph).expect("compiles");
    let branch = output.steps[0].as_branch().expect("a branch step");
    assert!(branch.else_if.is_empty());
    // `b` is now unreachable, which is only a warning.
    assert!(!output.has_errors());
    assert!(codes(&output.issues).contains(&IssueCode::UnreachableNode));
}

#[test]
fn test_custom_registry_end_to_end() {
    let registry = Registry::from_json(CUSTOM_REGISTRY_JSON).expect("catalog loads");
    let graph: Graph = serde_json::from_value(json!({
        "id": "custom",
        "nodes": [
            { "id": "cast", "nodeType": "onCast" },
            { "id": "sfx", "nodeType": "playSound", "config": { "clip": "whoosh" } }
        ],
        "edges": [{
            "id": "c1",
            "edgeKind": "CONTROL",
            "from": { "nodeId": "cast", "pinId": "then" },
            "to": { "nodeId": "sfx", "pinId": "in" }
        }]
    }))
    .expect("graph JSON parses");

    let output = Compiler::new(&registry).compile(&graph).expect("compiles");
    assert_eq!(codes(&output.issues), vec![IssueCode::Ok]);
    assert_eq!(
        steps_json(&output.steps),
        json!([{ "type": "PLAY_SOUND", "clip": "whoosh", "volume": 0.5 }])
    );
}

#[test]
fn test_graph_serialization_shape() {
    let edge = data("d1", ("yes", "valueOut"), ("if", "condIn"))
        .with_data_type(DataType::from("boolean"));
    assert_eq!(
        serde_json::to_value(&edge).expect("edge serializes"),
        json!({
            "id": "d1",
            "edgeKind": "DATA",
            "dataType": "boolean",
            "from": { "nodeId": "yes", "pinId": "valueOut" },
            "to": { "nodeId": "if", "pinId": "condIn" }
        })
    );

    let graph = hello_graph();
    let json = serde_json::to_string(&graph).expect("graph serializes");
    let back: Graph = serde_json::from_str(&json).expect("graph deserializes");
    assert_eq!(back, graph);
}

#[test]
fn test_registry_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Registry>();

    let registry = registry();
    let graph = hello_graph();
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| compile_steps(&registry, &graph)))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().ok(), Some(1));
        }
    });
}

fn compile_steps(registry: &Registry, graph: &Graph) -> usize {
    Compiler::new(registry)
        .compile(graph)
        .map(|o| o.steps.len())
        .unwrap_or(0)
}
