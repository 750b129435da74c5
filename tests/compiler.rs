//! Tests for lowering graphs into runtime steps.
mod common;
use common::*;
use kairo::compiler::DisplaySteps;
use kairo::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::json;

fn compile(graph: &Graph) -> CompileOutput {
    Compiler::new(&registry())
        .compile(graph)
        .expect("built-in registry is consistent")
}

#[test]
fn test_hello_compiles_to_one_step() {
    let output = compile(&hello_graph());
    assert!(!output.has_errors());
    assert_eq!(
        steps_json(&output.steps),
        json!([{ "type": "SHOW_TEXT", "text": "Hello" }])
    );
    assert_eq!(
        output.steps,
        vec![CompiledStep::action("SHOW_TEXT", [("text", json!("Hello"))])]
    );
}

#[test]
fn test_branch_with_else_if() {
    let output = compile(&branch_graph(1));
    assert!(!output.has_errors());
    assert_eq!(
        steps_json(&output.steps),
        json!([{
            "type": "IF",
            "condition": { "type": "LITERAL", "value": true },
            "then": [{ "type": "SHOW_TEXT", "text": "then" }],
            "elseIf": [{
                "condition": { "type": "LITERAL", "value": false },
                "steps": [{ "type": "SHOW_TEXT", "text": "else if" }]
            }],
            "else": [{ "type": "SHOW_TEXT", "text": "else" }]
        }])
    );
}

#[test]
fn test_missing_start_yields_no_steps() {
    let graph = Graph::new("headless").with_node(text_node("a", "A"));
    let output = compile(&graph);
    assert!(output.steps.is_empty());
    assert!(output.has_errors());
    assert!(error_codes(&output.issues).contains(&IssueCode::MissingStart));
}

#[test]
fn test_linear_chain_and_schema_defaults() {
    let graph = Graph::new("chain")
        .with_node(node("start", "start"))
        .with_node(node("hit", "dealDamage").with_config("amount", json!(3)))
        .with_node(node("flag", "setFlag"))
        .with_node(node("draw", "drawCards"))
        .with_edge(control("e1", ("start", "execOut"), ("hit", "execIn")))
        .with_edge(control("e2", ("hit", "execOut"), ("flag", "execIn")))
        .with_edge(control("e3", ("flag", "execOut"), ("draw", "execIn")));

    let output = compile(&graph);
    assert_eq!(
        steps_json(&output.steps),
        json!([
            { "type": "DEAL_DAMAGE", "amount": 3, "target": "opponent" },
            // `key` has no default and is omitted.
            { "type": "SET_FLAG", "value": true },
            { "type": "DRAW_CARDS", "count": 1 }
        ])
    );
}

#[test]
fn test_fan_out_follows_edge_order() {
    let graph = Graph::new("fan")
        .with_node(node("start", "start"))
        .with_node(text_node("a", "A"))
        .with_node(text_node("b", "B"))
        .with_edge(control("e1", ("start", "execOut"), ("b", "execIn")))
        .with_edge(control("e2", ("start", "execOut"), ("a", "execIn")));

    let output = compile(&graph);
    let texts: Vec<_> = output
        .steps
        .iter()
        .filter_map(|s| s.as_action())
        .filter_map(|a| a.field("text"))
        .collect();
    assert_eq!(texts, vec![&json!("B"), &json!("A")]);
}

#[test]
fn test_rejoining_branches_emit_shared_node_once() {
    let graph = branch_graph(0)
        .with_node(text_node("shared", "shared"))
        .with_edge(control("e-then-shared", ("then", "execOut"), ("shared", "execIn")))
        .with_edge(control("e-else-shared", ("else", "execOut"), ("shared", "execIn")));

    let output = compile(&graph);
    assert!(!output.has_errors());
    assert_eq!(
        steps_json(&output.steps),
        json!([{
            "type": "IF",
            "condition": { "type": "LITERAL", "value": true },
            "then": [
                { "type": "SHOW_TEXT", "text": "then" },
                { "type": "SHOW_TEXT", "text": "shared" }
            ],
            "elseIf": [],
            "else": [{ "type": "SHOW_TEXT", "text": "else" }]
        }])
    );
}

#[test]
fn test_branch_continuation_follows_the_branch_step() {
    let graph = branch_graph(0)
        .with_node(text_node("after", "after"))
        .with_edge(control("e-done", ("if", "execOut"), ("after", "execIn")));

    let output = compile(&graph);
    assert_eq!(output.steps.len(), 2);
    assert_eq!(output.steps[0].step_type(), "IF");
    assert_eq!(
        output.steps[1],
        CompiledStep::action("SHOW_TEXT", [("text", json!("after"))])
    );
}

#[test]
fn test_unresolvable_conditions_are_always() {
    let graph = Graph::new("g")
        .with_node(node("start", "start"))
        .with_node(node("if", "branch").with_config("elseIfCount", json!(1)))
        .with_node(node("flag", "readFlag").with_config("key", json!("armed")))
        .with_node(text_node("then", "then"))
        .with_edge(control("e1", ("start", "execOut"), ("if", "execIn")))
        .with_edge(data("e2", ("flag", "valueOut"), ("if", "condIn")))
        .with_edge(control("e3", ("if", "thenOut"), ("then", "execIn")));

    let output = compile(&graph);
    let branch = output.steps[0].as_branch().expect("a branch step");
    assert_eq!(branch.condition, Condition::Always);
    assert_eq!(branch.else_if.len(), 1);
    // Unconnected else-if slots compile to an always-true, empty clause.
    assert_eq!(branch.else_if[0].condition, Condition::Always);
    assert!(branch.else_if[0].steps.is_empty());
    assert!(branch.otherwise.is_empty());
}

#[test]
fn test_literal_condition_falls_back_to_default() {
    let graph = branch_graph(0);
    let mut graph = graph;
    graph.nodes[2].config.clear();

    let output = compile(&graph);
    let branch = output.steps[0].as_branch().expect("a branch step");
    assert_eq!(
        branch.condition,
        Condition::Literal {
            value: json!(false)
        }
    );
}

#[test]
fn test_first_start_node_is_compiled() {
    let graph = hello_graph()
        .with_node(node("start2", "start"))
        .with_node(text_node("other", "other"))
        .with_edge(control("e2", ("start2", "execOut"), ("other", "execIn")));

    let output = compile(&graph);
    assert!(error_codes(&output.issues).contains(&IssueCode::MultipleStart));
    assert_eq!(
        steps_json(&output.steps),
        json!([{ "type": "SHOW_TEXT", "text": "Hello" }])
    );
}

#[test]
fn test_control_cycle_still_terminates() {
    let graph = hello_graph()
        .with_node(text_node("b", "B"))
        .with_edge(control("e2", ("hello", "execOut"), ("b", "execIn")))
        .with_edge(control("e3", ("b", "execOut"), ("hello", "execIn")));

    let output = compile(&graph);
    assert!(error_codes(&output.issues).contains(&IssueCode::ControlCycle));
    assert_eq!(output.steps.len(), 2);
}

#[test]
fn test_long_chain_compiles_without_deep_recursion() {
    const LENGTH: usize = 10_000;
    let mut graph = Graph::new("long").with_node(node("start", "start"));
    let mut previous = ("start".to_string(), "execOut");
    for index in 0..LENGTH {
        let id = format!("t{}", index);
        graph = graph
            .with_node(text_node(&id, &index.to_string()))
            .with_edge(control(
                &format!("e{}", index),
                (previous.0.as_str(), previous.1),
                (id.as_str(), "execIn"),
            ));
        previous = (id, "execOut");
    }

    let output = compile(&graph);
    assert!(!output.has_errors());
    assert_eq!(output.steps.len(), LENGTH);
    assert_eq!(output.steps[0].as_action().and_then(|a| a.field("text")), Some(&json!("0")));
    assert_eq!(
        output.steps[LENGTH - 1].as_action().and_then(|a| a.field("text")),
        Some(&json!("9999"))
    );
}

#[test]
fn test_nested_branches_keep_depth_first_order() {
    // The inner branch hangs off the outer `then`; its own outputs must land
    // inside it, and the outer `else` must stay on the outer branch.
    let graph = branch_graph(0)
        .with_node(node("inner", "branch"))
        .with_node(bool_node("maybe", false))
        .with_node(text_node("inner-then", "inner then"))
        .with_node(text_node("inner-else", "inner else"))
        .with_edge(control("e-inner", ("then", "execOut"), ("inner", "execIn")))
        .with_edge(data("e-inner-cond", ("maybe", "valueOut"), ("inner", "condIn")))
        .with_edge(control("e-inner-then", ("inner", "thenOut"), ("inner-then", "execIn")))
        .with_edge(control("e-inner-else", ("inner", "elseOut"), ("inner-else", "execIn")));

    let output = compile(&graph);
    assert!(!output.has_errors());
    assert_eq!(
        steps_json(&output.steps),
        json!([{
            "type": "IF",
            "condition": { "type": "LITERAL", "value": true },
            "then": [
                { "type": "SHOW_TEXT", "text": "then" },
                {
                    "type": "IF",
                    "condition": { "type": "LITERAL", "value": false },
                    "then": [{ "type": "SHOW_TEXT", "text": "inner then" }],
                    "elseIf": [],
                    "else": [{ "type": "SHOW_TEXT", "text": "inner else" }]
                }
            ],
            "elseIf": [],
            "else": [{ "type": "SHOW_TEXT", "text": "else" }]
        }])
    );
}

#[test]
fn test_unknown_nodes_are_skipped() {
    let graph = hello_graph()
        .with_node(node("x", "teleport"))
        .with_node(text_node("after", "after"))
        .with_edge(control("e2", ("hello", "execOut"), ("x", "execIn")))
        .with_edge(control("e3", ("hello", "execOut"), ("after", "execIn")));

    let output = compile(&graph);
    assert!(output.has_errors());
    assert_eq!(
        steps_json(&output.steps),
        json!([
            { "type": "SHOW_TEXT", "text": "Hello" },
            { "type": "SHOW_TEXT", "text": "after" }
        ])
    );
}

#[test]
fn test_type_alias() {
    let registry = registry();
    let graph = Graph::new("aliased")
        .with_node(node("start", "start"))
        .with_node(node("say", "say").with_config("text", json!("hi")))
        .with_edge(control("e1", ("start", "execOut"), ("say", "execIn")));

    let output = Compiler::builder(&registry)
        .with_type_alias("say", "showText")
        .build()
        .compile(&graph)
        .expect("compiles");
    assert!(!output.has_errors());
    assert_eq!(
        steps_json(&output.steps),
        json!([{ "type": "SHOW_TEXT", "text": "hi" }])
    );

    let plain = Compiler::new(&registry).compile(&graph).expect("compiles");
    assert!(error_codes(&plain.issues).contains(&IssueCode::UnknownNode));
    assert!(plain.steps.is_empty());
}

#[test]
fn test_compiled_steps_deserialize() {
    let json = json!([
        { "type": "HEAL", "amount": 2, "target": "self" },
        {
            "type": "IF",
            "condition": { "type": "ALWAYS" },
            "then": [{ "type": "DRAW_CARDS", "count": 1 }],
            "else": []
        }
    ]);
    let steps: Vec<CompiledStep> = serde_json::from_value(json).expect("steps deserialize");
    assert_eq!(steps[0].step_type(), "HEAL");
    assert_eq!(
        steps[0].as_action().and_then(|a| a.field("target")),
        Some(&json!("self"))
    );
    let branch = steps[1].as_branch().expect("a branch step");
    assert_eq!(branch.condition, Condition::Always);
    assert!(branch.else_if.is_empty());
}

#[test]
fn test_display_steps_tree() {
    let output = compile(&branch_graph(1));
    let tree = DisplaySteps(&output.steps).to_string();
    assert!(tree.starts_with("└── IF LITERAL(true)"));
    assert!(tree.contains("├── then"));
    assert!(tree.contains("├── else if LITERAL(false)"));
    assert!(tree.contains("SHOW_TEXT text=\"else if\""));
    assert_eq!(DisplaySteps(&[]).to_string(), "<no steps>\n");
}
