use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One instruction in the runtime's canonical format.
///
/// A linear step serializes flat, e.g. `{"type": "SHOW_TEXT", "text": "Hello"}`.
/// A branch step nests its child sequences under `then`, `elseIf` and `else`.
/// When reading steps back, anything with a `condition` and a `then` is a
/// branch; registries reject step fields with those names, see
/// [`RESERVED_STEP_KEYS`](crate::registry::RESERVED_STEP_KEYS).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompiledStep {
    Branch(BranchStep),
    Action(ActionStep),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionStep {
    #[serde(rename = "type")]
    pub step_type: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchStep {
    #[serde(rename = "type")]
    pub step_type: String,
    pub condition: Condition,
    pub then: Vec<CompiledStep>,
    #[serde(default)]
    pub else_if: Vec<ElseIfClause>,
    #[serde(rename = "else", default)]
    pub otherwise: Vec<CompiledStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElseIfClause {
    pub condition: Condition,
    pub steps: Vec<CompiledStep>,
}

/// A branch condition leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Condition {
    /// A constant taken from an upstream literal node.
    Literal { value: Value },
    /// No resolvable input; the branch is always taken.
    Always,
}

impl CompiledStep {
    /// Builds a linear step from a type tag and its fields.
    pub fn action<K: Into<String>>(
        step_type: impl Into<String>,
        fields: impl IntoIterator<Item = (K, Value)>,
    ) -> Self {
        CompiledStep::Action(ActionStep {
            step_type: step_type.into(),
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        })
    }

    pub fn step_type(&self) -> &str {
        match self {
            CompiledStep::Branch(branch) => &branch.step_type,
            CompiledStep::Action(action) => &action.step_type,
        }
    }

    pub fn as_branch(&self) -> Option<&BranchStep> {
        match self {
            CompiledStep::Branch(branch) => Some(branch),
            CompiledStep::Action(_) => None,
        }
    }

    pub fn as_action(&self) -> Option<&ActionStep> {
        match self {
            CompiledStep::Action(action) => Some(action),
            CompiledStep::Branch(_) => None,
        }
    }
}

impl ActionStep {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}
