use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Whether a pin carries execution flow or a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PinKind {
    Control,
    Data,
}

impl fmt::Display for PinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinKind::Control => write!(f, "CONTROL"),
            PinKind::Data => write!(f, "DATA"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PinDirection {
    In,
    Out,
}

impl fmt::Display for PinDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinDirection::In => write!(f, "IN"),
            PinDirection::Out => write!(f, "OUT"),
        }
    }
}

/// The value type tag of a DATA pin.
///
/// IN pins may declare a list of accepted tags; everything else uses a single tag.
/// The tags `any` and `json` act as wildcards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataType {
    Single(String),
    OneOf(Vec<String>),
}

impl DataType {
    pub const ANY: &'static str = "any";
    pub const JSON: &'static str = "json";

    pub fn is_wildcard(&self) -> bool {
        matches!(self, DataType::Single(tag) if tag == Self::ANY || tag == Self::JSON)
    }

    /// Whether a value of type `self` may flow into a pin typed `target`.
    pub fn flows_into(&self, target: &DataType) -> bool {
        if self.is_wildcard() || target.is_wildcard() {
            return true;
        }
        match (self, target) {
            (DataType::Single(source), DataType::OneOf(accepted)) => accepted.contains(source),
            (source, target) => source == target,
        }
    }
}

impl From<&str> for DataType {
    fn from(tag: &str) -> Self {
        DataType::Single(tag.to_string())
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Single(tag) => write!(f, "{}", tag),
            DataType::OneOf(tags) => write!(f, "{}", tags.join("|")),
        }
    }
}

/// A connection point on a node instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinDefinition {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub kind: PinKind,
    pub direction: PinDirection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default)]
    pub multi: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<usize>,
}

impl PinDefinition {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        kind: PinKind,
        direction: PinDirection,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            group: None,
            kind,
            direction,
            data_type: None,
            required: false,
            default_value: None,
            multi: false,
            max_connections: None,
        }
    }

    pub fn control_in(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(id, label, PinKind::Control, PinDirection::In)
    }

    pub fn control_out(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(id, label, PinKind::Control, PinDirection::Out)
    }

    pub fn data_in(id: impl Into<String>, label: impl Into<String>, data_type: DataType) -> Self {
        Self::new(id, label, PinKind::Data, PinDirection::In).with_data_type(data_type)
    }

    pub fn data_out(id: impl Into<String>, label: impl Into<String>, data_type: DataType) -> Self {
        Self::new(id, label, PinKind::Data, PinDirection::Out).with_data_type(data_type)
    }

    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn multi(mut self) -> Self {
        self.multi = true;
        self
    }

    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = Some(max);
        self
    }

    /// Maximum inbound connections for this pin. `None` means unlimited.
    pub fn effective_max_connections(&self) -> Option<usize> {
        match self.max_connections {
            Some(max) => Some(max),
            None if self.multi => None,
            None => Some(1),
        }
    }

    pub fn is(&self, kind: PinKind, direction: PinDirection) -> bool {
        self.kind == kind && self.direction == direction
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Number,
    Integer,
    String,
    Boolean,
    Json,
}

impl FieldType {
    pub fn admits(&self, value: &Value) -> bool {
        match self {
            FieldType::Number => value.is_number(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::String => value.is_string(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Json => true,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Number => "number",
            FieldType::Integer => "integer",
            FieldType::String => "string",
            FieldType::Boolean => "boolean",
            FieldType::Json => "json",
        };
        write!(f, "{}", name)
    }
}

/// One entry of a node's config schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigField {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
}

impl ConfigField {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            default: None,
            enum_values: None,
            minimum: None,
            maximum: None,
        }
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn one_of(mut self, values: Vec<Value>) -> Self {
        self.enum_values = Some(values);
        self
    }

    pub fn range(mut self, minimum: f64, maximum: f64) -> Self {
        self.minimum = Some(minimum);
        self.maximum = Some(maximum);
        self
    }
}

/// Pins repeated once per index, driven by a numeric config field.
///
/// Template pins use `{i}` in `id`, `label` and `group`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicPinTemplate {
    pub count_field: String,
    pub pins: Vec<PinDefinition>,
}

/// Templates for the condition input and control output of one else-if slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElseIfPins {
    pub condition: String,
    pub then: String,
}

/// How a node lowers into compiled steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum CompileDescriptor {
    /// The designated start node. Emits nothing.
    Entry { next: String },
    /// Emits one step built from config fields.
    Step {
        step_type: String,
        #[serde(default)]
        fields: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        next: Option<String>,
    },
    /// Emits one branch step with nested sequences.
    Branch {
        step_type: String,
        condition: String,
        then: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        else_if: Option<ElseIfPins>,
        #[serde(rename = "else")]
        otherwise: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        next: Option<String>,
    },
    /// A constant whose config field can be embedded as a condition leaf.
    Literal { field: String },
    /// A value-producing node with no lowering of its own.
    Data,
}

impl CompileDescriptor {
    /// The control output the walk continues from after this node's own step.
    pub fn primary_control_out(&self) -> Option<&str> {
        match self {
            CompileDescriptor::Entry { next } => Some(next.as_str()),
            CompileDescriptor::Step { next, .. } | CompileDescriptor::Branch { next, .. } => {
                next.as_deref()
            }
            CompileDescriptor::Literal { .. } | CompileDescriptor::Data => None,
        }
    }
}

/// A registry entry describing one node type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDefinition {
    pub node_type: String,
    pub label: String,
    pub category: String,
    #[serde(default)]
    pub config_schema: AHashMap<String, ConfigField>,
    #[serde(default)]
    pub pins: Vec<PinDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_pins: Option<DynamicPinTemplate>,
    pub compile: CompileDescriptor,
}

impl NodeDefinition {
    pub fn new(
        node_type: impl Into<String>,
        label: impl Into<String>,
        category: impl Into<String>,
        compile: CompileDescriptor,
    ) -> Self {
        Self {
            node_type: node_type.into(),
            label: label.into(),
            category: category.into(),
            config_schema: AHashMap::new(),
            pins: Vec::new(),
            dynamic_pins: None,
            compile,
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, field: ConfigField) -> Self {
        self.config_schema.insert(name.into(), field);
        self
    }

    pub fn with_pin(mut self, pin: PinDefinition) -> Self {
        self.pins.push(pin);
        self
    }

    pub fn with_dynamic_pins(mut self, template: DynamicPinTemplate) -> Self {
        self.dynamic_pins = Some(template);
        self
    }

    /// Finds a static (non-templated) pin by id.
    pub fn static_pin(&self, pin_id: &str) -> Option<&PinDefinition> {
        self.pins.iter().find(|p| p.id == pin_id)
    }
}
