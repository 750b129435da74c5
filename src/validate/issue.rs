use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Error,
    Warn,
    Info,
}

/// Stable issue codes. Editors key UI behavior off these strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    Ok,
    UnknownNode,
    RequiredPin,
    EdgeNodeMissing,
    EdgePinMissing,
    PinKindMismatch,
    EdgeKindIncorrect,
    DataTypeMismatch,
    MissingStart,
    StartUnconnected,
    DuplicateNodeId,
    DuplicateEdgeId,
    MultipleStart,
    EdgeDirection,
    TargetOverCapacity,
    ControlCycle,
    InvalidConfig,
    UnknownConfigField,
    UnreachableNode,
}

impl IssueCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCode::Ok => "OK",
            IssueCode::UnknownNode => "UNKNOWN_NODE",
            IssueCode::RequiredPin => "REQUIRED_PIN",
            IssueCode::EdgeNodeMissing => "EDGE_NODE_MISSING",
            IssueCode::EdgePinMissing => "EDGE_PIN_MISSING",
            IssueCode::PinKindMismatch => "PIN_KIND_MISMATCH",
            IssueCode::EdgeKindIncorrect => "EDGE_KIND_INCORRECT",
            IssueCode::DataTypeMismatch => "DATA_TYPE_MISMATCH",
            IssueCode::MissingStart => "MISSING_START",
            IssueCode::StartUnconnected => "START_UNCONNECTED",
            IssueCode::DuplicateNodeId => "DUPLICATE_NODE_ID",
            IssueCode::DuplicateEdgeId => "DUPLICATE_EDGE_ID",
            IssueCode::MultipleStart => "MULTIPLE_START",
            IssueCode::EdgeDirection => "EDGE_DIRECTION",
            IssueCode::TargetOverCapacity => "TARGET_OVER_CAPACITY",
            IssueCode::ControlCycle => "CONTROL_CYCLE",
            IssueCode::InvalidConfig => "INVALID_CONFIG",
            IssueCode::UnknownConfigField => "UNKNOWN_CONFIG_FIELD",
            IssueCode::UnreachableNode => "UNREACHABLE_NODE",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where in the graph an issue should be highlighted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum IssuePath {
    Node { node_id: String },
    Pin { node_id: String, pin_id: String },
    Edge { edge_id: String },
}

impl IssuePath {
    pub fn node(node_id: impl Into<String>) -> Self {
        IssuePath::Node {
            node_id: node_id.into(),
        }
    }

    pub fn pin(node_id: impl Into<String>, pin_id: impl Into<String>) -> Self {
        IssuePath::Pin {
            node_id: node_id.into(),
            pin_id: pin_id.into(),
        }
    }

    pub fn edge(edge_id: impl Into<String>) -> Self {
        IssuePath::Edge {
            edge_id: edge_id.into(),
        }
    }
}

impl fmt::Display for IssuePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssuePath::Node { node_id } => write!(f, "node {}", node_id),
            IssuePath::Pin { node_id, pin_id } => write!(f, "pin {}.{}", node_id, pin_id),
            IssuePath::Edge { edge_id } => write!(f, "edge {}", edge_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub code: IssueCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<IssuePath>,
}

impl ValidationIssue {
    pub fn new(severity: Severity, code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            path: None,
        }
    }

    pub fn error(code: IssueCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, message)
    }

    pub fn warn(code: IssueCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Warn, code, message)
    }

    pub fn info(code: IssueCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, code, message)
    }

    pub fn at(mut self, path: IssuePath) -> Self {
        self.path = Some(path);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warn => "warning",
            Severity::Info => "info",
        };
        write!(f, "{}[{}]: {}", severity, self.code, self.message)?;
        if let Some(path) = &self.path {
            write!(f, " (at {})", path)?;
        }
        Ok(())
    }
}

/// Whether any issue has ERROR severity.
pub fn has_errors(issues: &[ValidationIssue]) -> bool {
    issues.iter().any(ValidationIssue::is_error)
}
