use crate::connect::RejectCode;
use thiserror::Error;

/// Defects in the node catalog itself. These cannot be fixed by editing a graph,
/// so they are returned immediately and propagated by every operation that
/// touches the offending definition.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Failed to parse registry JSON: {0}")]
    JsonParseError(String),

    #[error("Failed to read registry file '{path}': {message}")]
    Io { path: String, message: String },

    #[error("Node type '{0}' is defined more than once")]
    DuplicateNodeType(String),

    #[error("Node type '{node_type}' materializes pin id '{pin_id}' more than once")]
    DuplicatePinId { node_type: String, pin_id: String },

    #[error(
        "Node type '{node_type}' repeats pins by config field '{field}', which is not in its config schema"
    )]
    UnknownCountField { node_type: String, field: String },

    #[error("Node type '{node_type}' has an invalid compile descriptor: {message}")]
    InvalidDescriptor { node_type: String, message: String },

    #[error("Start node type '{0}' is not registered with an entry descriptor")]
    MissingStartType(String),
}

/// Errors that can occur while materializing the pins of one node instance.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MaterializeError {
    #[error("Node type '{0}' is not registered")]
    UnknownNodeType(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// The outcome of a refused connection attempt.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConnectError {
    /// A user-correctable refusal. Exactly one reason is reported per attempt.
    #[error("Connection rejected ({code}): {reason}")]
    Rejected { code: RejectCode, reason: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl ConnectError {
    pub(crate) fn rejected(code: RejectCode, reason: impl Into<String>) -> Self {
        ConnectError::Rejected {
            code,
            reason: reason.into(),
        }
    }

    /// The rejection code, or `None` for registry defects.
    pub fn code(&self) -> Option<RejectCode> {
        match self {
            ConnectError::Rejected { code, .. } => Some(*code),
            ConnectError::Registry(_) => None,
        }
    }
}

/// Errors that can occur when converting an editor-specific format into a `Graph`.
#[derive(Error, Debug, Clone)]
pub enum GraphConversionError {
    #[error("Invalid editor data: {0}")]
    ValidationError(String),
}
