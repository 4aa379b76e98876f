use crate::model::{CardId, NodeId};
use crate::registry::{Arity, Domain, Operator};
use thiserror::Error;

/// Errors raised by the tree editor. A rejected edit never changes the input tree.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditError {
    #[error("Node '{0}' was not found in the condition tree")]
    NotFound(NodeId),

    #[error("Node '{0}' is not a group and cannot hold children")]
    NotAGroup(NodeId),

    #[error("Patch kind does not match node '{0}' (leaf patch on a group or vice versa)")]
    KindMismatch(NodeId),

    #[error("Operator '{operator}' expects {expected} value(s): {reason}")]
    InvalidArity {
        operator: Operator,
        expected: Arity,
        reason: String,
    },

    #[error("Field '{field}' is not known to the operator registry for domain '{domain}'")]
    InvalidField { domain: Domain, field: String },

    #[error("Operator '{operator}' is not valid for field '{field}' in domain '{domain}'")]
    InvalidOperator {
        domain: Domain,
        field: String,
        operator: Operator,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Nesting depth {depth} exceeds the editor limit of {max_depth}")]
    DepthExceeded { depth: usize, max_depth: usize },

    #[error("Index {index} is out of bounds for a group with {len} children")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Node '{node_id}' cannot be moved into its own subtree")]
    InvalidMove { node_id: NodeId },

    #[error("The root group cannot be removed")]
    CannotRemoveRoot,

    #[error("The root group cannot be duplicated, moved or unwrapped")]
    RootImmutable,
}

/// Errors that can occur while compiling a tree or parsing compiled conditions back.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Failed to parse hook JSON: {0}")]
    JsonParseError(String),

    #[error("Condition '{node_id}' has no field selected")]
    MissingField { node_id: NodeId },

    #[error("Condition '{node_id}' references field '{field}', unknown for domain '{domain}'")]
    InvalidField {
        node_id: NodeId,
        domain: Domain,
        field: String,
    },

    #[error("Condition '{node_id}' has a value count that does not fit operator '{operator}': {message}")]
    InvalidArity {
        node_id: String,
        operator: Operator,
        message: String,
    },

    #[error("Compile inconsistency in condition '{node_id}': {message}")]
    Inconsistency { node_id: String, message: String },

    #[error("Malformed condition grammar: {0}")]
    MalformedGrammar(String),
}

/// Errors from the operator registry lookups.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown field '{field}' for domain '{domain}'")]
    UnknownField { domain: Domain, field: String },

    #[error("Unknown operator '{0}'")]
    UnknownOperator(String),

    #[error("Field '{field}' has no component named '{component}'")]
    UnsupportedComponent { field: String, component: String },
}

impl From<RegistryError> for EditError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownField { domain, field } => EditError::InvalidField { domain, field },
            other => EditError::InvalidParameter(other.to_string()),
        }
    }
}

/// Errors raised by the card sequence operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CardError {
    #[error("Card '{0}' was not found")]
    NotFound(CardId),

    #[error("A card with id '{0}' already exists")]
    DuplicateId(CardId),
}

/// Errors raised while evaluating a tree against a mock patient record.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("Condition '{0}' is incomplete and cannot be evaluated")]
    IncompleteLeaf(NodeId),

    #[error("Condition '{node_id}' expected a {expected} value")]
    TypeMismatch { node_id: NodeId, expected: String },
}

/// An opaque error returned by the external hook-execution service.
///
/// The core never interprets these; they are handed back to the caller verbatim.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ExecutionError {
    pub message: String,
    pub status: Option<u16>,
    pub details: Option<serde_json::Value>,
}

impl ExecutionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            details: None,
        }
    }
}

/// Errors surfaced by `execution::test_hook`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TestHookError {
    #[error("Hook definition is not a valid compiled definition: {0}")]
    NotCompiled(#[from] CompileError),

    #[error("A patient id is required to test a hook")]
    MissingPatient,

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

/// Errors from the domain catalog search boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Search term must be at least {min_chars} characters")]
    TermTooShort { min_chars: usize },

    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised while loading builder configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    Parse(#[from] serde_json::Error),
}
