//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias. Variants cover
//! graph configuration, name resolution, dynamic type errors, script syntax,
//! scheduling, node execution failures, IO, and generic errors.
use thiserror::Error;

use crate::script::parser::ParseError;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown node type '{type_name}'")]
    UnknownNodeType { type_name: String },

    #[error("unknown operation '{name}'")]
    UnknownOperation { name: String },

    #[error("node '{node}' is missing required argument '{argument}'")]
    MissingArgument { node: String, argument: String },

    #[error("invalid value for argument '{argument}': {message}")]
    InvalidArgument { argument: String, message: String },

    #[error("unsupported link: node '{node}' ({node_type}) has no {direction} interface '{interface}'")]
    UnsupportedNodeLink {
        node: String,
        node_type: String,
        direction: &'static str,
        interface: String,
    },

    #[error("edge from '{source_node}' to '{target_node}' already exists")]
    EdgeExists {
        source_node: String,
        target_node: String,
    },

    #[error("{what} '{name}' not found")]
    NotFound { what: &'static str, name: String },

    #[error("context '{parent}' already has a child named '{name}'")]
    ContextCollision { parent: String, name: String },

    #[error("undefined operator '{operator}' for types {lhs} and {rhs}")]
    UndefinedOperator {
        operator: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },

    #[error("undefined operator '{operator}' for type {operand}")]
    UndefinedUnaryOperator {
        operator: &'static str,
        operand: &'static str,
    },

    #[error("callable '{name}' has no body")]
    UnsetCallable { name: String },

    #[error("expected {expected} but found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("evaluation error: {0}")]
    Evaluation(String),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("scheduling error: {0}")]
    Schedule(String),

    #[error("node '{node}' failed: {source}")]
    NodeFailed {
        node: String,
        #[source]
        source: Box<Error>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub(crate) fn not_found(what: &'static str, name: impl Into<String>) -> Self {
        Error::NotFound {
            what,
            name: name.into(),
        }
    }
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Other(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Other(value.to_owned())
    }
}
