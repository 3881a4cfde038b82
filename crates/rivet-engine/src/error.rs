//! Error types for the engine.

use thiserror::Error;

/// Errors loading `rivet.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    ValidationError(String),
}

/// Failures while generating code for one member, type or union family.
///
/// These never abort a pass; the pipeline turns them into internal-error
/// diagnostics scoped to the failing unit.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenError {
    #[error("Cannot determine the type of '{member}'")]
    UnknownMemberType { member: String },

    #[error("Type '{0}' is not part of the compilation")]
    UnknownType(String),

    #[error("Union family '{family}' has no valid layout: {reason}")]
    InvalidFamily { family: String, reason: String },

    #[error("Generation cancelled")]
    Cancelled,

    #[error("{0}")]
    Internal(String),
}

/// Failures while editing a compiled module.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WeaveError {
    #[error("Type '{0}' not found in module")]
    TypeNotFound(String),

    #[error("Method '{type_name}::{method}' not found")]
    MethodNotFound { type_name: String, method: String },

    #[error("Property '{type_name}::{property}' not found")]
    PropertyNotFound { type_name: String, property: String },

    #[error("Property '{type_name}::{property}' has no {accessor}")]
    MissingAccessor {
        type_name: String,
        property: String,
        accessor: &'static str,
    },

    #[error("Field '{type_name}::{field}' not found")]
    FieldNotFound { type_name: String, field: String },

    #[error("{0}")]
    Internal(String),
}

/// Result alias for generation.
pub type GenResult<T> = Result<T, GenError>;

/// Result alias for weaving.
pub type WeaveResult<T> = Result<T, WeaveError>;
