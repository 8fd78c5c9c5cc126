//! Error types for the sieve crate.
//!
//! Only setup paths fail: building a record type, loading configuration, or
//! binding a compiler to an emitter. Compiling a filter never fails.

use thiserror::Error;

/// Errors raised while declaring record types or preparing a compiler.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An `op` or `keyword` tag value outside the operator vocabulary.
    #[error("unknown operator tag '{tag}' on field '{field}'")]
    UnknownOperator { field: String, tag: String },

    /// The field's match mode cannot be expressed by the target backend.
    #[error("field '{field}': operator '{op}' is not supported by the {backend} emitter")]
    UnsupportedMode {
        field: String,
        op: &'static str,
        backend: &'static str,
    },

    /// The backend has no OR combinator but several keyword fields were declared.
    #[error("record type '{record}' declares {count} keyword fields; the {backend} emitter supports at most one")]
    UnsupportedKeywordGroup {
        record: String,
        count: usize,
        backend: &'static str,
    },

    /// Two fields of one record type share an identifier.
    #[error("record type '{record}' declares field '{field}' more than once")]
    DuplicateField { record: String, field: String },

    /// More than one field is marked as the identity field.
    #[error("record type '{record}' marks both '{first}' and '{second}' as identity")]
    DuplicateIdentity {
        record: String,
        first: String,
        second: String,
    },

    /// A configuration or schema document failed to parse.
    #[error("failed to parse {format} configuration: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::Parse {
            format: "yaml",
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse {
            format: "json",
            message: err.to_string(),
        }
    }
}

/// Result type for sieve setup operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
