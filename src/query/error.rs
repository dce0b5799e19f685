//! Error taxonomy for the structured query engine.
//!
//! Every variant is fatal for the request that raised it: the engine never
//! executes a partially-compiled query and never returns partial results.
//! Store failures propagate unwrapped.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("unknown entity type: {0}")]
    UnknownEntityType(String),

    #[error("cannot resolve field path '{path}': unknown segment '{segment}'")]
    UnknownField { path: String, segment: String },

    #[error("value for field '{field}' is not a valid {expected}: {got}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        got: String,
    },

    #[error("operator {operator} cannot apply to field '{field}' of type {field_type}")]
    OperatorFieldMismatch {
        field: String,
        operator: &'static str,
        field_type: &'static str,
    },

    #[error("filter on field '{field}' requires a value for operator {operator}")]
    MissingValue {
        field: String,
        operator: &'static str,
    },

    #[error("SQLite error: {0}")]
    Store(#[from] rusqlite::Error),
}
