//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations of the tree and table contracts.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("malformed clause '{clause}': {reason}")]
    MalformedClause { clause: String, reason: String },

    #[error("malformed prediction '{value}': expected '<range tag> <description>'")]
    MalformedPrediction { value: String },

    /// A terminal class has no palette entry. This is a configuration mismatch
    /// between the classes the service produces and the known palette.
    #[error("no palette color for class '{key}'")]
    UnmappedClass { key: String },

    #[error("missing column '{column}' in {table} table")]
    MissingColumn { table: String, column: String },

    #[error("non-numeric value '{value}' in column '{column}'")]
    NotNumeric { column: String, value: String },

    #[error("invalid date '{value}' in column '{column}'")]
    InvalidDate { column: String, value: String },

    #[error("empty {0} table")]
    EmptyTable(String),

    #[error("unknown condition operator: {0}")]
    UnknownOperator(String),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
