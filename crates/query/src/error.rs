//! Error types for the query engine.

use std::time::Duration;

use thiserror::Error;

/// Errors raised while validating and compiling a request, before any backend I/O.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// Entity is not part of the schema.
    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    /// Field does not exist on the entity.
    #[error("Unknown field '{field}' on {entity}")]
    UnknownField { entity: String, field: String },

    /// Relation does not exist on the entity.
    #[error("Unknown relation '{relation}' on {entity}")]
    UnknownRelation { entity: String, relation: String },

    /// Operator is not defined for the field's kind.
    #[error("Operator '{operator}' is not supported on field '{field}' of type {kind}")]
    UnsupportedOperator {
        field: String,
        operator: String,
        kind: String,
    },

    /// Operand does not fit the operator's arity or the field's kind.
    #[error("Invalid operand for '{field}_{operator}': {reason}")]
    InvalidOperand {
        field: String,
        operator: String,
        reason: String,
    },

    /// Enum literal outside the enum's value set.
    #[error("Unknown value '{value}' for enum {enum_name} on field '{field}'")]
    UnknownEnumValue {
        field: String,
        enum_name: String,
        value: String,
    },

    /// Where input is not shaped like a filter object.
    #[error("Invalid where input: {0}")]
    InvalidWhereInput(String),

    /// Ordering was requested without any keys.
    #[error("orderBy for {0} must contain at least one key")]
    EmptyOrder(String),

    /// Order token is not `field_ASC`/`field_DESC` with an optional nulls suffix.
    #[error("Invalid order token: {0}")]
    InvalidOrderToken(String),

    /// Field cannot be used as a sort key.
    #[error("Field '{field}' of type {kind} cannot be used for ordering")]
    UnorderableField { field: String, kind: String },

    /// The same field appears twice in an ordering.
    #[error("Field '{0}' appears more than once in orderBy")]
    DuplicateOrderField(String),
}

/// Errors raised by page size and cursor handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaginationError {
    /// Page size was zero or negative.
    #[error("Invalid page size: {0} (must be positive)")]
    InvalidPageSize(i64),

    /// Page size exceeded the configured maximum under the reject policy.
    #[error("Page size {requested} exceeds maximum of {max}")]
    PageSizeExceeded { requested: i64, max: usize },

    /// Negative offset in an offset-style query.
    #[error("Invalid offset: {0} (must not be negative)")]
    InvalidOffset(i64),

    /// Cursor was produced for a different ordering, filter or format version.
    #[error("Stale cursor: {0}")]
    StaleCursor(String),

    /// Cursor could not be decoded.
    #[error("Malformed cursor: {0}")]
    MalformedCursor(String),
}

/// Failures reported by the storage backend. Passed through unchanged.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Backend call exceeded the configured deadline.
    #[error("Backend call timed out after {0:?}")]
    Timeout(Duration),

    /// Backend could not be reached.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// Write rejected by a uniqueness constraint.
    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    /// Any other backend failure, with the original cause attached.
    #[error("{message}")]
    Other {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl BackendError {
    /// Wrap an arbitrary backend error, keeping it as the source.
    pub fn other<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        BackendError::Other {
            message: message.into(),
            source: Box::new(source),
        }
    }
}

/// High-level classification of a [`QueryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The request itself is invalid (filter, order, enum literals).
    Compile,
    /// Page size or cursor problems.
    Pagination,
    /// Storage backend failure.
    Backend,
    /// Malformed input data.
    Parse,
}

/// Errors that can occur when running a query.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Request failed validation.
    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    /// Pagination arguments were rejected.
    #[error("Pagination error: {0}")]
    Pagination(#[from] PaginationError),

    /// Storage backend failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Failed to parse input data.
    #[error("Failed to parse input: {0}")]
    Parse(String),
}

impl QueryError {
    /// Classify the error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            QueryError::Compile(_) => ErrorCategory::Compile,
            QueryError::Pagination(_) => ErrorCategory::Pagination,
            QueryError::Backend(_) => ErrorCategory::Backend,
            QueryError::Parse(_) => ErrorCategory::Parse,
        }
    }

    /// Whether the caller may retry the same request unchanged.
    ///
    /// The engine never retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            QueryError::Backend(BackendError::Timeout(_) | BackendError::Unavailable(_))
        )
    }
}

/// Result type alias for query operations.
pub type Result<T> = std::result::Result<T, QueryError>;
