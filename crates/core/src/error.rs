//! Error types for Vista.
//!
//! Callers see four categories: stale handles, out-of-range indices, invalid
//! arguments, and failures reported by the store itself. Store failures carry
//! a typed payload but are propagated without interpretation.

use crate::types::DataType;
use crate::row::RowId;
use thiserror::Error;

/// Result type alias for Vista operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors raised by collection and query operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A query, table or row handle is no longer valid.
    #[error("Invalid handle: {message}")]
    InvalidHandle {
        /// What was found to be invalid.
        message: String,
    },

    /// A positional argument fell outside `[0, size)`.
    #[error("Index {index} is out of bounds (size {size})")]
    IndexOutOfBounds {
        /// The requested index.
        index: usize,
        /// The size at the time of the request.
        size: usize,
    },

    /// An argument is not valid for the requested operation.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the problem.
        message: String,
    },

    /// A failure reported by the store.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failures originating inside the store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// A mutation was attempted outside a write transaction.
    #[error("Cannot modify the store outside a write transaction")]
    NotInTransaction,

    /// A write transaction is already open, or one blocks the operation.
    #[error("A write transaction is already in progress")]
    TransactionInProgress,

    /// Table not found.
    #[error("Table not found: {name}")]
    TableNotFound {
        /// Table name.
        name: String,
    },

    /// Table already exists.
    #[error("Table already exists: {name}")]
    TableExists {
        /// Table name.
        name: String,
    },

    /// Row not found.
    #[error("Row {row_id} not found in table {table}")]
    RowNotFound {
        /// Table name.
        table: String,
        /// Row identifier.
        row_id: RowId,
    },

    /// Wrong number of values for the table.
    #[error("Expected {expected} values, got {got}")]
    ColumnCount {
        /// Number of columns in the schema.
        expected: usize,
        /// Number of values supplied.
        got: usize,
    },

    /// Value type does not match the column type.
    #[error("Type mismatch on column {column}: expected {expected:?}, got {got:?}")]
    TypeMismatch {
        /// Column name.
        column: String,
        /// Declared column type.
        expected: DataType,
        /// Type of the supplied value.
        got: DataType,
    },

    /// Null written to a non-nullable column.
    #[error("Null constraint violation on column: {column}")]
    NullConstraint {
        /// Column name.
        column: String,
    },

    /// Invalid schema definition.
    #[error("Invalid schema: {message}")]
    InvalidSchema {
        /// Description of the problem.
        message: String,
    },
}

impl Error {
    /// Creates an invalid handle error.
    pub fn invalid_handle(message: impl Into<String>) -> Self {
        Error::InvalidHandle {
            message: message.into(),
        }
    }

    /// Creates an index out of bounds error.
    pub fn index_out_of_bounds(index: usize, size: usize) -> Self {
        Error::IndexOutOfBounds { index, size }
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument {
            message: message.into(),
        }
    }

    /// Returns true if this error originated in the store.
    pub fn is_store_error(&self) -> bool {
        matches!(self, Error::Store(_))
    }
}

impl StoreError {
    /// Creates a table not found error.
    pub fn table_not_found(name: impl Into<String>) -> Self {
        StoreError::TableNotFound { name: name.into() }
    }

    /// Creates a row not found error.
    pub fn row_not_found(table: impl Into<String>, row_id: RowId) -> Self {
        StoreError::RowNotFound {
            table: table.into(),
            row_id,
        }
    }

    /// Creates an invalid schema error.
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        StoreError::InvalidSchema {
            message: message.into(),
        }
    }
}
