//! Database error types
//!
//! This module defines the errors raised by the PostgreSQL gateway and their
//! translation into the `PortError` type the domain understands.

use core_kernel::PortError;
use thiserror::Error;

/// SQLSTATE raised by `RAISE EXCEPTION` inside PL/pgSQL
pub const RAISE_EXCEPTION_SQLSTATE: &str = "P0001";

/// Errors that can occur during database operations
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to establish a database connection
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Connection pool exhausted
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Entity not found in database
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// Unique constraint violation
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// A stored routine raised an application error
    #[error("Routine raised: {0}")]
    RaisedException(String),

    /// A row could not be decoded into the expected shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// Transaction could not be started or finished
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),
}

impl DatabaseError {
    /// Checks if this error indicates a record was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound(_))
    }

    /// Checks if this error is a constraint violation
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            DatabaseError::DuplicateEntry(_)
                | DatabaseError::ForeignKeyViolation(_)
                | DatabaseError::ConstraintViolation(_)
        )
    }

    /// Checks if this error is a connection-related issue
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            DatabaseError::ConnectionFailed(_) | DatabaseError::PoolExhausted
        )
    }

    /// Wraps a failure to begin, commit or roll back
    pub fn transaction(error: sqlx::Error) -> Self {
        match DatabaseError::from(&error) {
            classified if classified.is_connection_error() => classified,
            _ => DatabaseError::TransactionFailed(error.to_string()),
        }
    }
}

/// Maps SQLx errors to DatabaseError variants based on the PostgreSQL error code
///
/// See <https://www.postgresql.org/docs/current/errcodes-appendix.html>
impl From<&sqlx::Error> for DatabaseError {
    fn from(error: &sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Record not found".to_string()),
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted,
            sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                DatabaseError::ConnectionFailed(error.to_string())
            }
            sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_) => DatabaseError::Decode(error.to_string()),
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.code().as_deref() {
                    Some("23505") => DatabaseError::DuplicateEntry(message),
                    Some("23503") => DatabaseError::ForeignKeyViolation(message),
                    Some("23514") => DatabaseError::ConstraintViolation(message),
                    Some(RAISE_EXCEPTION_SQLSTATE) => DatabaseError::RaisedException(message),
                    Some(code) if code.starts_with("08") => {
                        DatabaseError::ConnectionFailed(message)
                    }
                    _ => DatabaseError::QueryFailed(message),
                }
            }
            _ => DatabaseError::QueryFailed(error.to_string()),
        }
    }
}

impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        DatabaseError::from(&error)
    }
}

impl From<DatabaseError> for PortError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::ConnectionFailed(message) => PortError::connection(message),
            DatabaseError::PoolExhausted => PortError::Connection {
                message: "connection pool exhausted".to_string(),
                source: Some(Box::new(error)),
            },
            DatabaseError::NotFound(message) => PortError::not_found("Record", message),
            DatabaseError::DuplicateEntry(message)
            | DatabaseError::ForeignKeyViolation(message)
            | DatabaseError::ConstraintViolation(message) => PortError::Conflict { message },
            DatabaseError::Decode(message) => PortError::Transformation { message },
            other => PortError::internal_with_source("Database operation failed", other),
        }
    }
}
