//! Error types for the SQLite score sink

use thiserror::Error;

use triptych_core::CoreError;

/// SQLite score sink error type
#[derive(Error, Debug)]
pub enum SqliteError {
    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(String),

    /// Schema/migration error
    #[error("Schema error: {0}")]
    Schema(String),

    /// Underlying rusqlite error
    #[error("SQLite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
}

/// Result type for score sink operations
pub type SqliteResult<T> = Result<T, SqliteError>;

/// The pipeline sees every sink failure as a storage error; the variant
/// detail survives in the message.
impl From<SqliteError> for CoreError {
    fn from(err: SqliteError) -> Self {
        CoreError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_into_storage_error() {
        let err: CoreError = SqliteError::Query("no such table: scores".to_string()).into();
        match err {
            CoreError::Storage(msg) => assert!(msg.contains("no such table")),
            other => panic!("expected storage error, got {:?}", other),
        }
    }

    #[test]
    fn storage_conversion_is_retryable() {
        let err: CoreError = SqliteError::Connection("database is locked".to_string()).into();
        assert!(err.is_retryable());
    }
}
