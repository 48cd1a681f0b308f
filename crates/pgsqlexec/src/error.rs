//! Error types for pgsqlexec

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pgsqlexec operations
pub type ExecResult<T> = Result<T, ExecError>;

/// Error types for accumulating and executing SQL
#[derive(Debug, Error)]
pub enum ExecError {
    /// Misuse of the executor: bad construction arguments, missing output
    /// directory, unknown path kind, or a rejected CSV export.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error reported by the database driver, passed through untouched
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Rows were requested but the last execution produced no result set
    #[error("no results to fetch")]
    NoResults,

    /// Reading a SQL file or creating a CSV file failed
    #[error("File error on '{}': {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing exported data failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),
}

impl ExecError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a file error for a specific path
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }

    /// Check if this is a configuration error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Check if this error came from the database driver
    pub fn is_query(&self) -> bool {
        matches!(self, Self::Query(_))
    }

    /// The server-side error, if the driver received one.
    pub fn as_db_error(&self) -> Option<&tokio_postgres::error::DbError> {
        match self {
            Self::Query(err) => err.as_db_error(),
            _ => None,
        }
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for ExecError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
