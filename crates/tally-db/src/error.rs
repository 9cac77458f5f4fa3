//! Error types for tally-db.

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

/// Error taxonomy surfaced across the dispatch boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    SchemaError,
    ValidationError,
    StorageError,
    DispatchError,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::SchemaError => "SchemaError",
            Self::ValidationError => "ValidationError",
            Self::StorageError => "StorageError",
            Self::DispatchError => "DispatchError",
        };
        f.write_str(name)
    }
}

/// Database error type for tally-db operations.
#[derive(Error, Diagnostic, Debug)]
pub enum DbError {
    #[error("Unknown column `{column}` on table `{table}`")]
    #[diagnostic(
        code(tally_db::schema::unknown_column),
        help("Check the column name against the table descriptor")
    )]
    UnknownColumn { table: String, column: String },

    #[error("Include cycle detected: {path}")]
    #[diagnostic(
        code(tally_db::schema::include_cycle),
        help("A table cannot be included again inside its own include chain")
    )]
    IncludeCycle { path: String },

    #[error("{0}")]
    #[diagnostic(code(tally_db::validation))]
    Validation(String),

    #[error("Invalid arguments: {0}")]
    #[diagnostic(
        code(tally_db::invalid_arguments),
        help("Arguments must be a JSON object matching the operation's options")
    )]
    InvalidArguments(#[from] serde_json::Error),

    #[error("dbClient model not found: {0}")]
    #[diagnostic(code(tally_db::dispatch::model))]
    UnknownModel(String),

    #[error("dbClient model or method not found: {model}.{method}")]
    #[diagnostic(code(tally_db::dispatch::method))]
    UnknownMethod { model: String, method: String },

    #[error("Database query failed: {0}")]
    #[diagnostic(
        code(tally_db::query),
        help("The store rejected the statement; the mutation may have been partially applied")
    )]
    Storage(#[from] rusqlite::Error),

    #[error("Database task failed: {0}")]
    #[diagnostic(code(tally_db::task))]
    Task(#[from] tokio::task::JoinError),

    #[error("Thread lock poison error")]
    #[diagnostic(
        code(tally_db::poison),
        help("This is an internal error, please report it")
    )]
    PoisonError,

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] tally_config::ConfigError),

    #[error("IO error: {0}")]
    #[diagnostic(code(tally_db::io), help("Check file permissions and disk space"))]
    IoError(#[from] std::io::Error),
}

impl DbError {
    pub(crate) fn unknown_column(table: &str, column: &str) -> Self {
        Self::UnknownColumn {
            table: table.to_string(),
            column: column.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownColumn { .. } | Self::IncludeCycle { .. } => ErrorKind::SchemaError,
            Self::Validation(_) | Self::InvalidArguments(_) => ErrorKind::ValidationError,
            Self::UnknownModel(_) | Self::UnknownMethod { .. } => ErrorKind::DispatchError,
            Self::Storage(_)
            | Self::Task(_)
            | Self::PoisonError
            | Self::Config(_)
            | Self::IoError(_) => ErrorKind::StorageError,
        }
    }
}

/// Result type alias for tally-db operations.
pub type Result<T> = std::result::Result<T, DbError>;
