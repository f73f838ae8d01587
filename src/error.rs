// Typed error taxonomy for the portal and code-graph engine

use crate::portal::ColumnType;

/// Errors surfaced by the core engine.
///
/// Per-file parse failures during a directory run are collected into the run
/// summary instead of propagating; everything else reaches the caller as one
/// of these variants and is never retried by the core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed mem:// URI '{uri}': {reason}")]
    MalformedUri { uri: String, reason: String },

    #[error("portal '{namespace}/{portal_id}' is in use")]
    PortalInUse { namespace: String, portal_id: String },

    #[error("table '{0}' not found")]
    TableNotFound(String),

    #[error("schema conflict on field '{field}': column is {existing}, incoming value is {incoming}")]
    SchemaConflict {
        field: String,
        existing: ColumnType,
        incoming: ColumnType,
    },

    #[error("query syntax error: {0}")]
    QuerySyntax(String),

    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("parse error in {file} at {line}:{column}: {message}")]
    Parse {
        file: String,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("feature '{0}' is not enabled for this account")]
    FeatureDisabled(String),

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<r2d2::Error> for Error {
    fn from(err: r2d2::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
