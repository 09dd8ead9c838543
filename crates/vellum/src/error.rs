//! Error types for the Vellum library.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Vellum operations.
#[derive(Debug, Error)]
pub enum VellumError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error reading a spreadsheet workbook.
    #[error("Workbook error: {0}")]
    Excel(#[from] calamine::Error),

    /// File format not supported.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Empty file or no data to load.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// The store refused to delete or create a collection.
    #[error("Failed to provision collection '{collection}': {message}")]
    Provision { collection: String, message: String },

    /// A store call failed outside of provisioning.
    #[error("Store {operation} failed: {message}")]
    Store { operation: String, message: String },

    /// A store or query call exceeded its deadline.
    #[error("{operation} timed out")]
    Timeout { operation: String },

    /// Forwarding a question to the query capability failed.
    #[error("Query failed: {0}")]
    Query(String),

    /// No query session can be created or none exists yet.
    #[error("No query session: {0}")]
    NoSession(String),

    /// Several files in one batch derive the same collection name.
    #[error("Collection name '{collection}' is derived from more than one file: {}", .files.join(", "))]
    NameCollision {
        collection: String,
        files: Vec<String>,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification of failures, used in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The file could not be read as tabular data.
    Parse,
    /// The store rejected a collection delete or create.
    Provision,
    /// Rows were rejected during the bulk write.
    Load,
    /// A question could not be answered.
    Query,
    /// A store or query call ran out of time.
    Timeout,
    /// Two files in a batch map to one collection.
    NameCollision,
    /// Missing or invalid settings.
    Config,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ErrorKind::Parse => "parse",
            ErrorKind::Provision => "provision",
            ErrorKind::Load => "load",
            ErrorKind::Query => "query",
            ErrorKind::Timeout => "timeout",
            ErrorKind::NameCollision => "name_collision",
            ErrorKind::Config => "config",
        };
        f.write_str(label)
    }
}

impl VellumError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            VellumError::Io { .. }
            | VellumError::Csv(_)
            | VellumError::Excel(_)
            | VellumError::UnsupportedFormat(_)
            | VellumError::EmptyData(_) => ErrorKind::Parse,
            VellumError::Provision { .. } => ErrorKind::Provision,
            VellumError::Store { .. } | VellumError::Json(_) => ErrorKind::Load,
            VellumError::Timeout { .. } => ErrorKind::Timeout,
            VellumError::Query(_) | VellumError::NoSession(_) => ErrorKind::Query,
            VellumError::NameCollision { .. } => ErrorKind::NameCollision,
            VellumError::Config(_) => ErrorKind::Config,
        }
    }

    /// Map a transport error, keeping timeouts distinct.
    pub(crate) fn from_http(operation: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            VellumError::Timeout {
                operation: operation.to_string(),
            }
        } else {
            VellumError::Store {
                operation: operation.to_string(),
                message: err.to_string(),
            }
        }
    }
}

/// Result type alias for Vellum operations.
pub type Result<T> = std::result::Result<T, VellumError>;
