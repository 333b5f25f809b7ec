//! Error types for the catalog loader

use std::path::PathBuf;
use thiserror::Error;

/// Result type for loader operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Fatal ingestion failures.
///
/// Unrecognized course codes, unknown pathways and unresolved course
/// references are not errors; they are skipped where they occur.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Input file could not be read
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Input file is not valid JSON or does not match its detected shape
    #[error("malformed JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Store failure other than the expected uniqueness violation
    #[error("store error during {operation}: {source}")]
    Store {
        operation: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Invalid loader configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl IngestError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IngestError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        IngestError::Json {
            path: path.into(),
            source,
        }
    }

    pub fn store(operation: impl Into<String>, source: rusqlite::Error) -> Self {
        IngestError::Store {
            operation: operation.into(),
            source,
        }
    }

    /// True for failures caused by the input files or configuration
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            IngestError::Io { .. } | IngestError::Json { .. } | IngestError::Config(_)
        )
    }
}

/// Attach an operation label to a rusqlite result
pub(crate) trait StoreContext<T> {
    fn store_context<F, S>(self, operation: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> StoreContext<T> for std::result::Result<T, rusqlite::Error> {
    fn store_context<F, S>(self, operation: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| IngestError::store(operation(), e))
    }
}
