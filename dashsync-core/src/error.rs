//! Error types for the dashsync engine.

use thiserror::Error;

/// Errors that can occur in dashsync operations.
#[derive(Error, Debug)]
pub enum DashError {
    #[error("No persisted data under key '{0}'")]
    NotFound(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No file selected")]
    NoFileSelected,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for DashError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            DashError::Serialization(err.to_string())
        } else {
            DashError::Parse(err.to_string())
        }
    }
}

/// Result type alias for dashsync operations.
pub type DashResult<T> = Result<T, DashError>;
