//! Export/import of the model as a standalone JSON file.

use std::path::PathBuf;

use async_trait::async_trait;

use super::parse_model;
use crate::error::{DashError, DashResult};
use crate::model::Model;

/// A serialized model ready to be saved by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    /// Suggested file name.
    pub filename: String,
    /// Pretty-printed UTF-8 JSON.
    pub bytes: Vec<u8>,
}

pub fn export_to_file(model: &Model, filename: &str) -> DashResult<ExportFile> {
    let bytes =
        serde_json::to_vec_pretty(model).map_err(|e| DashError::Serialization(e.to_string()))?;
    Ok(ExportFile {
        filename: filename.to_string(),
        bytes,
    })
}

/// Parse an exported file. Lists missing from the file are read as empty.
pub fn import_from_file(bytes: &[u8]) -> DashResult<Model> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| DashError::Parse(format!("file is not valid UTF-8: {e}")))?;
    parse_model(text)
}

/// Lets the user choose a file to import.
///
/// `Ok(None)` means the selection finished without a file. A picker whose
/// user simply walks away may never resolve; callers wait on it like any
/// other pending operation.
#[async_trait]
pub trait FilePicker: Send + Sync {
    async fn pick(&self) -> DashResult<Option<Vec<u8>>>;
}

/// Picker for a path already chosen on the command line.
pub struct PathPicker(pub PathBuf);

#[async_trait]
impl FilePicker for PathPicker {
    async fn pick(&self) -> DashResult<Option<Vec<u8>>> {
        match tokio::fs::read(&self.0).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
