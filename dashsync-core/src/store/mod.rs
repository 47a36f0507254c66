//! Durable storage of the model.
//!
//! [`KvBackend`] is the key-value boundary (string values, plus a stream of
//! changes made by other instances). [`ModelStore`] layers the model's
//! serialization on top and never lets a backend failure escape as an error
//! on the automatic paths.

mod file;
mod memory;
mod transfer;

pub use file::FileStorage;
pub use memory::{MemoryBackend, MemoryStorage};
pub use transfer::{ExportFile, FilePicker, PathPicker, export_to_file, import_from_file};

use std::path::PathBuf;

use async_trait::async_trait;
use log::{error, info, warn};
use tokio::sync::mpsc;

use crate::config::DashsyncConfig;
use crate::error::{DashError, DashResult};
use crate::model::{Event, Model};

/// A value written under `key` by another instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    /// `None` when the key was removed.
    pub new_value: Option<String>,
}

#[async_trait]
pub trait KvBackend: Send + Sync + 'static {
    async fn get(&self, key: &str) -> DashResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> DashResult<()>;

    /// Changes made by other instances. Writes made through this handle are
    /// never reported back to it.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<StorageEvent>;
}

/// Where the first-run model comes from.
#[derive(Debug, Clone)]
pub enum DefaultSource {
    /// The dashboard data file shipped with the crate.
    Bundled,
    File(PathBuf),
}

const BUNDLED_DEFAULT: &str = include_str!("../../data/dashboard_data.json");

/// Result of reading the events side channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventsRead {
    Absent,
    Found(Vec<Event>),
    Malformed,
}

pub struct ModelStore<B> {
    backend: B,
    key: String,
    events_key: String,
    export_filename: String,
    default_source: DefaultSource,
}

impl<B: KvBackend> ModelStore<B> {
    pub fn new(backend: B, config: &DashsyncConfig) -> Self {
        ModelStore {
            backend,
            key: config.storage_key.clone(),
            events_key: config.events_key.clone(),
            export_filename: config.export_filename.clone(),
            default_source: config
                .default_data
                .clone()
                .map(DefaultSource::File)
                .unwrap_or(DefaultSource::Bundled),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The persisted model, or `None` when nothing usable is stored.
    /// A malformed payload is logged and treated as absent.
    pub async fn load(&self) -> Option<Model> {
        match self.backend.get(&self.key).await {
            Ok(Some(raw)) => match parse_model(&raw) {
                Ok(model) => {
                    info!("Loaded dashboard data from '{}'", self.key);
                    Some(model)
                }
                Err(e) => {
                    error!("Stored dashboard data under '{}' is unreadable: {}", self.key, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                error!("Could not read '{}' from storage: {}", self.key, e);
                None
            }
        }
    }

    /// The persisted model, distinguishing "nothing stored" from a payload
    /// that does not parse.
    pub async fn load_required(&self) -> DashResult<Model> {
        match self.backend.get(&self.key).await? {
            Some(raw) => parse_model(&raw),
            None => Err(DashError::NotFound(self.key.clone())),
        }
    }

    /// The first-run model. Only consulted when storage is empty.
    pub async fn load_default(&self) -> DashResult<Model> {
        let raw = match &self.default_source {
            DefaultSource::Bundled => BUNDLED_DEFAULT.to_string(),
            DefaultSource::File(path) => tokio::fs::read_to_string(path).await.map_err(|e| {
                DashError::Storage(format!(
                    "could not read default data {}: {}",
                    path.display(),
                    e
                ))
            })?,
        };
        parse_model(&raw)
    }

    /// Write the model. Failures are logged and reported as `false`.
    pub async fn persist(&self, model: &Model) -> bool {
        let payload = match serde_json::to_string(model) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Could not serialize dashboard data: {}", e);
                return false;
            }
        };
        match self.backend.set(&self.key, &payload).await {
            Ok(()) => true,
            Err(e) => {
                error!("Could not save dashboard data: {}", e);
                false
            }
        }
    }

    pub async fn load_events(&self) -> EventsRead {
        match self.backend.get(&self.events_key).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Event>>(&raw) {
                Ok(events) => EventsRead::Found(events),
                Err(e) => {
                    error!("Stored events under '{}' are unreadable: {}", self.events_key, e);
                    EventsRead::Malformed
                }
            },
            Ok(None) => EventsRead::Absent,
            Err(e) => {
                warn!("Could not read events from storage: {}", e);
                EventsRead::Absent
            }
        }
    }

    pub async fn store_events(&self, events: &[Event]) -> bool {
        let payload = match serde_json::to_string(events) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Could not serialize events: {}", e);
                return false;
            }
        };
        match self.backend.set(&self.events_key, &payload).await {
            Ok(()) => true,
            Err(e) => {
                error!("Could not save events: {}", e);
                false
            }
        }
    }

    pub fn export(&self, model: &Model) -> DashResult<ExportFile> {
        export_to_file(model, &self.export_filename)
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<StorageEvent> {
        self.backend.subscribe()
    }
}

/// Parse a stored or transported payload. The root must be a JSON object.
pub fn parse_model(raw: &str) -> DashResult<Model> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    if !value.is_object() {
        return Err(DashError::Parse(
            "dashboard data must be a JSON object".to_string(),
        ));
    }
    Ok(serde_json::from_value(value)?)
}
