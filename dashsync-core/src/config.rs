//! Global dashsync configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, File};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_EVENTS_KEY, DEFAULT_EXPORT_FILENAME, DEFAULT_STORAGE_KEY};
use crate::error::{DashError, DashResult};
use crate::observer::TriggerAction;

static DEFAULT_DATA_DIR: &str = "~/.local/share/dashsync";

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

fn default_events_key() -> String {
    DEFAULT_EVENTS_KEY.to_string()
}

fn default_export_filename() -> String {
    DEFAULT_EXPORT_FILENAME.to_string()
}

/// Configuration at ~/.config/dashsync/config.toml
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DashsyncConfig {
    /// Directory of the file-backed store.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    #[serde(default = "default_events_key")]
    pub events_key: String,

    #[serde(default = "default_export_filename")]
    pub export_filename: String,

    /// Replaces the bundled first-run data when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_data: Option<PathBuf>,

    #[serde(default)]
    pub sync: SyncConfig,
}

impl Default for DashsyncConfig {
    fn default() -> Self {
        DashsyncConfig {
            data_dir: default_data_dir(),
            storage_key: default_storage_key(),
            events_key: default_events_key(),
            export_filename: default_export_filename(),
            default_data: None,
            sync: SyncConfig::default(),
        }
    }
}

/// Timing of the save pipeline, in milliseconds.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct SyncConfig {
    /// Quiet period before a burst of changes is saved.
    pub debounce_ms: u64,
    /// Delay before re-reading the admin panel after one of its buttons.
    pub admin_action_delay_ms: u64,
    /// Delay before saving after a form submit or generic action button.
    pub action_delay_ms: u64,
    /// Wait after startup before change detection is attached.
    pub attach_grace_ms: u64,
    /// How often the file store checks for other processes' writes.
    pub poll_interval_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            debounce_ms: 2000,
            admin_action_delay_ms: 300,
            action_delay_ms: 500,
            attach_grace_ms: 1000,
            poll_interval_ms: 500,
        }
    }
}

impl SyncConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn attach_grace(&self) -> Duration {
        Duration::from_millis(self.attach_grace_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn delay_for(&self, action: TriggerAction) -> Duration {
        match action {
            TriggerAction::AdminRefresh => Duration::from_millis(self.admin_action_delay_ms),
            TriggerAction::Save | TriggerAction::Ignore => {
                Duration::from_millis(self.action_delay_ms)
            }
        }
    }
}

impl DashsyncConfig {
    pub fn config_path() -> DashResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| DashError::Config("Could not determine config directory".into()))?
            .join("dashsync");

        Ok(config_dir.join("config.toml"))
    }

    /// Load ~/.config/dashsync/config.toml, creating a commented template on
    /// first use.
    pub fn load() -> DashResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> DashResult<Self> {
        Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .build()
            .map_err(|e| DashError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| DashError::Config(e.to_string()))
    }

    /// `data_dir` with `~` expanded.
    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.data_dir.to_string_lossy()).into_owned())
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> DashResult<()> {
        let contents = format!(
            "\
# dashsync configuration

# Where the file-backed store keeps its data:
# data_dir = \"{}\"

# Storage keys shared with the dashboard page:
# storage_key = \"{}\"
# events_key = \"{}\"

# JSON file used instead of the bundled first-run data:
# default_data = \"~/dashboard_data.json\"

# [sync]
# debounce_ms = 2000
# admin_action_delay_ms = 300
# action_delay_ms = 500
# attach_grace_ms = 1000
# poll_interval_ms = 500
",
            DEFAULT_DATA_DIR, DEFAULT_STORAGE_KEY, DEFAULT_EVENTS_KEY
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DashError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| DashError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
