//! File-per-key storage for running instances in separate processes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use tokio::sync::mpsc;

use super::{KvBackend, StorageEvent};
use crate::error::DashResult;

/// Stores each key as `<dir>/<key>.json`.
///
/// Other processes' writes are discovered by polling; writes made through
/// this handle are remembered so they are not reported back.
pub struct FileStorage {
    dir: PathBuf,
    poll_interval: Duration,
    written: Arc<Mutex<HashMap<String, String>>>,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>, poll_interval: Duration) -> Self {
        FileStorage {
            dir: dir.into(),
            poll_interval,
            written: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(key)))
    }
}

/// Keys are used as file names; anything outside `[A-Za-z0-9_-]` becomes `_`.
fn file_stem(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[async_trait]
impl KvBackend for FileStorage {
    async fn get(&self, key: &str) -> DashResult<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> DashResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(key);
        let temp = path.with_extension("json.tmp");

        if let Ok(mut written) = self.written.lock() {
            written.insert(file_stem(key), value.to_string());
        }

        tokio::fs::write(&temp, value).await?;
        tokio::fs::rename(&temp, &path).await?;
        Ok(())
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<StorageEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let dir = self.dir.clone();
        let written = self.written.clone();
        let poll_interval = self.poll_interval;

        tokio::spawn(async move {
            let mut seen = snapshot(&dir).await;
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if tx.is_closed() {
                    debug!("Storage watcher for {} stopped", dir.display());
                    break;
                }

                let current = snapshot(&dir).await;
                for (key, content) in &current {
                    if seen.get(key) == Some(content) {
                        continue;
                    }
                    let own_write = written
                        .lock()
                        .map(|w| w.get(key) == Some(content))
                        .unwrap_or(false);
                    if !own_write {
                        let _ = tx.send(StorageEvent {
                            key: key.clone(),
                            new_value: Some(content.clone()),
                        });
                    }
                }
                for key in seen.keys() {
                    if !current.contains_key(key) {
                        let _ = tx.send(StorageEvent {
                            key: key.clone(),
                            new_value: None,
                        });
                    }
                }
                seen = current;
            }
        });

        rx
    }
}

/// Current contents of every `*.json` file in `dir`, keyed by file stem.
async fn snapshot(dir: &Path) -> HashMap<String, String> {
    let mut out = HashMap::new();
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(_) => return out,
    };
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!("Could not list {}: {}", dir.display(), e);
                break;
            }
        };
        let path = entry.path();
        if path.extension().is_none_or(|e| e != "json") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()).map(String::from) else {
            continue;
        };
        if let Ok(content) = tokio::fs::read_to_string(&path).await {
            out.insert(stem, content);
        }
    }
    out
}
