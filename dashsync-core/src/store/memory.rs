//! Shared in-process storage with per-instance change notification.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{KvBackend, StorageEvent};
use crate::error::{DashError, DashResult};

#[derive(Default)]
struct Shared {
    values: Mutex<HashMap<String, String>>,
    subscribers: Mutex<Vec<(u64, mpsc::UnboundedSender<StorageEvent>)>>,
    next_origin: AtomicU64,
}

/// A storage area shared by several instances, like a browser origin's
/// local storage shared by its tabs. Each instance writes through its own
/// [`MemoryBackend`] handle and is only told about the others' writes.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    shared: Arc<Shared>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage::default()
    }

    /// A new instance handle with its own origin.
    pub fn handle(&self) -> MemoryBackend {
        MemoryBackend {
            shared: self.shared.clone(),
            origin: self.shared.next_origin.fetch_add(1, Ordering::SeqCst),
        }
    }
}

pub struct MemoryBackend {
    shared: Arc<Shared>,
    origin: u64,
}

fn poisoned(what: &str) -> DashError {
    DashError::Storage(format!("{} lock poisoned", what))
}

#[async_trait]
impl KvBackend for MemoryBackend {
    async fn get(&self, key: &str) -> DashResult<Option<String>> {
        let values = self.shared.values.lock().map_err(|_| poisoned("values"))?;
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> DashResult<()> {
        {
            let mut values = self.shared.values.lock().map_err(|_| poisoned("values"))?;
            values.insert(key.to_string(), value.to_string());
        }

        let mut subscribers = self
            .shared
            .subscribers
            .lock()
            .map_err(|_| poisoned("subscribers"))?;
        subscribers.retain(|(_, tx)| !tx.is_closed());
        for (origin, tx) in subscribers.iter() {
            if *origin != self.origin {
                let _ = tx.send(StorageEvent {
                    key: key.to_string(),
                    new_value: Some(value.to_string()),
                });
            }
        }
        Ok(())
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<StorageEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Ok(mut subscribers) = self.shared.subscribers.lock() {
            subscribers.push((self.origin, tx));
        }
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_handles_share_values() {
        let storage = MemoryStorage::new();
        let a = storage.handle();
        let b = storage.handle();

        a.set("k", "v").await.unwrap();
        assert_eq!(b.get("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(b.get("other").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_writer_is_not_notified() {
        let storage = MemoryStorage::new();
        let a = storage.handle();
        let b = storage.handle();
        let mut a_events = a.subscribe();
        let mut b_events = b.subscribe();

        a.set("k", "1").await.unwrap();

        assert_eq!(
            b_events.try_recv().unwrap(),
            StorageEvent {
                key: "k".into(),
                new_value: Some("1".into())
            }
        );
        assert!(a_events.try_recv().is_err());
    }
}
