//! Following writes made by other instances sharing the same store.

use log::{debug, error, info};
use tokio::sync::mpsc;

use crate::engine::SyncEngine;
use crate::store::{KvBackend, StorageEvent, parse_model};
use crate::view::View;

/// Apply every model another instance persists, silently and without
/// saving it again.
pub(crate) async fn run<V: View, B: KvBackend>(
    engine: SyncEngine<V, B>,
    mut updates: mpsc::UnboundedReceiver<StorageEvent>,
) {
    info!("Listening for updates from other instances");

    while let Some(update) = updates.recv().await {
        if update.key != engine.storage_key() {
            continue;
        }
        let Some(raw) = update.new_value else {
            debug!("Dashboard data was removed by another instance, keeping local copy");
            continue;
        };
        match parse_model(&raw) {
            Ok(model) => {
                info!("Dashboard data updated by another instance");
                engine.apply_model(model, false).await;
            }
            Err(e) => error!("Ignoring unreadable update from another instance: {}", e),
        }
    }
}
