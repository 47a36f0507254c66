pub mod export;
pub mod import;
pub mod status;
pub mod watch;

use dashsync_core::hooks::LogNotifier;
use dashsync_core::store::{FileStorage, ModelStore};
use dashsync_core::view::ViewTree;
use dashsync_core::{DashsyncConfig, Model, SyncEngine};

fn storage(config: &DashsyncConfig) -> FileStorage {
    FileStorage::new(config.data_path(), config.sync.poll_interval())
}

pub fn open_store(config: &DashsyncConfig) -> ModelStore<FileStorage> {
    ModelStore::new(storage(config), config)
}

/// An engine over the file store, rendering into a headless dashboard.
pub fn headless_engine(config: &DashsyncConfig) -> SyncEngine<ViewTree, FileStorage> {
    SyncEngine::builder(ViewTree::dashboard(), storage(config))
        .config(config.clone())
        .notifier(LogNotifier)
        .build()
}

pub fn summary(model: &Model) -> String {
    format!(
        "{} birthdays, {} anniversaries, {} news, {} events",
        model.birthdays.len(),
        model.anniversaries.len(),
        model.news.len(),
        model.events.len()
    )
}
