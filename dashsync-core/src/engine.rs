//! The sync engine: owns the view, the in-memory model and the store, and
//! keeps the three consistent.
//!
//! Saves are serialized by a single save lock. Automatic saves (debounced
//! list changes, action triggers) give up when it is taken; user-initiated
//! operations wait for it. The engine is a cheap handle (`Clone`) over shared
//! state, so background loops each hold their own copy.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use tokio::sync::{Mutex as TokioMutex, MutexGuard as TokioMutexGuard};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::admin::{collect_admin, render_admin, render_last_updated};
use crate::collect::collect;
use crate::config::{DashsyncConfig, SyncConfig};
use crate::cross_instance;
use crate::error::{DashError, DashResult};
use crate::hooks::{Clock, NoHooks, Notifier, RefreshHooks, Silent, SystemClock};
use crate::model::{EntityKind, Model};
use crate::observer::{self, ChangeNotifier, ObserverChannel};
use crate::render::render;
use crate::store::{ExportFile, FilePicker, KvBackend, ModelStore, StorageEvent, import_from_file};
use crate::view::View;

/// What became of a save request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// A debounced save is pending.
    Scheduled,
    /// The model was written to the store.
    Persisted,
    /// Another save was running; the request was discarded.
    Dropped,
    /// The store rejected the write. The in-memory model is kept.
    Failed,
}

pub struct SyncEngine<V, B> {
    inner: Arc<Inner<V, B>>,
}

impl<V, B> Clone for SyncEngine<V, B> {
    fn clone(&self) -> Self {
        SyncEngine {
            inner: self.inner.clone(),
        }
    }
}

struct Inner<V, B> {
    view: Mutex<V>,
    model: Mutex<Model>,
    store: ModelStore<B>,
    config: SyncConfig,
    hooks: Arc<dyn RefreshHooks>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    observer: ObserverChannel,
    save_lock: TokioMutex<()>,
    saving: AtomicBool,
    debounce: Mutex<Option<(u64, JoinHandle<()>)>>,
    next_timer: AtomicU64,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    started: AtomicBool,
}

/// Collaborators default to no hooks, a silent notifier and the system
/// clock.
pub struct SyncEngineBuilder<V, B> {
    view: V,
    backend: B,
    config: DashsyncConfig,
    hooks: Arc<dyn RefreshHooks>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl<V: View, B: KvBackend> SyncEngineBuilder<V, B> {
    pub fn config(mut self, config: DashsyncConfig) -> Self {
        self.config = config;
        self
    }

    pub fn hooks(mut self, hooks: impl RefreshHooks + 'static) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    pub fn notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Arc::new(notifier);
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn build(self) -> SyncEngine<V, B> {
        SyncEngine {
            inner: Arc::new(Inner {
                view: Mutex::new(self.view),
                model: Mutex::new(Model::empty()),
                store: ModelStore::new(self.backend, &self.config),
                config: self.config.sync,
                hooks: self.hooks,
                notifier: self.notifier,
                clock: self.clock,
                observer: ObserverChannel::new(),
                save_lock: TokioMutex::new(()),
                saving: AtomicBool::new(false),
                debounce: Mutex::new(None),
                next_timer: AtomicU64::new(0),
                tasks: Mutex::new(Vec::new()),
                started: AtomicBool::new(false),
            }),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The save lock, plus the `Saving` flag raised for as long as it is held.
struct SaveGuard<'a> {
    _lock: TokioMutexGuard<'a, ()>,
    saving: &'a AtomicBool,
}

impl<'a> SaveGuard<'a> {
    fn new(lock: TokioMutexGuard<'a, ()>, saving: &'a AtomicBool) -> Self {
        saving.store(true, Ordering::SeqCst);
        SaveGuard {
            _lock: lock,
            saving,
        }
    }
}

impl Drop for SaveGuard<'_> {
    fn drop(&mut self) {
        self.saving.store(false, Ordering::SeqCst);
    }
}

impl<V: View, B: KvBackend> SyncEngine<V, B> {
    pub fn builder(view: V, backend: B) -> SyncEngineBuilder<V, B> {
        SyncEngineBuilder {
            view,
            backend,
            config: DashsyncConfig::default(),
            hooks: Arc::new(NoHooks),
            notifier: Arc::new(Silent),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn new(view: V, backend: B, config: DashsyncConfig) -> Self {
        Self::builder(view, backend).config(config).build()
    }

    /// Load the model, render it silently and, after the grace delay, start
    /// following view changes and other instances' writes.
    ///
    /// Stored data wins; with nothing stored the default data is loaded and
    /// persisted, and if that fails too the dashboard starts empty. Returns
    /// whether the initial render succeeded. Only the first call does
    /// anything.
    pub async fn start(&self) -> bool {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            warn!("Sync engine already started");
            return false;
        }

        let model = match self.inner.store.load().await {
            Some(model) => model,
            None => match self.inner.store.load_default().await {
                Ok(model) => {
                    info!("No stored dashboard data, loading defaults");
                    self.inner.store.persist(&model).await;
                    model
                }
                Err(e) => {
                    warn!("Could not load default dashboard data: {}", e);
                    Model::empty()
                }
            },
        };
        let rendered = self.apply_model(model, false).await;

        let updates = self.inner.store.subscribe();
        let grace = self.inner.config.attach_grace();
        let engine = self.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            engine.attach(updates);
        });
        lock(&self.inner.tasks).push(handle);

        rendered
    }

    fn attach(&self, updates: mpsc::UnboundedReceiver<StorageEvent>) {
        let Some(events) = self.inner.observer.take_receiver() else {
            return;
        };
        lock(&self.inner.view).observe(self.inner.observer.sink());

        let changes = tokio::spawn(observer::run(self.clone(), events));
        let updates = tokio::spawn(cross_instance::run(self.clone(), updates));
        lock(&self.inner.tasks).extend([changes, updates]);
    }

    /// Stop background work. A pending debounced save is discarded; call
    /// [`flush`](Self::flush) first to keep it.
    pub fn shutdown(&self) {
        if let Some((_, timer)) = lock(&self.inner.debounce).take() {
            timer.abort();
        }
        for task in lock(&self.inner.tasks).drain(..) {
            task.abort();
        }
        debug!("Sync engine stopped");
    }

    /// Run a pending debounced save immediately.
    pub async fn flush(&self) -> Option<SaveOutcome> {
        let (_, timer) = lock(&self.inner.debounce).take()?;
        timer.abort();
        Some(self.save_now().await)
    }

    pub async fn save(&self, debounce: bool) -> SaveOutcome {
        if debounce {
            self.schedule_save()
        } else {
            self.save_now().await
        }
    }

    /// (Re)start the debounce timer. Only the last request of a burst saves.
    pub fn schedule_save(&self) -> SaveOutcome {
        if self.is_saving() {
            debug!("Save in progress, dropping debounced request");
            return SaveOutcome::Dropped;
        }

        let id = self.inner.next_timer.fetch_add(1, Ordering::SeqCst);
        let delay = self.inner.config.debounce();
        let mut slot = lock(&self.inner.debounce);
        let engine = self.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if engine.disarm(id) {
                engine.save_now().await;
            }
        });
        if let Some((_, previous)) = slot.replace((id, timer)) {
            previous.abort();
        }
        SaveOutcome::Scheduled
    }

    /// Clear the pending timer if it is still `id`.
    fn disarm(&self, id: u64) -> bool {
        let mut slot = lock(&self.inner.debounce);
        if slot.as_ref().is_some_and(|(pending, _)| *pending == id) {
            slot.take();
            true
        } else {
            false
        }
    }

    /// Collect the view and persist it, unless a save is already running.
    pub async fn save_now(&self) -> SaveOutcome {
        let Some(_saving) = self.try_begin_save() else {
            debug!("Save already in progress, dropping request");
            return SaveOutcome::Dropped;
        };
        self.persist_view().await
    }

    pub fn is_saving(&self) -> bool {
        self.inner.saving.load(Ordering::SeqCst)
    }

    fn try_begin_save(&self) -> Option<SaveGuard<'_>> {
        let lock = self.inner.save_lock.try_lock().ok()?;
        Some(SaveGuard::new(lock, &self.inner.saving))
    }

    async fn begin_save(&self) -> SaveGuard<'_> {
        let lock = self.inner.save_lock.lock().await;
        SaveGuard::new(lock, &self.inner.saving)
    }

    /// Callers hold the save lock.
    async fn persist_view(&self) -> SaveOutcome {
        let events = self.inner.store.load_events().await;
        let model = {
            let previous = self.model();
            let view = lock(&self.inner.view);
            let mut model = collect(&*view, events, &previous);
            model.stamp(self.now_utc());
            model
        };
        *lock(&self.inner.model) = model.clone();
        self.persist(&model).await
    }

    /// Callers hold the save lock.
    async fn persist(&self, model: &Model) -> SaveOutcome {
        if !self.inner.store.persist(model).await {
            return SaveOutcome::Failed;
        }
        debug!(
            "Saved {} birthdays, {} anniversaries, {} news, {} events",
            model.birthdays.len(),
            model.anniversaries.len(),
            model.news.len(),
            model.events.len()
        );
        {
            let _mute = self.inner.observer.mute();
            render_last_updated(&mut *lock(&self.inner.view), model.last_updated);
        }
        self.inner.notifier.saved(model.last_updated);
        SaveOutcome::Persisted
    }

    /// Render the current model into the view.
    ///
    /// The engine's own view changes are not reported as edits. `notify`
    /// shows a confirmation (or an alert on failure) to the user.
    pub async fn apply(&self, notify: bool) -> bool {
        let model = {
            let mut model = lock(&self.inner.model);
            model.clean_stored();
            model.clone()
        };
        let today = self.inner.clock.today();

        let rendered = {
            let _mute = self.inner.observer.mute();
            let mut view = lock(&self.inner.view);
            render(&mut *view, &model, today).map(|()| render_admin(&mut *view, &model))
        };
        if let Err(e) = rendered {
            error!("Could not render dashboard: {}", e);
            if notify {
                self.inner
                    .notifier
                    .alert(&format!("Erro ao carregar os dados: {}", e));
            }
            return false;
        }

        if !model.events.is_empty() {
            self.inner.store.store_events(&model.events).await;
        }
        self.run_hooks(&model);

        if notify {
            self.inner.notifier.confirm("Dados carregados com sucesso!");
        }
        true
    }

    /// Replace the in-memory model and render it.
    pub async fn apply_model(&self, model: Model, notify: bool) -> bool {
        *lock(&self.inner.model) = model;
        self.apply(notify).await
    }

    fn run_hooks(&self, model: &Model) {
        let hooks = &self.inner.hooks;
        for kind in [EntityKind::Birthdays, EntityKind::Anniversaries, EntityKind::News] {
            hooks.resort_entries(kind);
        }
        hooks.refresh_counts();
        if !model.events.is_empty() {
            hooks.reinit_events();
        }
    }

    /// Read the admin panel back into the model, save it and re-render.
    pub async fn refresh_from_admin(&self, notify: bool) -> bool {
        let saving = self.begin_save().await;

        let today = self.inner.clock.today();
        let model = {
            let previous = self.model();
            let _mute = self.inner.observer.mute();
            let mut view = lock(&self.inner.view);
            let mut model = collect_admin(&mut *view, &previous, today);
            model.stamp(self.now_utc());
            model
        };
        *lock(&self.inner.model) = model.clone();

        let saved = self.persist(&model).await == SaveOutcome::Persisted;
        self.inner.store.store_events(&model.events).await;
        drop(saving);

        let rendered = self.apply(false).await;
        if notify {
            if saved && rendered {
                self.inner.notifier.confirm("Dashboard atualizado com sucesso!");
            } else {
                self.inner.notifier.alert("Erro ao atualizar o dashboard");
            }
        }
        saved && rendered
    }

    /// Save the current view and return the model as an export file.
    pub async fn export_to_file(&self) -> DashResult<ExportFile> {
        let saving = self.begin_save().await;
        let saved = self.persist_view().await;
        drop(saving);

        match self.inner.store.export(&self.model()) {
            Ok(file) => {
                info!("Exported dashboard data as {}", file.filename);
                if saved == SaveOutcome::Persisted {
                    self.inner.notifier.confirm("Dados exportados com sucesso!");
                } else {
                    warn!("Exported dashboard data that could not be saved");
                    self.inner
                        .notifier
                        .alert("Dados exportados, mas não foi possível salvá-los");
                }
                Ok(file)
            }
            Err(e) => {
                error!("Could not export dashboard data: {}", e);
                self.inner
                    .notifier
                    .alert(&format!("Erro ao exportar os dados: {}", e));
                Err(e)
            }
        }
    }

    /// Import a file chosen through `picker`, render it and persist it.
    ///
    /// The file is fully parsed before anything changes; a bad file leaves
    /// the model, view and store as they were. The imported model is
    /// stamped with the current time, never earlier than the model it
    /// replaces. A failed render or store write is reported to the notifier
    /// and returned as an error.
    pub async fn load_from_file(&self, picker: &dyn FilePicker) -> DashResult<Model> {
        let bytes = match picker.pick().await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Err(DashError::NoFileSelected),
            Err(e) => {
                error!("Could not read import file: {}", e);
                self.inner
                    .notifier
                    .alert(&format!("Erro ao ler o arquivo: {}", e));
                return Err(e);
            }
        };

        let mut model = match import_from_file(&bytes) {
            Ok(model) => model,
            Err(e) => {
                error!("Rejected import file: {}", e);
                self.inner
                    .notifier
                    .alert(&format!("Arquivo inválido: {}", e));
                return Err(e);
            }
        };

        let _saving = self.begin_save().await;
        let previous = self.model();
        model.last_updated = previous.last_updated;
        model.stamp(self.now_utc());

        if !self.apply_model(model, false).await {
            *lock(&self.inner.model) = previous;
            self.inner
                .notifier
                .alert("Erro ao carregar os dados importados");
            return Err(DashError::Render(
                "dashboard anchors are missing".to_string(),
            ));
        }
        let model = self.model();
        self.inner.store.store_events(&model.events).await;
        if self.persist(&model).await != SaveOutcome::Persisted {
            self.inner
                .notifier
                .alert("Dados importados, mas não foi possível salvá-los");
            return Err(DashError::Storage(
                "imported data could not be saved".to_string(),
            ));
        }

        info!("Imported dashboard data");
        self.inner.notifier.confirm("Dados carregados com sucesso!");
        Ok(model)
    }

    /// A copy of the in-memory model.
    pub fn model(&self) -> Model {
        lock(&self.inner.model).clone()
    }

    /// Run `f` against the view. Changes made here count as user edits.
    pub fn with_view<R>(&self, f: impl FnOnce(&mut V) -> R) -> R {
        f(&mut *lock(&self.inner.view))
    }

    /// Handle for reporting list changes and button clicks directly.
    pub fn change_notifier(&self) -> ChangeNotifier {
        self.inner.observer.notifier()
    }

    pub fn notifier(&self) -> &dyn Notifier {
        self.inner.notifier.as_ref()
    }

    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    pub fn storage_key(&self) -> &str {
        self.inner.store.key()
    }

    pub fn store(&self) -> &ModelStore<B> {
        &self.inner.store
    }

    fn now_utc(&self) -> DateTime<Utc> {
        self.inner.clock.now().with_timezone(&Utc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryBackend, MemoryStorage, PathPicker};
    use crate::view::ViewTree;
    use std::path::PathBuf;

    fn engine(storage: &MemoryStorage) -> SyncEngine<ViewTree, MemoryBackend> {
        SyncEngine::builder(ViewTree::dashboard(), storage.handle()).build()
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_loads_defaults_when_store_is_empty() {
        let storage = MemoryStorage::new();
        let engine = engine(&storage);

        assert!(engine.start().await);
        assert!(!engine.model().is_empty());
        assert!(engine.store().load().await.is_some());
        engine.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_twice_is_a_no_op() {
        let storage = MemoryStorage::new();
        let engine = engine(&storage);

        assert!(engine.start().await);
        assert!(!engine.start().await);
        engine.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_anchors_fail_render() {
        let storage = MemoryStorage::new();
        let engine = SyncEngine::builder(ViewTree::new(), storage.handle()).build();

        assert!(!engine.start().await);
        engine.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_now_persists_collected_view() {
        let storage = MemoryStorage::new();
        let engine = engine(&storage);
        engine.start().await;

        let before = engine.model();
        assert_eq!(engine.save_now().await, SaveOutcome::Persisted);

        let stored = engine.store().load().await.unwrap();
        assert_eq!(stored.birthdays, before.birthdays);
        assert_eq!(stored.news, before.news);
        assert!(!engine.is_saving());
        engine.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_runs_pending_save() {
        let storage = MemoryStorage::new();
        let engine = engine(&storage);
        engine.start().await;

        assert_eq!(engine.flush().await, None);
        assert_eq!(engine.schedule_save(), SaveOutcome::Scheduled);
        assert_eq!(engine.flush().await, Some(SaveOutcome::Persisted));
        engine.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_import_without_file_is_rejected() {
        let storage = MemoryStorage::new();
        let engine = engine(&storage);

        let picker = PathPicker(PathBuf::from("/nonexistent/dashboard_data.json"));
        assert!(matches!(
            engine.load_from_file(&picker).await,
            Err(DashError::NoFileSelected)
        ));
    }
}
