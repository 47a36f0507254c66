//! Change detection.
//!
//! The view reports raw [`Mutation`]s to a [`MutationSink`], which turns the
//! relevant ones into typed [`ChangeEvent`]s. Hosts can also raise events
//! directly through a [`ChangeNotifier`]. A single loop consumes them and
//! drives the engine's save path.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info};
use tokio::sync::mpsc;

use crate::constants::{
    ACTION_BUTTON_SUFFIX, ANNIVERSARY_ITEM_CLASS, EVENT_ITEM_CLASS, KNOWN_ACTION_BUTTONS,
    NEWS_ITEM_CLASS,
};
use crate::engine::SyncEngine;
use crate::store::KvBackend;
use crate::view::{Mutation, View};

/// The element classes whose changes matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchedList {
    Anniversaries,
    News,
    Events,
}

impl WatchedList {
    pub const ALL: [WatchedList; 3] = [WatchedList::Anniversaries, WatchedList::News, WatchedList::Events];

    pub fn class(&self) -> &'static str {
        match self {
            WatchedList::Anniversaries => ANNIVERSARY_ITEM_CLASS,
            WatchedList::News => NEWS_ITEM_CLASS,
            WatchedList::Events => EVENT_ITEM_CLASS,
        }
    }

    fn from_classes<'a>(mut classes: impl Iterator<Item = &'a String>) -> Option<Self> {
        classes.find_map(|class| {
            WatchedList::ALL
                .into_iter()
                .find(|list| list.class() == class)
        })
    }
}

impl fmt::Display for WatchedList {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.class())
    }
}

/// A user interaction that edits the view asynchronously after it fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Click on the button with this element id.
    Button(String),
    FormSubmit,
}

/// What a trigger should lead to, if anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerAction {
    /// Re-read the admin panel, save and re-render.
    AdminRefresh,
    Save,
    Ignore,
}

impl Trigger {
    pub fn action(&self) -> TriggerAction {
        match self {
            Trigger::Button(id) if KNOWN_ACTION_BUTTONS.contains(&id.as_str()) => {
                TriggerAction::AdminRefresh
            }
            Trigger::Button(id) if id.ends_with(ACTION_BUTTON_SUFFIX) => TriggerAction::Save,
            Trigger::Button(_) => TriggerAction::Ignore,
            Trigger::FormSubmit => TriggerAction::Save,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// An entity list changed; coalesced into one debounced save.
    ListChanged(WatchedList),
    /// An action fired; handled by a short-delayed immediate save.
    Action(Trigger),
}

/// Map a raw mutation to the list it touches, if any.
pub fn classify(mutation: &Mutation) -> Option<WatchedList> {
    match mutation {
        Mutation::ChildList { added, removed, .. } => {
            WatchedList::from_classes(added.iter().chain(removed.iter()))
        }
        Mutation::Attributes { classes, .. } => WatchedList::from_classes(classes.iter()),
    }
}

/// Receives mutations from the view. Muted while the engine itself renders.
#[derive(Debug, Clone)]
pub struct MutationSink {
    events: mpsc::UnboundedSender<ChangeEvent>,
    muted: Arc<AtomicBool>,
}

impl MutationSink {
    pub fn record(&self, mutation: Mutation) {
        if self.muted.load(Ordering::SeqCst) {
            return;
        }
        if let Some(list) = classify(&mutation) {
            let _ = self.events.send(ChangeEvent::ListChanged(list));
        }
    }
}

/// Host-facing handle for raising change events without going through the
/// view's mutation reporting.
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    events: mpsc::UnboundedSender<ChangeEvent>,
}

impl ChangeNotifier {
    pub fn list_changed(&self, list: WatchedList) {
        let _ = self.events.send(ChangeEvent::ListChanged(list));
    }

    pub fn trigger(&self, trigger: Trigger) {
        let _ = self.events.send(ChangeEvent::Action(trigger));
    }
}

/// Owns the event channel until the observer loop is attached.
pub(crate) struct ObserverChannel {
    tx: mpsc::UnboundedSender<ChangeEvent>,
    rx: std::sync::Mutex<Option<mpsc::UnboundedReceiver<ChangeEvent>>>,
    muted: Arc<AtomicBool>,
}

impl ObserverChannel {
    pub(crate) fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        ObserverChannel {
            tx,
            rx: std::sync::Mutex::new(Some(rx)),
            muted: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn sink(&self) -> MutationSink {
        MutationSink {
            events: self.tx.clone(),
            muted: self.muted.clone(),
        }
    }

    pub(crate) fn notifier(&self) -> ChangeNotifier {
        ChangeNotifier {
            events: self.tx.clone(),
        }
    }

    /// The receiving end; `None` once the loop has been attached.
    pub(crate) fn take_receiver(&self) -> Option<mpsc::UnboundedReceiver<ChangeEvent>> {
        self.rx.lock().ok().and_then(|mut rx| rx.take())
    }

    /// Drop view mutations until the guard goes out of scope.
    pub(crate) fn mute(&self) -> MuteGuard {
        let previous = self.muted.swap(true, Ordering::SeqCst);
        MuteGuard {
            muted: self.muted.clone(),
            previous,
        }
    }
}

pub(crate) struct MuteGuard {
    muted: Arc<AtomicBool>,
    previous: bool,
}

impl Drop for MuteGuard {
    fn drop(&mut self) {
        self.muted.store(self.previous, Ordering::SeqCst);
    }
}

/// Consume change events until every sender is gone.
pub(crate) async fn run<V: View, B: KvBackend>(
    engine: SyncEngine<V, B>,
    mut events: mpsc::UnboundedReceiver<ChangeEvent>,
) {
    info!("Change observer attached");

    while let Some(event) = events.recv().await {
        match event {
            ChangeEvent::ListChanged(list) => {
                debug!("Change detected in {}, scheduling save", list);
                engine.schedule_save();
                engine.notifier().saving();
            }
            ChangeEvent::Action(trigger) => {
                let action = trigger.action();
                if action == TriggerAction::Ignore {
                    continue;
                }
                let delay = engine.config().delay_for(action);
                let engine = engine.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    match action {
                        TriggerAction::AdminRefresh => {
                            engine.refresh_from_admin(false).await;
                        }
                        TriggerAction::Save => {
                            engine.save_now().await;
                        }
                        TriggerAction::Ignore => {}
                    }
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn child_list(added: &[&str], removed: &[&str]) -> Mutation {
        Mutation::ChildList {
            target: 0,
            added: added.iter().map(|s| s.to_string()).collect(),
            removed: removed.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_classify_child_list() {
        assert_eq!(
            classify(&child_list(&["anniversary-item"], &[])),
            Some(WatchedList::Anniversaries)
        );
        assert_eq!(
            classify(&child_list(&[], &["news-item", "high-priority"])),
            Some(WatchedList::News)
        );
        assert_eq!(classify(&child_list(&["avatar-text"], &[])), None);
        assert_eq!(classify(&child_list(&[], &[])), None);
    }

    #[test]
    fn test_classify_attributes() {
        let m = Mutation::Attributes {
            target: 3,
            classes: vec!["event-item".into()],
            name: "data-id".into(),
        };
        assert_eq!(classify(&m), Some(WatchedList::Events));

        let other = Mutation::Attributes {
            target: 3,
            classes: vec!["admin-list-item".into()],
            name: "checked".into(),
        };
        assert_eq!(classify(&other), None);
    }

    #[test]
    fn test_trigger_actions() {
        assert_eq!(
            Trigger::Button("saveBdayBtn".into()).action(),
            TriggerAction::AdminRefresh
        );
        assert_eq!(
            Trigger::Button("removeSelectedBtn".into()).action(),
            TriggerAction::Save
        );
        assert_eq!(Trigger::Button("toggle".into()).action(), TriggerAction::Ignore);
        assert_eq!(Trigger::FormSubmit.action(), TriggerAction::Save);
    }

    #[test]
    fn test_muted_sink_drops_mutations() {
        let channel = ObserverChannel::new();
        let sink = channel.sink();
        let mut rx = channel.take_receiver().unwrap();

        {
            let _guard = channel.mute();
            sink.record(child_list(&["news-item"], &[]));
        }
        sink.record(child_list(&["anniversary-item"], &[]));

        assert_eq!(
            rx.try_recv().unwrap(),
            ChangeEvent::ListChanged(WatchedList::Anniversaries)
        );
        assert!(rx.try_recv().is_err());
        assert!(channel.take_receiver().is_none());
    }

    #[test]
    fn test_nested_mute_restores_outer_state() {
        let channel = ObserverChannel::new();
        let outer = channel.mute();
        {
            let _inner = channel.mute();
        }
        assert!(channel.muted.load(Ordering::SeqCst));
        drop(outer);
        assert!(!channel.muted.load(Ordering::SeqCst));
    }
}
