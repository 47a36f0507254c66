//! Capabilities the hosting application provides to the engine.
//!
//! Every method has a no-op default, so a host only implements what its
//! page actually has.

use chrono::{DateTime, Local, NaiveDate};
use log::{info, warn};

use crate::model::EntityKind;

/// Page-level refreshes run after every render pass.
pub trait RefreshHooks: Send + Sync {
    /// Re-sort the entries of one collection.
    fn resort_entries(&self, _kind: EntityKind) {}

    /// Recompute the per-collection counters.
    fn refresh_counts(&self) {}

    /// Rebuild the event widgets from the events side channel.
    fn reinit_events(&self) {}
}

/// Hooks implementation for hosts with nothing to refresh.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl RefreshHooks for NoHooks {}

/// User-facing feedback.
pub trait Notifier: Send + Sync {
    /// Confirmation for an explicit, user-visible operation.
    fn confirm(&self, _message: &str) {}

    /// Failure of a user-initiated operation.
    fn alert(&self, _message: &str) {}

    /// Lightweight "saving changes" acknowledgment after a detected change.
    fn saving(&self) {}

    /// A persist completed; `last_updated` is the new model timestamp.
    fn saved(&self, _last_updated: DateTime<chrono::Utc>) {}
}

/// Notifier that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Notifier for Silent {}

/// Notifier that forwards everything to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn confirm(&self, message: &str) {
        info!("{}", message);
    }

    fn alert(&self, message: &str) {
        warn!("{}", message);
    }

    fn saving(&self) {
        info!("Saving changes...");
    }

    fn saved(&self, last_updated: DateTime<chrono::Utc>) {
        info!("Changes saved ({})", last_updated.to_rfc3339());
    }
}

/// Source of the local date used for "today" decorations and form stamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock stopped at a given instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Local>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}
