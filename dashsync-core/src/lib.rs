//! Sync engine for the company dashboard.
//!
//! Keeps four collections (personal birthdays, company anniversaries, news
//! and events) consistent between a rendered view, an in-memory model and a
//! key-value store shared with other instances:
//! - `view` is the element-tree boundary, with an in-memory `ViewTree`
//! - `collect` / `render` / `admin` translate between the view and the model
//! - `store` persists the model (memory and file backends, export/import)
//! - `engine` ties them together with debounced, serialized saves

pub mod admin;
pub mod collect;
pub mod config;
pub mod constants;
mod cross_instance;
pub mod dates;
pub mod engine;
pub mod error;
pub mod hooks;
pub mod model;
pub mod normalize;
pub mod observer;
pub mod render;
pub mod store;
pub mod view;

pub use config::{DashsyncConfig, SyncConfig};
pub use engine::{SaveOutcome, SyncEngine, SyncEngineBuilder};
pub use error::{DashError, DashResult};
pub use model::*;
