//! Locating the containers each collection lives in.

use super::{NodeId, View};

pub const DASHBOARD_COLUMN_CLASS: &str = "dashboard-col";
pub const ANNIVERSARY_LIST_CLASS: &str = "anniversary-list";
pub const NEWS_CONTAINER_CLASS: &str = "news-container";

/// The three containers the renderer writes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchors {
    pub birthdays: NodeId,
    pub anniversaries: NodeId,
    pub news: NodeId,
}

impl Anchors {
    /// All three containers, or `None` if any is missing.
    pub fn resolve<V: View + ?Sized>(view: &V) -> Option<Self> {
        Some(Anchors {
            birthdays: list_in_column(view, 0)?,
            anniversaries: list_in_column(view, 1)?,
            news: news_container(view)?,
        })
    }
}

/// The nth dashboard column (0 = birthdays, 1 = company anniversaries).
pub fn column<V: View + ?Sized>(view: &V, index: usize) -> Option<NodeId> {
    view.query_class(view.root(), DASHBOARD_COLUMN_CLASS)
        .get(index)
        .copied()
}

pub fn list_in_column<V: View + ?Sized>(view: &V, index: usize) -> Option<NodeId> {
    let col = column(view, index)?;
    view.first_with_class(col, ANNIVERSARY_LIST_CLASS)
}

pub fn news_container<V: View + ?Sized>(view: &V) -> Option<NodeId> {
    view.first_with_class(view.root(), NEWS_CONTAINER_CLASS)
}
