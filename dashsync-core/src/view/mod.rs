//! The view boundary.
//!
//! The engine never assumes a markup engine. It talks to anything that can
//! answer class/id queries, read and write attributes, replace content and
//! report structural changes. [`ViewTree`] is the in-memory implementation
//! used headless and in tests.

pub mod anchor;
mod fragment;
mod tree;

pub use fragment::{Element, Fragment};
pub use tree::ViewTree;

use crate::observer::MutationSink;

/// Handle to a node inside a view.
pub type NodeId = usize;

/// A structural or attribute change, as reported by the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Children were added to or removed from `target`. The class lists are
    /// those of the added/removed element nodes themselves (not their
    /// descendants); text nodes contribute nothing.
    ChildList {
        target: NodeId,
        added: Vec<String>,
        removed: Vec<String>,
    },
    /// An attribute named `name` changed on `target`, which carries `classes`.
    Attributes {
        target: NodeId,
        classes: Vec<String>,
        name: String,
    },
}

pub trait View: Send + 'static {
    fn root(&self) -> NodeId;

    fn element_by_id(&self, id: &str) -> Option<NodeId>;

    /// Descendants of `scope` carrying `class`, in document order.
    fn query_class(&self, scope: NodeId, class: &str) -> Vec<NodeId>;

    fn has_class(&self, node: NodeId, class: &str) -> bool;

    /// Concatenated text of every descendant text node.
    fn text_content(&self, node: NodeId) -> String;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);

    /// Replace all children of `node` with a single text node.
    fn set_text(&mut self, node: NodeId, text: &str);

    fn clear_children(&mut self, node: NodeId);

    fn append(&mut self, parent: NodeId, fragment: Fragment) -> NodeId;

    fn prepend(&mut self, parent: NodeId, fragment: Fragment) -> NodeId;

    /// Start reporting mutations to `sink`. Replaces any previous sink.
    fn observe(&mut self, sink: MutationSink);

    fn first_with_class(&self, scope: NodeId, class: &str) -> Option<NodeId> {
        self.query_class(scope, class).into_iter().next()
    }

    /// Text of the first descendant carrying `class`, or empty when absent.
    fn text_of(&self, scope: NodeId, class: &str) -> String {
        self.first_with_class(scope, class)
            .map(|node| self.text_content(node))
            .unwrap_or_default()
    }
}
