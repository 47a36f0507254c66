//! In-memory element tree.

use std::collections::BTreeMap;

use super::{Element, Fragment, Mutation, NodeId, View};
use crate::observer::MutationSink;

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

#[derive(Debug, Clone)]
enum NodeData {
    Element {
        tag: String,
        id: Option<String>,
        classes: Vec<String>,
        attrs: BTreeMap<String, String>,
    },
    Text(String),
}

/// Arena-backed element tree. Removed subtrees return their slots to a free
/// list, so repeated renders do not grow the arena.
#[derive(Debug)]
pub struct ViewTree {
    nodes: Vec<Option<Node>>,
    free: Vec<NodeId>,
    root: NodeId,
    sink: Option<MutationSink>,
}

impl Default for ViewTree {
    fn default() -> Self {
        ViewTree::new()
    }
}

impl ViewTree {
    /// An empty document with a single `body` root.
    pub fn new() -> Self {
        let root = Node {
            parent: None,
            children: Vec::new(),
            data: NodeData::Element {
                tag: "body".to_string(),
                id: None,
                classes: Vec::new(),
                attrs: BTreeMap::new(),
            },
        };
        ViewTree {
            nodes: vec![Some(root)],
            free: Vec::new(),
            root: 0,
            sink: None,
        }
    }

    /// The dashboard page skeleton: two anniversary columns, the news
    /// container and the admin panel with its lists, inputs and buttons.
    pub fn dashboard() -> Self {
        let mut tree = ViewTree::new();
        let root = tree.root;

        for title in ["Aniversariantes do Mês", "Tempo de Casa"] {
            let column = Element::new("div")
                .class("dashboard-col")
                .child(Element::new("h2").child(title))
                .child(Element::new("ul").class("anniversary-list"));
            tree.append(root, column.into());
        }
        tree.append(root, Element::new("div").class("news-container").into());

        let sections: [(&str, &str, &[&str]); 4] = [
            ("adminBdayList", "Bday", &["adminBdayName", "adminBdayDept", "adminBdayDate"]),
            ("adminAnnivList", "Anniv", &["adminAnnivName", "adminAnnivYears", "adminAnnivDate"]),
            (
                "adminNewsList",
                "News",
                &["adminNewsTitle", "adminNewsContent", "adminNewsAuthor", "adminNewsPriority"],
            ),
            (
                "adminEventList",
                "Event",
                &[
                    "adminEventName",
                    "adminEventDateTime",
                    "adminEventDescription",
                    "adminEventLocation",
                ],
            ),
        ];

        let mut panel = Element::new("div").class("admin-panel");
        for (list_id, suffix, inputs) in sections {
            let mut form = Element::new("form").child(Element::new("div").id(list_id));
            for input in inputs {
                form = form.child(Element::new("input").id(input).attr("value", ""));
            }
            form = form
                .child(Element::new("button").id(&format!("save{}Btn", suffix)))
                .child(Element::new("button").id(&format!("clear{}Btn", suffix)));
            panel = panel.child(form);
        }
        panel = panel.child(Element::new("span").id("ultimaAtualizacao"));
        tree.append(root, panel.into());

        tree
    }

    /// Number of live nodes, text nodes included.
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).and_then(|n| n.parent)
    }

    /// Detach and drop `node` with its subtree.
    pub fn remove(&mut self, node: NodeId) {
        let Some(parent) = self.parent(node) else {
            return;
        };
        let removed = self.classes_of(node);
        if let Some(Some(p)) = self.nodes.get_mut(parent) {
            p.children.retain(|c| *c != node);
        }
        self.free_subtree(node);
        self.emit(Mutation::ChildList {
            target: parent,
            added: Vec::new(),
            removed,
        });
    }

    /// Set the `value` attribute of the element with the given id.
    pub fn set_value(&mut self, id: &str, value: &str) -> bool {
        match self.element_by_id(id) {
            Some(node) => {
                self.set_attribute(node, "value", value);
                true
            }
            None => false,
        }
    }

    pub fn value(&self, id: &str) -> Option<String> {
        self.element_by_id(id)
            .and_then(|node| self.attribute(node, "value"))
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id).and_then(Option::as_ref)
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                slot
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        }
    }

    fn free_subtree(&mut self, node: NodeId) {
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if let Some(taken) = self.nodes.get_mut(current).and_then(Option::take) {
                stack.extend(taken.children);
                self.free.push(current);
            }
        }
    }

    /// Materialize a fragment as a detached subtree under `parent`.
    fn build(&mut self, parent: NodeId, fragment: Fragment) -> NodeId {
        match fragment {
            Fragment::Text(text) => self.alloc(Node {
                parent: Some(parent),
                children: Vec::new(),
                data: NodeData::Text(text),
            }),
            Fragment::Element(element) => {
                let Element {
                    tag,
                    id,
                    classes,
                    attrs,
                    children,
                } = element;
                let node = self.alloc(Node {
                    parent: Some(parent),
                    children: Vec::new(),
                    data: NodeData::Element {
                        tag,
                        id,
                        classes,
                        attrs: attrs.into_iter().collect(),
                    },
                });
                let built: Vec<NodeId> = children
                    .into_iter()
                    .map(|child| self.build(node, child))
                    .collect();
                if let Some(Some(n)) = self.nodes.get_mut(node) {
                    n.children = built;
                }
                node
            }
        }
    }

    fn insert(&mut self, parent: NodeId, fragment: Fragment, at_start: bool) -> NodeId {
        if self.node(parent).is_none() {
            return self.build_orphan(fragment);
        }
        let node = self.build(parent, fragment);
        if let Some(Some(p)) = self.nodes.get_mut(parent) {
            if at_start {
                p.children.insert(0, node);
            } else {
                p.children.push(node);
            }
        }
        let added = self.classes_of(node);
        self.emit(Mutation::ChildList {
            target: parent,
            added,
            removed: Vec::new(),
        });
        node
    }

    /// Inserting under a dead parent builds and immediately frees the
    /// subtree, so the caller still gets a (dead) handle.
    fn build_orphan(&mut self, fragment: Fragment) -> NodeId {
        let node = self.build(self.root, fragment);
        self.free_subtree(node);
        node
    }

    fn classes_of(&self, node: NodeId) -> Vec<String> {
        match self.node(node).map(|n| &n.data) {
            Some(NodeData::Element { classes, .. }) => classes.clone(),
            _ => Vec::new(),
        }
    }

    fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self
            .node(scope)
            .map(|n| n.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(current) = stack.pop() {
            out.push(current);
            if let Some(n) = self.node(current) {
                stack.extend(n.children.iter().rev().copied());
            }
        }
        out
    }

    fn emit(&self, mutation: Mutation) {
        if let Some(sink) = &self.sink {
            sink.record(mutation);
        }
    }
}

impl View for ViewTree {
    fn root(&self) -> NodeId {
        self.root
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        std::iter::once(self.root)
            .chain(self.descendants(self.root))
            .find(|node| {
                matches!(
                    self.node(*node).map(|n| &n.data),
                    Some(NodeData::Element { id: Some(found), .. }) if found == id
                )
            })
    }

    fn query_class(&self, scope: NodeId, class: &str) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|node| self.has_class(*node, class))
            .collect()
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        match self.node(node).map(|n| &n.data) {
            Some(NodeData::Element { classes, .. }) => classes.iter().any(|c| c == class),
            _ => false,
        }
    }

    fn text_content(&self, node: NodeId) -> String {
        let mut text = String::new();
        if let Some(NodeData::Text(t)) = self.node(node).map(|n| &n.data) {
            text.push_str(t);
        }
        for descendant in self.descendants(node) {
            if let Some(NodeData::Text(t)) = self.node(descendant).map(|n| &n.data) {
                text.push_str(t);
            }
        }
        text
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        match self.node(node).map(|n| &n.data) {
            Some(NodeData::Element { attrs, .. }) => attrs.get(name).cloned(),
            _ => None,
        }
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        let classes = match self.nodes.get_mut(node).and_then(Option::as_mut) {
            Some(Node {
                data: NodeData::Element { attrs, classes, .. },
                ..
            }) => {
                attrs.insert(name.to_string(), value.to_string());
                classes.clone()
            }
            _ => return,
        };
        self.emit(Mutation::Attributes {
            target: node,
            classes,
            name: name.to_string(),
        });
    }

    fn set_text(&mut self, node: NodeId, text: &str) {
        if self.node(node).is_none() {
            return;
        }
        self.clear_children(node);
        self.insert(node, Fragment::text(text), false);
    }

    fn clear_children(&mut self, node: NodeId) {
        let children = match self.nodes.get_mut(node).and_then(Option::as_mut) {
            Some(n) => std::mem::take(&mut n.children),
            None => return,
        };
        if children.is_empty() {
            return;
        }
        let removed: Vec<String> = children
            .iter()
            .flat_map(|child| self.classes_of(*child))
            .collect();
        for child in children {
            self.free_subtree(child);
        }
        self.emit(Mutation::ChildList {
            target: node,
            added: Vec::new(),
            removed,
        });
    }

    fn append(&mut self, parent: NodeId, fragment: Fragment) -> NodeId {
        self.insert(parent, fragment, false)
    }

    fn prepend(&mut self, parent: NodeId, fragment: Fragment) -> NodeId {
        self.insert(parent, fragment, true)
    }

    fn observe(&mut self, sink: MutationSink) {
        self.sink = Some(sink);
    }
}
