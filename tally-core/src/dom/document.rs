//! Document
//!
//! The document is an arena of [`Node`]s indexed by [`NodeId`], with parent
//! and child edges kept on both ends. A `Document` value is a cheap handle:
//! clones share the same tree.
//!
//! No method calls user code while holding the tree lock. Event dispatch
//! collects listeners first and invokes them after the lock is released.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::event::{Event, EventKind, Listener};
use super::node::{Node, NodeId, NodeKind, Placement};
use crate::error::{Error, Result};

struct DocumentInner {
    nodes: HashMap<NodeId, Node>,
    listeners: HashMap<NodeId, Vec<(&'static str, Listener)>>,
    root: NodeId,
    head: NodeId,
    body: NodeId,
}

impl DocumentInner {
    fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(&id).ok_or(Error::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(&id).ok_or(Error::NodeNotFound(id))
    }

    fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id();
        self.nodes.insert(id, node);
        id
    }

    /// Detach `child` from its parent, if any.
    fn detach(&mut self, child: NodeId) {
        let parent = self.nodes.get(&child).and_then(Node::parent);
        if let Some(parent) = parent {
            if let Some(parent) = self.nodes.get_mut(&parent) {
                parent.remove_child(child);
            }
        }
        if let Some(child) = self.nodes.get_mut(&child) {
            child.set_parent(None);
        }
    }

    fn insert(&mut self, parent: NodeId, child: NodeId, placement: Placement) -> Result<()> {
        self.node(child)?;
        // Text nodes take no children; a node may not go under itself.
        if matches!(self.node(parent)?.kind(), NodeKind::Text(_))
            || child == self.root
            || self.is_inclusive_ancestor(child, parent)
        {
            return Err(Error::HierarchyRequest { parent, child });
        }
        self.detach(child);
        self.node_mut(parent)?.insert_child(child, placement);
        self.node_mut(child)?.set_parent(Some(parent));
        Ok(())
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(&id).and_then(Node::parent);
        }
        false
    }

    fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.get(&next) {
                out.push(next);
                stack.extend(node.children().iter().rev().copied());
            }
        }
        out
    }

    fn write_html(&self, id: NodeId, raw_text: bool, out: &mut String) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        match node.kind() {
            NodeKind::Document => {
                for child in node.children() {
                    self.write_html(*child, false, out);
                }
            }
            NodeKind::Text(text) if raw_text => out.push_str(text),
            NodeKind::Text(text) => out.push_str(&escape(text)),
            NodeKind::Element(tag) => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in node.attributes() {
                    out.push_str(&format!(" {name}=\"{}\"", escape(value)));
                }
                out.push('>');
                let raw = tag == "style";
                for child in node.children() {
                    self.write_html(*child, raw, out);
                }
                out.push_str(&format!("</{tag}>"));
            }
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// A shared handle to a document tree.
#[derive(Clone)]
pub struct Document {
    inner: Arc<RwLock<DocumentInner>>,
}

impl Document {
    /// Create a document with `<html>`, `<head>` and `<body>`.
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        let mut root = Node::new(NodeKind::Document);
        let mut html = Node::element("html");
        let mut head = Node::element("head");
        let mut body = Node::element("body");

        root.insert_child(html.id(), Placement::Append);
        html.set_parent(Some(root.id()));
        html.insert_child(head.id(), Placement::Append);
        html.insert_child(body.id(), Placement::Append);
        head.set_parent(Some(html.id()));
        body.set_parent(Some(html.id()));

        let (root_id, head_id, body_id) = (root.id(), head.id(), body.id());
        for node in [root, html, head, body] {
            nodes.insert(node.id(), node);
        }

        Self {
            inner: Arc::new(RwLock::new(DocumentInner {
                nodes,
                listeners: HashMap::new(),
                root: root_id,
                head: head_id,
                body: body_id,
            })),
        }
    }

    /// The document root.
    pub fn root(&self) -> NodeId {
        self.inner.read().root
    }

    /// The `<head>` element.
    pub fn head(&self) -> NodeId {
        self.inner.read().head
    }

    /// The `<body>` element.
    pub fn body(&self) -> NodeId {
        self.inner.read().body
    }

    /// Create a detached element.
    pub fn create_element(&self, tag: impl Into<String>) -> NodeId {
        self.inner.write().add_node(Node::element(tag))
    }

    /// Create a detached text node.
    pub fn create_text(&self, text: impl Into<String>) -> NodeId {
        self.inner.write().add_node(Node::text(text))
    }

    /// Whether the node exists in this document (attached or not).
    pub fn contains(&self, id: NodeId) -> bool {
        self.inner.read().nodes.contains_key(&id)
    }

    /// Whether the node is reachable from the document root.
    pub fn is_connected(&self, id: NodeId) -> bool {
        let inner = self.inner.read();
        inner.is_inclusive_ancestor(inner.root, id)
    }

    /// Insert `child` under `parent`, moving it if it is already attached.
    pub fn insert(&self, parent: NodeId, child: NodeId, placement: Placement) -> Result<()> {
        self.inner.write().insert(parent, child, placement)
    }

    /// Insert `child` after `parent`'s existing children.
    pub fn append_child(&self, parent: NodeId, child: NodeId) -> Result<()> {
        self.insert(parent, child, Placement::Append)
    }

    /// Insert `child` before `parent`'s existing children.
    pub fn prepend_child(&self, parent: NodeId, child: NodeId) -> Result<()> {
        self.insert(parent, child, Placement::Prepend)
    }

    /// Detach a node and drop it with its whole subtree and listeners.
    ///
    /// Returns `false` if the node does not exist or is the document root.
    pub fn remove(&self, id: NodeId) -> bool {
        let mut inner = self.inner.write();
        if id == inner.root || !inner.nodes.contains_key(&id) {
            return false;
        }
        inner.detach(id);
        for node in inner.descendants(id) {
            inner.nodes.remove(&node);
            inner.listeners.remove(&node);
        }
        true
    }

    /// Get a snapshot of a node.
    pub fn node(&self, id: NodeId) -> Option<Node> {
        self.inner.read().nodes.get(&id).cloned()
    }

    /// The tag name of an element.
    pub fn tag(&self, id: NodeId) -> Option<String> {
        self.inner.read().nodes.get(&id).and_then(|n| n.tag().map(str::to_owned))
    }

    /// The parent of a node.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.inner.read().nodes.get(&id).and_then(Node::parent)
    }

    /// The children of a node in document order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.inner
            .read()
            .nodes
            .get(&id)
            .map(|n| n.children().to_vec())
            .unwrap_or_default()
    }

    /// Set an attribute on an element.
    pub fn set_attribute(&self, id: NodeId, name: &str, value: impl Into<String>) -> Result<()> {
        self.inner.write().node_mut(id)?.set_attribute(name, value);
        Ok(())
    }

    /// Get an attribute of an element.
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<String> {
        self.inner
            .read()
            .nodes
            .get(&id)
            .and_then(|n| n.attribute(name).map(str::to_owned))
    }

    /// Replace the text of a text node.
    pub fn set_text(&self, id: NodeId, text: impl Into<String>) -> Result<()> {
        let mut inner = self.inner.write();
        if inner.node_mut(id)?.set_text(text) {
            Ok(())
        } else {
            Err(Error::NodeNotFound(id))
        }
    }

    /// Concatenated text of a node and its descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        let inner = self.inner.read();
        inner
            .descendants(id)
            .into_iter()
            .filter_map(|n| match inner.nodes.get(&n).map(Node::kind) {
                Some(NodeKind::Text(text)) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// All elements with the given tag under `root`, in document order.
    pub fn find_all(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        let inner = self.inner.read();
        inner
            .descendants(root)
            .into_iter()
            .filter(|n| inner.nodes.get(n).and_then(Node::tag) == Some(tag))
            .collect()
    }

    /// The first element with the given tag under `root`.
    pub fn find_first(&self, root: NodeId, tag: &str) -> Option<NodeId> {
        self.find_all(root, tag).into_iter().next()
    }

    /// Total number of nodes, attached or not.
    pub fn node_count(&self) -> usize {
        self.inner.read().nodes.len()
    }

    /// Serialize a subtree as HTML.
    pub fn to_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.inner.read().write_html(id, false, &mut out);
        out
    }

    /// Register a listener for events named `event` on a node.
    pub fn add_listener<F>(&self, id: NodeId, event: &'static str, listener: F) -> Result<()>
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let mut inner = self.inner.write();
        inner.node(id)?;
        inner
            .listeners
            .entry(id)
            .or_default()
            .push((event, Arc::new(listener)));
        Ok(())
    }

    /// Dispatch an event at `target` and bubble it to the root.
    ///
    /// Returns the event so callers can inspect `default_prevented`.
    pub fn dispatch(&self, target: NodeId, kind: EventKind) -> Result<Event> {
        let path: Vec<(NodeId, Vec<Listener>)> = {
            let inner = self.inner.read();
            inner.node(target)?;
            let name = kind.name();
            let mut path = Vec::new();
            let mut current = Some(target);
            while let Some(node) = current {
                let listeners = inner
                    .listeners
                    .get(&node)
                    .map(|ls| {
                        ls.iter()
                            .filter(|(event, _)| *event == name)
                            .map(|(_, l)| l.clone())
                            .collect()
                    })
                    .unwrap_or_default();
                path.push((node, listeners));
                current = inner.nodes.get(&node).and_then(Node::parent);
            }
            path
        };

        let event = Event::new(kind, target);
        for (node, listeners) in path {
            event.set_current_target(node);
            for listener in listeners {
                listener(&event);
            }
            if event.propagation_stopped() {
                break;
            }
        }
        Ok(event)
    }

    /// Dispatch a click at `target`.
    pub fn click(&self, target: NodeId) -> Result<Event> {
        self.dispatch(target, EventKind::Click)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.node_count())
            .finish()
    }
}
