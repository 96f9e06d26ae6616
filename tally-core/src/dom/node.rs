//! Document Nodes
//!
//! This module defines the node types that live in the document tree.

use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Unique identifier for a node in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Generate a new unique node ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// The kind of node in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The document root. Has children, no parent.
    Document,

    /// An element with a tag name and attributes.
    Element(String),

    /// A text leaf.
    Text(String),
}

/// Where a child is inserted among its parent's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    /// After the existing children.
    #[default]
    Append,
    /// Before the existing children.
    Prepend,
}

/// A node in the document tree.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    kind: NodeKind,
    attributes: IndexMap<String, String>,
    parent: Option<NodeId>,
    children: SmallVec<[NodeId; 4]>,
}

impl Node {
    /// Create a new detached node of the given kind.
    pub fn new(kind: NodeKind) -> Self {
        Self {
            id: NodeId::new(),
            kind,
            attributes: IndexMap::new(),
            parent: None,
            children: SmallVec::new(),
        }
    }

    /// Create a new element node.
    pub fn element(tag: impl Into<String>) -> Self {
        Self::new(NodeKind::Element(tag.into()))
    }

    /// Create a new text node.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(NodeKind::Text(text.into()))
    }

    /// Get the node's ID.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Get the node's kind.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// The tag name, for elements.
    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element(tag) => Some(tag),
            _ => None,
        }
    }

    /// Replace the text of a text node. Returns `false` for other kinds.
    pub fn set_text(&mut self, text: impl Into<String>) -> bool {
        match &mut self.kind {
            NodeKind::Text(current) => {
                *current = text.into();
                true
            }
            _ => false,
        }
    }

    /// Get the parent, if attached.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    /// Get the children in document order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Insert a child at the given placement.
    pub fn insert_child(&mut self, child: NodeId, placement: Placement) {
        match placement {
            Placement::Append => self.children.push(child),
            Placement::Prepend => self.children.insert(0, child),
        }
    }

    /// Remove a child.
    pub fn remove_child(&mut self, child: NodeId) {
        self.children.retain(|c| *c != child);
    }

    /// Get an attribute value.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Get all attributes in insertion order.
    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.attributes
    }

    /// Set an attribute value.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }
}
