//! Document Model
//!
//! An in-process stand-in for the browser DOM: a tree of elements and text
//! nodes with attributes and bubbling events. It is the attachment point for
//! mounted views and for injected `<style>` resources.
//!
//! # Overview
//!
//! - Nodes live in an arena keyed by [`NodeId`]; each node knows its parent
//!   and its ordered children.
//! - [`Document`] is a shared handle. Clones see the same tree, so effects
//!   and event listeners can hold one and update the tree later.
//! - Removing a node drops its whole subtree together with its listeners.

mod document;
mod event;
mod node;

pub use document::Document;
pub use event::{Event, EventKind, Listener};
pub use node::{Node, NodeId, NodeKind, Placement};
