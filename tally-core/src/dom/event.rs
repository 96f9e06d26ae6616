//! Events
//!
//! Events are dispatched at a target node and bubble through its ancestors.
//! Listeners run after the document lock is released, so they may mutate
//! the document or write signals.

use std::cell::Cell;
use std::sync::Arc;

use super::NodeId;

/// The kinds of events the document dispatches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// A pointer click or a synthesized activation.
    Click,
    /// A key press, with the key as reported by the host (`" "` for space).
    KeyDown(String),
}

impl EventKind {
    /// The listener name this event is delivered under.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Click => "click",
            EventKind::KeyDown(_) => "keydown",
        }
    }
}

/// An event in flight.
#[derive(Debug)]
pub struct Event {
    kind: EventKind,
    target: NodeId,
    current_target: Cell<NodeId>,
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
}

impl Event {
    pub(crate) fn new(kind: EventKind, target: NodeId) -> Self {
        Self {
            kind,
            target,
            current_target: Cell::new(target),
            default_prevented: Cell::new(false),
            propagation_stopped: Cell::new(false),
        }
    }

    /// The event kind.
    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    /// The key, for key events.
    pub fn key(&self) -> Option<&str> {
        match &self.kind {
            EventKind::KeyDown(key) => Some(key),
            EventKind::Click => None,
        }
    }

    /// The node the event was dispatched at.
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// The node whose listener is running.
    pub fn current_target(&self) -> NodeId {
        self.current_target.get()
    }

    pub(crate) fn set_current_target(&self, node: NodeId) {
        self.current_target.set(node);
    }

    /// Suppress the host's default action.
    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    /// Whether a listener suppressed the default action.
    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    /// Stop bubbling after the current node.
    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    /// Whether bubbling was stopped.
    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }
}

/// An event listener.
pub type Listener = Arc<dyn Fn(&Event) + Send + Sync>;
