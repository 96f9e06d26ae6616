//! Scoped Style Resources
//!
//! [`StyleRegistry`] guarantees that for each scope (the document `<head>` or
//! a container element) at most one `<style>` node exists per distinct style
//! body, however many components ask for it.
//!
//! Entries are keyed by `(container, body)` with exact string identity and
//! carry an acquisition count. Each [`StyleRegistry::ensure`] call is one
//! acquisition and returns a [`StyleHandle`] that releases it at most once.
//! When an [`Owner`](crate::reactive::Owner) is current, the owner releases
//! the handle on disposal. The node is detached only when the count drops to
//! zero, so a sibling that unmounts first does not strip a style another
//! component still uses.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::dom::{Document, NodeId, Placement};
use crate::error::{Error, Result};
use crate::reactive::on_cleanup;

/// Where a style resource is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// The document `<head>`.
    Global,
    /// A specific container element.
    Local(NodeId),
}

/// One acquisition of a style resource.
///
/// Clones refer to the same acquisition. Handles compare equal when they
/// point at the same `<style>` node.
#[derive(Debug, Clone)]
pub struct StyleHandle {
    /// The container the style node is attached to.
    pub container: NodeId,
    /// The `<style>` node.
    pub node: NodeId,
    /// The style body.
    pub body: Arc<str>,
    registry: StyleRegistry,
    released: Arc<AtomicBool>,
}

impl StyleHandle {
    /// Give up this acquisition.
    ///
    /// Returns `false` if it was already released, by this handle, a clone,
    /// or the owning scope.
    pub fn release(&self) -> bool {
        if self.released.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.registry
            .release_key(&(self.container, Arc::clone(&self.body)))
    }

    /// Whether this acquisition has been released.
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

impl PartialEq for StyleHandle {
    fn eq(&self, other: &Self) -> bool {
        self.container == other.container && self.node == other.node && self.body == other.body
    }
}

impl Eq for StyleHandle {}

type StyleKey = (NodeId, Arc<str>);

#[derive(Debug)]
struct StyleEntry {
    node: NodeId,
    refs: usize,
}

/// The per-document style cache.
///
/// One registry serves one [`Document`] and lives as long as it; clones share
/// the same cache. Pass it to whatever mounts views instead of reaching for a
/// global.
#[derive(Clone)]
pub struct StyleRegistry {
    document: Document,
    entries: Arc<DashMap<StyleKey, StyleEntry>>,
}

impl StyleRegistry {
    /// Create an empty registry for a document.
    pub fn new(document: Document) -> Self {
        Self {
            document,
            entries: Arc::new(DashMap::new()),
        }
    }

    /// The document this registry writes to.
    pub fn document(&self) -> &Document {
        &self.document
    }

    fn container(&self, scope: Scope) -> NodeId {
        match scope {
            Scope::Global => self.document.head(),
            Scope::Local(node) => node,
        }
    }

    /// Acquire the style for `body` in `scope`, creating it if absent.
    ///
    /// The acquisition is released when the current owner is disposed. With
    /// no owner it stays until [`StyleHandle::release`] is called.
    pub fn ensure(&self, scope: Scope, body: &str, placement: Placement) -> Result<StyleHandle> {
        let container = self.container(scope);
        if !self.document.contains(container) {
            return Err(Error::NodeNotFound(container));
        }

        let key: StyleKey = (container, Arc::from(body));
        let node = match self.entries.entry(key.clone()) {
            Entry::Occupied(mut entry) => {
                let entry = entry.get_mut();
                entry.refs += 1;
                tracing::trace!(node = entry.node.raw(), refs = entry.refs, "style reused");
                entry.node
            }
            Entry::Vacant(entry) => {
                let node = self.create_style(container, body, placement)?;
                entry.insert(StyleEntry { node, refs: 1 });
                tracing::debug!(
                    container = container.raw(),
                    node = node.raw(),
                    ?placement,
                    "style injected"
                );
                node
            }
        };

        let handle = StyleHandle {
            container,
            node,
            body: key.1,
            registry: self.clone(),
            released: Arc::new(AtomicBool::new(false)),
        };
        let lease = handle.clone();
        on_cleanup(move || {
            lease.release();
        });

        Ok(handle)
    }

    fn create_style(&self, container: NodeId, body: &str, placement: Placement) -> Result<NodeId> {
        let style = self.document.create_element("style");
        self.document.set_attribute(style, "type", "text/css")?;
        let text = self.document.create_text(body);
        self.document.append_child(style, text)?;
        if let Err(err) = self.document.insert(container, style, placement) {
            self.document.remove(style);
            return Err(err);
        }
        Ok(style)
    }

    fn release_key(&self, key: &StyleKey) -> bool {
        let detached = match self.entries.entry(key.clone()) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().refs -= 1;
                if entry.get().refs == 0 {
                    Some(entry.remove().node)
                } else {
                    None
                }
            }
            Entry::Vacant(_) => return false,
        };

        if let Some(node) = detached {
            self.document.remove(node);
            tracing::debug!(container = key.0.raw(), node = node.raw(), "style released");
        }
        true
    }

    /// Whether a style for `body` is live in `scope`.
    pub fn contains(&self, scope: Scope, body: &str) -> bool {
        self.ref_count(scope, body) > 0
    }

    /// Current acquisition count for `body` in `scope`.
    pub fn ref_count(&self, scope: Scope, body: &str) -> usize {
        let key: StyleKey = (self.container(scope), Arc::from(body));
        self.entries.get(&key).map_or(0, |entry| entry.refs)
    }

    /// Number of live style resources across all scopes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no style resource is live.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A helper bound to one scope and placement.
    pub fn css(&self, scope: Scope, placement: Placement) -> Css {
        Css {
            registry: self.clone(),
            scope,
            placement,
        }
    }
}

impl std::fmt::Debug for StyleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StyleRegistry")
            .field("entries", &self.len())
            .finish()
    }
}

/// Style injector bound to a scope and a placement.
#[derive(Clone, Debug)]
pub struct Css {
    registry: StyleRegistry,
    scope: Scope,
    placement: Placement,
}

impl Css {
    /// Acquire `body` in this helper's scope.
    pub fn inject(&self, body: &str) -> Result<StyleHandle> {
        self.registry.ensure(self.scope, body, self.placement)
    }

    /// The scope styles are attached to.
    pub fn scope(&self) -> Scope {
        self.scope
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Owner;

    fn styles_in(doc: &Document, container: NodeId) -> Vec<String> {
        doc.find_all(container, "style")
            .into_iter()
            .map(|n| doc.text_content(n))
            .collect()
    }

    #[test]
    fn ensure_deduplicates_within_a_scope() {
        let doc = Document::new();
        let styles = StyleRegistry::new(doc.clone());
        let owner = Owner::root();

        let handles: Vec<_> = owner.run(|| {
            (0..10)
                .map(|_| styles.ensure(Scope::Global, ".a{}", Placement::Append).unwrap())
                .collect()
        });

        assert!(handles.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(styles_in(&doc, doc.head()), vec![".a{}"]);
        assert_eq!(styles.ref_count(Scope::Global, ".a{}"), 10);
        assert_eq!(
            doc.attribute(handles[0].node, "type").as_deref(),
            Some("text/css")
        );

        owner.dispose();
        assert!(styles.is_empty());
        assert!(styles_in(&doc, doc.head()).is_empty());
    }

    #[test]
    fn identity_is_exact_text() {
        let doc = Document::new();
        let styles = StyleRegistry::new(doc.clone());
        let owner = Owner::root();

        owner.run(|| {
            styles.ensure(Scope::Global, ".a{color:red}", Placement::Append).unwrap();
            styles.ensure(Scope::Global, ".a { color: red }", Placement::Append).unwrap();
        });

        assert_eq!(styles.len(), 2);
    }

    #[test]
    fn scopes_are_independent() {
        let doc = Document::new();
        let container = doc.create_element("section");
        doc.append_child(doc.body(), container).unwrap();
        let styles = StyleRegistry::new(doc.clone());
        let owner = Owner::root();

        owner.run(|| {
            styles.ensure(Scope::Global, "p{}", Placement::Append).unwrap();
            styles.ensure(Scope::Local(container), "p{}", Placement::Append).unwrap();
        });

        assert_eq!(styles_in(&doc, doc.head()), vec!["p{}"]);
        assert_eq!(styles_in(&doc, container), vec!["p{}"]);
    }

    #[test]
    fn prepend_places_style_first() {
        let doc = Document::new();
        let container = doc.create_element("div");
        let existing = doc.create_element("span");
        doc.append_child(container, existing).unwrap();
        let styles = StyleRegistry::new(doc.clone());

        let owner = Owner::root();
        let handle = owner.run(|| {
            styles
                .css(Scope::Local(container), Placement::Prepend)
                .inject("span{}")
                .unwrap()
        });

        assert_eq!(doc.children(container), vec![handle.node, existing]);
    }

    #[test]
    fn shared_style_survives_until_last_owner() {
        let doc = Document::new();
        let styles = StyleRegistry::new(doc.clone());
        let first = Owner::root();
        let second = Owner::root();

        first.run(|| styles.ensure(Scope::Global, "x{}", Placement::Append).unwrap());
        second.run(|| styles.ensure(Scope::Global, "x{}", Placement::Append).unwrap());

        first.dispose();
        assert!(styles.contains(Scope::Global, "x{}"));
        assert_eq!(styles_in(&doc, doc.head()).len(), 1);

        second.dispose();
        assert!(!styles.contains(Scope::Global, "x{}"));
        assert!(styles_in(&doc, doc.head()).is_empty());
    }

    #[test]
    fn explicit_release_without_owner() {
        let doc = Document::new();
        let styles = StyleRegistry::new(doc.clone());

        let handle = styles.ensure(Scope::Global, "y{}", Placement::Append).unwrap();
        assert!(handle.release());
        assert!(!handle.clone().release());
        assert!(handle.is_released());
        assert!(styles.is_empty());
    }

    #[test]
    fn explicit_release_does_not_double_count_with_owner() {
        let doc = Document::new();
        let styles = StyleRegistry::new(doc.clone());
        let first = Owner::root();
        let second = Owner::root();

        let handle = first.run(|| styles.ensure(Scope::Global, "q{}", Placement::Append).unwrap());
        second.run(|| styles.ensure(Scope::Global, "q{}", Placement::Append).unwrap());

        assert!(handle.release());
        assert_eq!(styles.ref_count(Scope::Global, "q{}"), 1);

        // The owner's own release finds the acquisition already returned.
        first.dispose();
        assert!(styles.contains(Scope::Global, "q{}"));
        assert_eq!(styles_in(&doc, doc.head()).len(), 1);

        second.dispose();
        assert!(styles.is_empty());
        assert!(styles_in(&doc, doc.head()).is_empty());
    }

    #[test]
    fn concurrent_ensure_creates_one_node() {
        const THREADS: usize = 8;
        let doc = Document::new();
        let styles = StyleRegistry::new(doc.clone());
        let barrier = std::sync::Barrier::new(THREADS);

        let handles: Vec<StyleHandle> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..THREADS)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        styles.ensure(Scope::Global, "body-x{}", Placement::Append).unwrap()
                    })
                })
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });

        assert_eq!(styles_in(&doc, doc.head()), vec!["body-x{}"]);
        assert_eq!(styles.ref_count(Scope::Global, "body-x{}"), THREADS);
        assert!(handles.windows(2).all(|w| w[0] == w[1]));

        for handle in &handles[1..] {
            assert!(handle.release());
        }
        assert_eq!(styles_in(&doc, doc.head()).len(), 1);

        assert!(handles[0].release());
        assert!(styles_in(&doc, doc.head()).is_empty());
        assert!(styles.is_empty());
    }

    #[test]
    fn missing_container_is_an_error() {
        let doc = Document::new();
        let styles = StyleRegistry::new(doc);
        let ghost = NodeId::new();

        let err = styles
            .ensure(Scope::Local(ghost), "z{}", Placement::Append)
            .unwrap_err();
        assert!(matches!(err, Error::NodeNotFound(id) if id == ghost));
        assert!(styles.is_empty());
    }
}
