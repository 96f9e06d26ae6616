//! Mounting
//!
//! [`Mounter::mount`] instantiates a [`View`] under a parent node. Every
//! custom element and function component renders under its own child
//! [`Owner`]; the whole mount sits under one more owner held by the returned
//! [`MountHandle`].
//!
//! Render functions run untracked. Provided contexts are pushed while the
//! subtree below a [`View::Provide`] is built, which is when consumers
//! resolve them.
//!
//! When a render function fails, that element's owner is disposed and its
//! host is removed before the error propagates; the top-level mount then
//! removes whatever else it had inserted. A panicking render unwinds through
//! the same teardown.

use super::attribute::Props;
use super::cx::Cx;
use super::registry::{ElementDefinition, ElementRegistry};
use super::view::{ElementView, View};
use crate::dom::{Document, NodeId};
use crate::error::{Error, Result};
use crate::reactive::{untrack, Effect, Owner};
use crate::style::StyleRegistry;

/// Builds views into a document.
#[derive(Clone, Debug)]
pub struct Mounter {
    document: Document,
    registry: ElementRegistry,
    styles: StyleRegistry,
}

impl Mounter {
    /// Create a mounter over a document, its element registry and its style
    /// cache.
    pub fn new(document: Document, registry: ElementRegistry, styles: StyleRegistry) -> Self {
        Self {
            document,
            registry,
            styles,
        }
    }

    /// The document views are built into.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The element registry.
    pub fn registry(&self) -> &ElementRegistry {
        &self.registry
    }

    /// The style cache.
    pub fn styles(&self) -> &StyleRegistry {
        &self.styles
    }

    /// Build `view` as the last children of `parent`.
    pub fn mount(&self, view: &View, parent: NodeId) -> Result<MountHandle> {
        if !self.document.contains(parent) {
            return Err(Error::NodeNotFound(parent));
        }

        // Dropping the handle on an error or an unwind tears down whatever
        // was built so far.
        let mut handle = MountHandle {
            owner: Owner::new(),
            nodes: Vec::new(),
            document: self.document.clone(),
            mounted: true,
        };
        let owner = handle.owner.clone();
        let result =
            owner.run(|| untrack(|| self.mount_view(view, parent, None, &mut handle.nodes)));

        match result {
            Ok(()) => {
                tracing::debug!(parent = parent.raw(), nodes = handle.nodes.len(), "mounted");
                Ok(handle)
            }
            Err(err) => {
                tracing::debug!(error = %err, "mount aborted");
                Err(err)
            }
        }
    }

    fn mount_view(
        &self,
        view: &View,
        parent: NodeId,
        slot: Option<&[View]>,
        out: &mut Vec<NodeId>,
    ) -> Result<()> {
        match view {
            View::Text(text) => {
                let node = self.document.create_text(text.as_str());
                self.document.append_child(parent, node)?;
                out.push(node);
            }
            View::Dynamic(text) => {
                let node = self.document.create_text("");
                self.document.append_child(parent, node)?;
                out.push(node);

                let document = self.document.clone();
                let text = text.clone();
                Effect::new(move || {
                    if document.set_text(node, text()).is_err() {
                        tracing::trace!(node = node.raw(), "text node gone");
                    }
                });
            }
            View::Element(element) => match self.registry.get(&element.tag) {
                Some(definition) => self.mount_custom(&definition, element, parent, out)?,
                None => self.mount_plain(element, parent, slot, out)?,
            },
            View::Slot(fallback) => {
                let content = match slot {
                    Some(children) if !children.is_empty() => children,
                    _ => fallback.as_slice(),
                };
                for child in content {
                    self.mount_view(child, parent, None, out)?;
                }
            }
            View::Provide(value, children) => {
                let _guard = value.enter();
                for child in children {
                    self.mount_view(child, parent, slot, out)?;
                }
            }
            View::Component(render) => {
                let owner = Owner::new();
                let result = owner.run(|| {
                    let cx = self.cx(None, Props::default());
                    let rendered = render(&cx)?;
                    self.mount_view(&rendered, parent, slot, out)
                });
                if result.is_err() {
                    owner.dispose();
                }
                result?;
            }
            View::Fragment(children) => {
                for child in children {
                    self.mount_view(child, parent, slot, out)?;
                }
            }
        }
        Ok(())
    }

    fn mount_plain(
        &self,
        element: &ElementView,
        parent: NodeId,
        slot: Option<&[View]>,
        out: &mut Vec<NodeId>,
    ) -> Result<()> {
        let node = self.create_host(element, parent)?;
        out.push(node);

        let mut inner = Vec::new();
        for child in &element.children {
            self.mount_view(child, node, slot, &mut inner)?;
        }
        Ok(())
    }

    fn mount_custom(
        &self,
        definition: &ElementDefinition,
        element: &ElementView,
        parent: NodeId,
        out: &mut Vec<NodeId>,
    ) -> Result<()> {
        let host = self.create_host(element, parent)?;
        out.push(host);

        let props = Props::resolve(definition.attributes(), &element.attributes);
        let owner = Owner::new();
        let result = owner.run(|| {
            let cx = self.cx(Some(host), props);
            let rendered = definition.render(&cx)?;
            let mut inner = Vec::new();
            self.mount_view(&rendered, host, Some(element.children.as_slice()), &mut inner)
        });

        if let Err(err) = result {
            tracing::debug!(tag = definition.tag(), error = %err, "element render failed");
            owner.dispose();
            self.document.remove(host);
            out.retain(|node| *node != host);
            return Err(err);
        }
        Ok(())
    }

    fn create_host(&self, element: &ElementView, parent: NodeId) -> Result<NodeId> {
        let node = self.document.create_element(element.tag.as_str());
        for (name, value) in &element.attributes {
            self.document.set_attribute(node, name, value.as_str())?;
        }
        for &(event, ref listener) in &element.listeners {
            let listener = listener.clone();
            self.document.add_listener(node, event, move |e| listener(e))?;
        }
        if let Err(err) = self.document.append_child(parent, node) {
            self.document.remove(node);
            return Err(err);
        }
        Ok(node)
    }

    fn cx(&self, host: Option<NodeId>, props: Props) -> Cx {
        Cx {
            document: self.document.clone(),
            styles: self.styles.clone(),
            host,
            props,
        }
    }
}

/// A mounted view. Dropping it tears the view down.
pub struct MountHandle {
    owner: Owner,
    nodes: Vec<NodeId>,
    document: Document,
    mounted: bool,
}

impl MountHandle {
    /// Top-level nodes inserted under the parent.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// The owner of everything the mount created.
    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    /// Dispose the mount's owner and remove its nodes.
    pub fn unmount(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;

        self.owner.dispose();
        for node in self.nodes.drain(..) {
            self.document.remove(node);
        }
        tracing::debug!("unmounted");
    }
}

impl Drop for MountHandle {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for MountHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MountHandle")
            .field("nodes", &self.nodes)
            .field("mounted", &self.mounted)
            .finish()
    }
}
