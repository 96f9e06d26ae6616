//! View descriptions.
//!
//! A [`View`] describes what to build; the [`Mounter`](super::Mounter) turns it
//! into document nodes. Views are plain data plus closures, so render
//! functions can build them without touching the document.

use std::sync::Arc;

use indexmap::IndexMap;

use super::cx::Cx;
use crate::dom::{Event, Listener};
use crate::error::Result;
use crate::reactive::Provided;

/// Text computed from reactive state; re-evaluated whenever a signal it
/// reads changes.
pub type TextFn = Arc<dyn Fn() -> String + Send + Sync>;

/// A function component, rendered under its own owner.
pub type ComponentFn = Arc<dyn Fn(&Cx) -> Result<View> + Send + Sync>;

/// A description of document content.
#[derive(Clone)]
pub enum View {
    /// An element, custom or plain.
    Element(ElementView),
    /// Static text.
    Text(String),
    /// Reactive text.
    Dynamic(TextFn),
    /// Where a custom element places its light children; the views are the
    /// fallback used when there are none.
    Slot(Vec<View>),
    /// Children constructed with a context value provided.
    Provide(Provided, Vec<View>),
    /// A function component.
    Component(ComponentFn),
    /// Several views with no wrapper.
    Fragment(Vec<View>),
}

impl View {
    /// Reactive text.
    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        View::Dynamic(Arc::new(f))
    }

    /// A function component.
    pub fn component<F>(f: F) -> Self
    where
        F: Fn(&Cx) -> Result<View> + Send + Sync + 'static,
    {
        View::Component(Arc::new(f))
    }

    /// A slot with fallback content.
    pub fn slot<I, V>(fallback: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<View>,
    {
        View::Slot(fallback.into_iter().map(Into::into).collect())
    }

    /// Construct `children` with `value` provided.
    pub fn provide<I, V>(value: Provided, children: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<View>,
    {
        View::Provide(value, children.into_iter().map(Into::into).collect())
    }
}

impl std::fmt::Debug for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            View::Element(element) => element.fmt(f),
            View::Text(text) => f.debug_tuple("Text").field(text).finish(),
            View::Dynamic(_) => f.write_str("Dynamic(..)"),
            View::Slot(fallback) => f.debug_tuple("Slot").field(fallback).finish(),
            View::Provide(value, children) => f
                .debug_tuple("Provide")
                .field(&value.name())
                .field(children)
                .finish(),
            View::Component(_) => f.write_str("Component(..)"),
            View::Fragment(children) => f.debug_tuple("Fragment").field(children).finish(),
        }
    }
}

impl From<ElementView> for View {
    fn from(element: ElementView) -> Self {
        View::Element(element)
    }
}

impl From<&str> for View {
    fn from(text: &str) -> Self {
        View::Text(text.to_owned())
    }
}

impl From<String> for View {
    fn from(text: String) -> Self {
        View::Text(text)
    }
}

/// An element description.
#[derive(Clone)]
pub struct ElementView {
    pub(crate) tag: String,
    pub(crate) attributes: IndexMap<String, String>,
    pub(crate) listeners: Vec<(&'static str, Listener)>,
    pub(crate) children: Vec<View>,
}

impl ElementView {
    /// Set an attribute.
    pub fn attr(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.attributes.insert(name.into(), value.to_string());
        self
    }

    /// Set an attribute when `value` is present.
    pub fn attr_opt(self, name: impl Into<String>, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.attr(name, value),
            None => self,
        }
    }

    /// Add an event listener.
    pub fn on<F>(mut self, event: &'static str, listener: F) -> Self
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.listeners.push((event, Arc::new(listener)));
        self
    }

    /// Add a child.
    pub fn child(mut self, child: impl Into<View>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Add several children.
    pub fn children<I, V>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<View>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    /// The tag name.
    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl std::fmt::Debug for ElementView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("tag", &self.tag)
            .field("attributes", &self.attributes)
            .field("listeners", &self.listeners.len())
            .field("children", &self.children)
            .finish()
    }
}

/// Start an element description.
pub fn el(tag: impl Into<String>) -> ElementView {
    ElementView {
        tag: tag.into(),
        attributes: IndexMap::new(),
        listeners: Vec::new(),
        children: Vec::new(),
    }
}
