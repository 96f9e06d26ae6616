//! Render context handed to element and component render functions.

use super::attribute::Props;
use crate::dom::{Document, NodeId, Placement};
use crate::error::Result;
use crate::style::{Scope, StyleHandle, StyleRegistry};

/// What a render function can see while it runs.
///
/// Render functions run under their own owner, so styles acquired through
/// [`Cx::css`] are released when the rendered element is torn down.
#[derive(Clone, Debug)]
pub struct Cx {
    pub(crate) document: Document,
    pub(crate) styles: StyleRegistry,
    pub(crate) host: Option<NodeId>,
    pub(crate) props: Props,
}

impl Cx {
    /// The document being built.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The style cache.
    pub fn styles(&self) -> &StyleRegistry {
        &self.styles
    }

    /// The host element, for custom elements.
    pub fn host(&self) -> Option<NodeId> {
        self.host
    }

    /// Resolved attributes, for custom elements.
    pub fn props(&self) -> &Props {
        &self.props
    }

    /// Acquire a document-wide style, appended to `<head>`.
    pub fn css(&self, body: &str) -> Result<StyleHandle> {
        self.styles.ensure(Scope::Global, body, Placement::Append)
    }

    /// Acquire a style in a specific scope.
    pub fn css_in(&self, scope: Scope, placement: Placement, body: &str) -> Result<StyleHandle> {
        self.styles.ensure(scope, body, placement)
    }
}
