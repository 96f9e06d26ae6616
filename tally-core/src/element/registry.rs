//! Element Registry
//!
//! Maps custom tag names to their definitions. A tag is registered once; the
//! mounter consults the registry for every element it instantiates and falls
//! back to a plain element for unknown tags.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use super::attribute::AttributeSpec;
use super::cx::Cx;
use super::view::View;
use crate::error::{Error, Result};

/// Render function of a custom element.
pub type RenderFn = Arc<dyn Fn(&Cx) -> Result<View> + Send + Sync>;

/// A registered custom element.
pub struct ElementDefinition {
    tag: String,
    attributes: Vec<AttributeSpec>,
    render: RenderFn,
}

impl ElementDefinition {
    /// The tag name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Declared attributes.
    pub fn attributes(&self) -> &[AttributeSpec] {
        &self.attributes
    }

    /// Render an instance.
    pub fn render(&self, cx: &Cx) -> Result<View> {
        (self.render)(cx)
    }
}

impl std::fmt::Debug for ElementDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementDefinition")
            .field("tag", &self.tag)
            .field("attributes", &self.attributes)
            .finish()
    }
}

/// Check the custom element naming rule: lowercase ASCII, starts with a
/// letter, contains a hyphen.
fn is_valid_tag(tag: &str) -> bool {
    let mut chars = tag.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && tag.contains('-')
        && tag
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '.' | '_'))
}

/// Registry of custom element definitions.
#[derive(Clone, Default)]
pub struct ElementRegistry {
    definitions: Arc<RwLock<IndexMap<String, Arc<ElementDefinition>>>>,
}

impl ElementRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a custom element.
    pub fn define<F>(&self, tag: &str, attributes: Vec<AttributeSpec>, render: F) -> Result<()>
    where
        F: Fn(&Cx) -> Result<View> + Send + Sync + 'static,
    {
        if !is_valid_tag(tag) {
            return Err(Error::InvalidTagName(tag.to_owned()));
        }

        let mut definitions = self.definitions.write();
        if definitions.contains_key(tag) {
            return Err(Error::AlreadyDefined(tag.to_owned()));
        }

        definitions.insert(
            tag.to_owned(),
            Arc::new(ElementDefinition {
                tag: tag.to_owned(),
                attributes,
                render: Arc::new(render),
            }),
        );
        tracing::debug!(tag, "element defined");
        Ok(())
    }

    /// Look up a definition.
    pub fn get(&self, tag: &str) -> Option<Arc<ElementDefinition>> {
        self.definitions.read().get(tag).cloned()
    }

    /// Whether a tag is registered.
    pub fn is_defined(&self, tag: &str) -> bool {
        self.definitions.read().contains_key(tag)
    }

    /// Registered tags in definition order.
    pub fn tags(&self) -> Vec<String> {
        self.definitions.read().keys().cloned().collect()
    }
}

impl std::fmt::Debug for ElementRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}
