//! Custom Elements
//!
//! Declarative registration of custom tags, view descriptions, and the
//! mounter that builds views into a [`Document`](crate::dom::Document).
//!
//! A custom element is a tag name, a list of typed attributes with defaults,
//! and a render function returning a [`View`]. Its light children are placed
//! wherever the rendered view contains a [`View::Slot`].

mod attribute;
mod cx;
mod mount;
mod registry;
mod view;

pub use attribute::{AttrValue, AttributeSpec, Props};
pub use cx::Cx;
pub use mount::{MountHandle, Mounter};
pub use registry::{ElementDefinition, ElementRegistry, RenderFn};
pub use view::{el, ComponentFn, ElementView, TextFn, View};
