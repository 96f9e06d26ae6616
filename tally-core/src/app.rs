//! The counter demo page.

use crate::config::AppConfig;
use crate::counter::{
    define_counter_elements, ADD_BUTTON, COUNTER_STATE, CURRENT_COUNT, INITIAL_COUNT, SUB_BUTTON,
};
use crate::dom::{Document, Placement};
use crate::element::{el, ElementRegistry, MountHandle, Mounter, View};
use crate::error::Result;
use crate::style::{Scope, StyleRegistry};

/// Stylesheet shared by every counter on the page.
pub const COUNTER_CSS: &str = r#"
.card {
	padding: 16px;
	border-radius: 1000px;
	background-color: white;
	box-shadow: 0 0 0 4px hsl(0 0% 0% / 25%);

	/* Flexbox */
	display: flex;
	flex-direction: row;
	align-items: center; /* Center y-axis */
	gap: 16px;

	-webkit-user-select: none;
	user-select: none;
}
:is(sub-button, add-button)::part(button) {
	height: 32px;
	aspect-ratio: 3;
	border-radius: 1000px;
	background-color: lightgray;

	/* CSS Grid*/
	display: grid;
	place-items: center;

	cursor: pointer;
	-webkit-user-select: none;
	user-select: none;
}
:is(sub-button, add-button)::part(button):hover:active {
	background-color: gray;
}
"#;

/// One counter card with its stylesheet.
pub fn counter_app(initial: Option<i64>, placement: Placement) -> View {
    View::component(move |cx| {
        cx.css_in(Scope::Global, placement, COUNTER_CSS)?;
        Ok(el(COUNTER_STATE)
            .attr_opt(INITIAL_COUNT, initial)
            .child(
                el("div")
                    .attr("class", "card")
                    .child(el(SUB_BUTTON))
                    .child(el(CURRENT_COUNT))
                    .child(el(ADD_BUTTON)),
            )
            .into())
    })
}

/// The page: a centered column of counters.
pub fn app_view(config: &AppConfig) -> View {
    let placement = config.placement;
    el("div")
        .attr("class", "py-64px flex-row flex-justify-center")
        .child(
            el("div")
                .attr("class", "flex-basis-224px flex-col gap-16px")
                .children(
                    config
                        .counters
                        .iter()
                        .map(|initial| counter_app(*initial, placement)),
                ),
        )
        .into()
}

/// A document with the counter elements defined.
#[derive(Clone, Debug)]
pub struct App {
    mounter: Mounter,
}

impl App {
    /// Create an empty document and register the counter elements.
    pub fn new() -> Result<Self> {
        let document = Document::new();
        let registry = ElementRegistry::new();
        define_counter_elements(&registry)?;
        let styles = StyleRegistry::new(document.clone());

        tracing::info!(elements = ?registry.tags(), "app ready");
        Ok(Self {
            mounter: Mounter::new(document, registry, styles),
        })
    }

    /// The document the page is built into.
    pub fn document(&self) -> &Document {
        self.mounter.document()
    }

    /// The shared style cache.
    pub fn styles(&self) -> &StyleRegistry {
        self.mounter.styles()
    }

    /// The mounter, for views other than the page.
    pub fn mounter(&self) -> &Mounter {
        &self.mounter
    }

    /// Render the page into `<body>`.
    pub fn mount(&self, config: &AppConfig) -> Result<MountHandle> {
        tracing::debug!(counters = config.counters.len(), "mounting app");
        self.mounter
            .mount(&app_view(config), self.mounter.document().body())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_one_card_per_configured_counter() {
        let app = App::new().unwrap();
        let doc = app.document().clone();
        let _handle = app.mount(&AppConfig::default()).unwrap();

        let counts: Vec<String> = doc
            .find_all(doc.body(), CURRENT_COUNT)
            .into_iter()
            .map(|node| doc.text_content(node))
            .collect();
        assert_eq!(
            counts,
            ["0", "10", "20", "30", "40", "50", "60", "70", "80", "90"]
        );
    }

    #[test]
    fn stylesheet_is_shared() {
        let app = App::new().unwrap();
        let doc = app.document().clone();
        let handle = app.mount(&AppConfig::default()).unwrap();

        assert_eq!(doc.find_all(doc.head(), "style").len(), 1);
        assert_eq!(app.styles().ref_count(Scope::Global, COUNTER_CSS), 10);

        drop(handle);
        assert!(doc.find_all(doc.head(), "style").is_empty());
        assert!(app.styles().is_empty());
    }

    #[test]
    fn prepend_placement_puts_the_style_first() {
        let app = App::new().unwrap();
        let doc = app.document().clone();
        let marker = doc.create_element("meta");
        doc.append_child(doc.head(), marker).unwrap();

        let config = AppConfig {
            counters: vec![Some(1)],
            placement: Placement::Prepend,
        };
        let _handle = app.mount(&config).unwrap();

        let head = doc.children(doc.head());
        assert_eq!(head.len(), 2);
        assert_eq!(doc.tag(head[0]).as_deref(), Some("style"));
        assert_eq!(head[1], marker);
    }
}
