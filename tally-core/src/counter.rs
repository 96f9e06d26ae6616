//! Counter elements.
//!
//! `<counter-state>` owns one counter channel and provides it to its light
//! children. `<current-count>`, `<sub-button>` and `<add-button>` consume the
//! nearest one; rendered outside a `<counter-state>` they fail with
//! [`Error::MissingProvider`](crate::Error::MissingProvider).

use std::sync::{Arc, OnceLock};

use crate::element::{el, AttributeSpec, Cx, ElementRegistry, View};
use crate::error::Result;
use crate::reactive::{create_channel, Channel, Context};

/// Provider tag.
pub const COUNTER_STATE: &str = "counter-state";
/// Display tag.
pub const CURRENT_COUNT: &str = "current-count";
/// Decrement tag.
pub const SUB_BUTTON: &str = "sub-button";
/// Increment tag.
pub const ADD_BUTTON: &str = "add-button";
/// Attribute holding the provider's starting value.
pub const INITIAL_COUNT: &str = "initial-count";
/// Attribute on the button elements forwarded as the inner button's
/// `tabindex`.
pub const BUTTON_TAB_INDEX: &str = "button-tabindex";

/// The shared counter state.
pub type CounterChannel = Channel<i64>;

/// Context key the counter channel is provided under.
pub fn counter_context() -> &'static Context<CounterChannel> {
    static CONTEXT: OnceLock<Context<CounterChannel>> = OnceLock::new();
    CONTEXT.get_or_init(|| Context::new(COUNTER_STATE).with_hint("wrap <counter-state>"))
}

/// Register the four counter elements.
pub fn define_counter_elements(registry: &ElementRegistry) -> Result<()> {
    registry.define(
        COUNTER_STATE,
        vec![AttributeSpec::int(INITIAL_COUNT, 0)],
        |cx| {
            tracing::debug!(props = ?cx.props(), "counter-state");
            let initial = cx.props().int(INITIAL_COUNT).unwrap_or_default();
            let channel = create_channel(initial);
            Ok(View::provide(
                counter_context().bind(channel),
                [View::slot(Vec::<View>::new())],
            ))
        },
    )?;

    registry.define(CURRENT_COUNT, Vec::new(), |_| {
        let channel = counter_context().consume()?;
        Ok(View::dynamic(move || channel.read().to_string()))
    })?;

    registry.define(SUB_BUTTON, button_attributes(), |cx| {
        let channel = counter_context().consume()?;
        Ok(button(cx, "-", move || {
            channel.update(|count| count - 1);
        }))
    })?;

    registry.define(ADD_BUTTON, button_attributes(), |cx| {
        let channel = counter_context().consume()?;
        Ok(button(cx, "+", move || {
            channel.update(|count| count + 1);
        }))
    })?;

    Ok(())
}

fn button_attributes() -> Vec<AttributeSpec> {
    vec![AttributeSpec::int(BUTTON_TAB_INDEX, 0)]
}

/// A focusable div acting as a button. Space activates it like a click.
fn button<F>(cx: &Cx, label: &str, on_click: F) -> View
where
    F: Fn() + Send + Sync + 'static,
{
    let document = cx.document().clone();
    let tab_index = cx.props().int(BUTTON_TAB_INDEX).unwrap_or_default();
    let on_click = Arc::new(on_click);
    el("div")
        .attr("part", "button")
        .attr("tabindex", tab_index)
        .on("click", move |_| on_click())
        .on("keydown", move |event| {
            if event.key() != Some(" ") {
                return;
            }
            // Keep the page from scrolling.
            event.prevent_default();
            if let Err(err) = document.click(event.current_target()) {
                tracing::warn!(error = %err, "button activation failed");
            }
        })
        .child(View::slot([label]))
        .into()
}
