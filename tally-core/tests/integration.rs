//! Integration Tests for Counters and Styles
//!
//! These tests drive the counter page through the document: mounting,
//! clicking, batching and tearing down.

use std::sync::Arc;

use parking_lot::Mutex;

use tally_core::counter::{ADD_BUTTON, CURRENT_COUNT, SUB_BUTTON};
use tally_core::dom::{Document, EventKind, NodeId};
use tally_core::element::{el, View};
use tally_core::reactive::{batch, create_channel, Effect};
use tally_core::style::Scope;
use tally_core::{App, AppConfig, Error, COUNTER_CSS};

fn displays(doc: &Document) -> Vec<String> {
    doc.find_all(doc.body(), CURRENT_COUNT)
        .into_iter()
        .map(|node| doc.text_content(node))
        .collect()
}

/// The inner `part="button"` div of the `index`-th element with `tag`.
fn button(doc: &Document, tag: &str, index: usize) -> NodeId {
    let host = doc.find_all(doc.body(), tag)[index];
    doc.find_first(host, "div").unwrap()
}

/// Test that each counter owns its own state.
#[test]
fn counters_are_isolated() {
    let app = App::new().unwrap();
    let doc = app.document().clone();
    let _handle = app.mount(&AppConfig::default()).unwrap();

    doc.click(button(&doc, ADD_BUTTON, 3)).unwrap();
    doc.click(button(&doc, SUB_BUTTON, 7)).unwrap();
    doc.click(button(&doc, SUB_BUTTON, 7)).unwrap();

    assert_eq!(
        displays(&doc),
        ["0", "10", "20", "31", "40", "50", "60", "68", "80", "90"]
    );
}

/// Test that the space key activates a button the same way a click does.
#[test]
fn space_key_clicks_the_focused_button() {
    let app = App::new().unwrap();
    let doc = app.document().clone();
    let config = AppConfig {
        counters: vec![Some(5), Some(5)],
        ..AppConfig::default()
    };
    let _handle = app.mount(&config).unwrap();

    let event = doc
        .dispatch(button(&doc, SUB_BUTTON, 1), EventKind::KeyDown(" ".into()))
        .unwrap();

    assert!(event.default_prevented());
    assert_eq!(displays(&doc), ["5", "4"]);
}

/// Test that writes within one batch are seen as one final value.
#[test]
fn batched_writes_settle_on_the_final_value() {
    let channel = create_channel(10);
    let seen = Arc::new(Mutex::new(Vec::new()));

    let reader = channel.clone();
    let log = seen.clone();
    let _effect = Effect::new(move || log.lock().push(reader.read()));

    batch(|| {
        channel.update(|x| x - 1);
        // Reads inside the batch see every write so far.
        assert_eq!(channel.peek(), 9);
        channel.update(|x| x + 1);
    });

    // One run on creation, one after the batch. Never 9 or 11.
    assert_eq!(channel.peek(), 10);
    assert_eq!(*seen.lock(), vec![10, 10]);
}

/// Test the same scenario through the rendered display.
#[test]
fn batched_clicks_never_paint_an_intermediate_value() {
    let app = App::new().unwrap();
    let doc = app.document().clone();
    let config = AppConfig {
        counters: vec![Some(10)],
        ..AppConfig::default()
    };
    let _handle = app.mount(&config).unwrap();

    let display = doc.find_first(doc.body(), CURRENT_COUNT).unwrap();
    let text = doc.children(display)[0];
    let painted = Arc::new(Mutex::new(Vec::new()));

    batch(|| {
        doc.click(button(&doc, SUB_BUTTON, 0)).unwrap();
        painted.lock().push(doc.text_content(text));
        doc.click(button(&doc, ADD_BUTTON, 0)).unwrap();
        painted.lock().push(doc.text_content(text));
    });
    painted.lock().push(doc.text_content(text));

    assert_eq!(*painted.lock(), vec!["10", "10", "10"]);

    batch(|| {
        doc.click(button(&doc, ADD_BUTTON, 0)).unwrap();
        doc.click(button(&doc, ADD_BUTTON, 0)).unwrap();
    });
    assert_eq!(doc.text_content(text), "12");
}

/// Test that a consumer with no provider fails before rendering anything.
#[test]
fn missing_provider_produces_no_output() {
    let app = App::new().unwrap();
    let doc = app.document().clone();
    let before = doc.node_count();

    let view: View = el("div")
        .child(el(SUB_BUTTON))
        .child(el(CURRENT_COUNT))
        .into();
    let err = app.mounter().mount(&view, doc.body()).unwrap_err();

    assert!(matches!(
        err,
        Error::MissingProvider {
            context: "counter-state",
            ..
        }
    ));
    assert_eq!(doc.to_html(doc.body()), "<body></body>");
    assert_eq!(doc.node_count(), before);
}

/// Test that ten counters share one stylesheet.
#[test]
fn stylesheet_is_injected_once() {
    let app = App::new().unwrap();
    let doc = app.document().clone();
    let _handle = app.mount(&AppConfig::default()).unwrap();

    let styles = doc.find_all(doc.head(), "style");
    assert_eq!(styles.len(), 1);
    assert_eq!(doc.text_content(styles[0]), COUNTER_CSS);
    assert_eq!(app.styles().len(), 1);
}

/// Test that the stylesheet outlives all but the last of its users.
#[test]
fn stylesheet_is_released_with_its_last_user() {
    let app = App::new().unwrap();
    let doc = app.document().clone();
    let one = AppConfig {
        counters: vec![Some(1)],
        ..AppConfig::default()
    };

    let first = app.mount(&one).unwrap();
    let second = app.mount(&one).unwrap();
    assert_eq!(app.styles().ref_count(Scope::Global, COUNTER_CSS), 2);

    first.unmount();
    assert_eq!(doc.find_all(doc.head(), "style").len(), 1);
    assert!(app.styles().contains(Scope::Global, COUNTER_CSS));

    drop(second);
    assert!(doc.find_all(doc.head(), "style").is_empty());
    assert!(!app.styles().contains(Scope::Global, COUNTER_CSS));
}

/// Test that unmounting stops updates and detaches listeners.
#[test]
fn unmount_removes_everything() {
    let app = App::new().unwrap();
    let doc = app.document().clone();
    let before = doc.node_count();

    let handle = app.mount(&AppConfig::default()).unwrap();
    let add = button(&doc, ADD_BUTTON, 0);
    handle.unmount();

    assert_eq!(doc.node_count(), before);
    assert!(matches!(doc.click(add), Err(Error::NodeNotFound(id)) if id == add));
}

/// Test that the configuration round-trips into the page.
#[test]
fn json_config_drives_the_page() {
    let config = AppConfig::from_json(r#"{ "counters": [null, 7, -3] }"#).unwrap();
    let app = App::new().unwrap();
    let doc = app.document().clone();
    let _handle = app.mount(&config).unwrap();

    assert_eq!(displays(&doc), ["0", "7", "-3"]);
}
