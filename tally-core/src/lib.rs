//! Tally Core
//!
//! Fine-grained reactive custom elements over an in-memory document.
//! It implements:
//!
//! - Reactive primitives (signals, effects, batches, owners)
//! - Typed provider/consumer contexts
//! - Custom element registration with typed attributes and slots
//! - A deduplicated, reference-counted style registry
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: Core reactive primitives and dependency tracking
//! - `dom`: Arena document with attributes, text and bubbling events
//! - `element`: Element registry, view descriptions and the mounter
//! - `style`: Shared `<style>` injection keyed by container and body
//! - `counter`: The counter elements built on the above
//! - `app`: The demo page of ten independent counters
//!
//! # Example
//!
//! ```rust
//! use tally_core::{App, AppConfig};
//!
//! let app = App::new().unwrap();
//! let handle = app.mount(&AppConfig::default()).unwrap();
//!
//! let doc = app.document();
//! assert_eq!(doc.find_all(doc.head(), "style").len(), 1);
//! assert_eq!(doc.find_all(doc.body(), "counter-state").len(), 10);
//!
//! handle.unmount();
//! assert!(app.styles().is_empty());
//! ```

pub mod app;
pub mod config;
pub mod counter;
pub mod dom;
pub mod element;
pub mod error;
pub mod reactive;
pub mod style;

pub use app::{app_view, counter_app, App, COUNTER_CSS};
pub use config::AppConfig;
pub use error::{Error, Result};
pub use reactive::{batch, create_channel, create_signal, Channel, Context, Effect, Owner, Signal};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
