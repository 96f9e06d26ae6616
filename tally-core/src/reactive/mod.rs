//! Reactive Primitives
//!
//! This module implements the reactive core: signals, effects, batching,
//! ownership scopes and the provider/consumer context stack.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a container for mutable state. Reading it inside an effect
//! registers the effect as a dependent; writing it queues every dependent.
//!
//! ## Effects
//!
//! An Effect is a side-effecting computation that re-runs when its
//! dependencies change. Effects keep the document in sync with state.
//!
//! ## Batches
//!
//! Writes inside [`batch`] coalesce: each dependent effect runs once, after
//! the outermost batch ends, and observes only the final values.
//!
//! ## Owners
//!
//! An [`Owner`] collects effects, child owners and cleanups so that tearing
//! down a component tears down everything it created.
//!
//! ## Contexts
//!
//! A [`Context`] lets a provider hand a value (typically a [`Channel`]) to
//! every consumer constructed inside its subtree.
//!
//! # Implementation Notes
//!
//! Dependency tracking uses a thread-local stack of running computations.
//! When a signal is read, the top entry (if it is tracking) becomes a
//! dependent of that signal.

mod channel;
mod context;
mod effect;
mod owner;
mod provider;
mod runtime;
mod signal;
mod subscriber;

pub use channel::{create_channel, Channel};
pub use context::{untrack, ReactiveContext};
pub use effect::Effect;
pub use owner::{on_cleanup, Owner, OwnerId};
pub use provider::{consume, provide, Context, ContextId, ProvideGuard, Provided};
pub use runtime::{batch, Reactive, ReactiveHandle, Runtime};
pub use signal::{create_signal, ReadSignal, Signal, Update, WriteSignal};
pub use subscriber::{SignalId, SubscriberId};
