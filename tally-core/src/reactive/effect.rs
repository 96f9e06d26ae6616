//! Effect Implementation
//!
//! An Effect is a side-effecting computation that re-runs whenever a signal
//! it read changes.
//!
//! # How Effects Work
//!
//! 1. When created, the effect runs once to collect its dependencies.
//!
//! 2. When any dependency changes, the runtime queues the effect; it re-runs
//!    when the surrounding batch (or the write itself) completes.
//!
//! 3. Before re-running, the effect drops its old dependencies and disposes
//!    the scope of its previous run, so cleanups registered by that run fire
//!    first.
//!
//! An effect created while an [`Owner`] is current is disposed together with
//! that owner.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::context::ReactiveContext;
use super::owner::Owner;
use super::runtime::{Reactive, ReactiveHandle, Runtime};
use super::subscriber::SubscriberId;

struct EffectInner {
    subscriber_id: SubscriberId,
    run: Box<dyn Fn() + Send + Sync>,
    /// Scope of the latest run.
    scope: Mutex<Option<Owner>>,
    handle: Mutex<Option<ReactiveHandle>>,
    disposed: AtomicBool,
    run_count: AtomicUsize,
    dependency_count: AtomicUsize,
}

impl EffectInner {
    fn execute(&self) {
        if self.disposed.load(Ordering::SeqCst) {
            return;
        }

        let previous = self.scope.lock().take();
        if let Some(previous) = previous {
            previous.dispose();
        }
        Runtime::clear_dependencies(self.subscriber_id);

        let scope = Owner::root();
        *self.scope.lock() = Some(scope.clone());

        let _ctx = ReactiveContext::enter(self.subscriber_id);
        scope.run(|| (self.run)());

        self.dependency_count
            .store(ReactiveContext::get_dependencies().len(), Ordering::SeqCst);
        self.run_count.fetch_add(1, Ordering::SeqCst);
    }

    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }

        let scope = self.scope.lock().take();
        if let Some(scope) = scope {
            scope.dispose();
        }
        // Dropping the handle unregisters the effect.
        let handle = self.handle.lock().take();
        drop(handle);
    }
}

impl Reactive for EffectInner {
    fn subscriber_id(&self) -> SubscriberId {
        self.subscriber_id
    }

    fn run(&self) {
        self.execute();
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

/// A side-effecting computation that runs when dependencies change.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicI32, Ordering};
/// use tally_core::reactive::{Effect, Signal};
///
/// let count = Signal::new(0);
/// let seen = Arc::new(AtomicI32::new(-1));
///
/// let reader = count.clone();
/// let sink = seen.clone();
/// let _effect = Effect::new(move || sink.store(reader.get(), Ordering::SeqCst));
///
/// count.set(5);
/// assert_eq!(seen.load(Ordering::SeqCst), 5);
/// ```
#[derive(Clone)]
pub struct Effect {
    inner: Arc<EffectInner>,
}

impl Effect {
    /// Create a new effect and run it once.
    pub fn new<F>(run: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let effect = Self::new_lazy(run);
        effect.execute();
        effect
    }

    /// Create a new effect without running it.
    ///
    /// It has no dependencies until [`Effect::execute`] is called.
    pub fn new_lazy<F>(run: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let inner = Arc::new(EffectInner {
            subscriber_id: SubscriberId::new(),
            run: Box::new(run),
            scope: Mutex::new(None),
            handle: Mutex::new(None),
            disposed: AtomicBool::new(false),
            run_count: AtomicUsize::new(0),
            dependency_count: AtomicUsize::new(0),
        });

        let reactive: Arc<dyn Reactive> = inner.clone();
        *inner.handle.lock() = Some(Runtime::register(&reactive));

        let effect = Self { inner };
        if let Some(owner) = Owner::current() {
            let owned = effect.clone();
            owner.add_cleanup(move || owned.dispose());
        }
        effect
    }

    /// Get the subscriber ID for this effect.
    pub fn subscriber_id(&self) -> SubscriberId {
        self.inner.subscriber_id
    }

    /// Run the effect now, re-collecting its dependencies.
    pub fn execute(&self) {
        self.inner.execute();
    }

    /// Dispose of the effect. It will not run again.
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    /// Check if the effect has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    /// Get the number of times the effect has run.
    pub fn run_count(&self) -> usize {
        self.inner.run_count.load(Ordering::SeqCst)
    }

    /// Get the number of signals read during the latest run.
    pub fn dependency_count(&self) -> usize {
        self.inner.dependency_count.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect")
            .field("subscriber_id", &self.inner.subscriber_id)
            .field("run_count", &self.run_count())
            .field("dependency_count", &self.dependency_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
