//! Reactive Runtime
//!
//! The runtime connects signals to the effects that read them and decides
//! when those effects re-run.
//!
//! # How It Works
//!
//! 1. An effect registers with the runtime when it is created.
//!
//! 2. When the effect reads a signal, the runtime records the dependency.
//!
//! 3. When a signal's value changes, the runtime:
//!    a. Finds all subscribed effects
//!    b. Queues each of them once on the thread's pending queue
//!    c. Flushes the queue, unless a batch is open or a flush is already
//!       running further up the stack
//!
//! Because effects are queued instead of called inline, several writes inside
//! one [`batch`] re-run each dependent effect exactly once, after the last
//! write, so readers never observe an intermediate value.
//!
//! # Thread Model
//!
//! The registry and dependency map are process-wide. Batch depth and the
//! pending queue are thread-local: each thread drives its own updates.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, Weak};

use indexmap::IndexSet;
use parking_lot::RwLock;

use super::context::ReactiveContext;
use super::subscriber::{SignalId, SubscriberId};

/// Upper bound on effect runs in one flush before it is treated as a cycle.
const MAX_FLUSH_RUNS: usize = 100_000;

/// A computation the runtime can re-run when its dependencies change.
pub trait Reactive: Send + Sync {
    /// Get the subscriber ID for this reactive value.
    fn subscriber_id(&self) -> SubscriberId;

    /// Re-run the computation.
    fn run(&self);

    /// Whether the computation has been disposed and must not run again.
    fn is_disposed(&self) -> bool;
}

/// Handle to a registered reactive value.
///
/// Dropping this handle unregisters the reactive value from the runtime.
pub struct ReactiveHandle {
    subscriber_id: SubscriberId,
}

impl ReactiveHandle {
    /// The subscriber this handle keeps registered.
    pub fn subscriber_id(&self) -> SubscriberId {
        self.subscriber_id
    }
}

impl Drop for ReactiveHandle {
    fn drop(&mut self) {
        Runtime::unregister(self.subscriber_id);
    }
}

/// The global reactive runtime.
pub struct Runtime;

// Registry of reactive values, held weakly so the runtime never keeps an
// effect alive on its own.
static REGISTRY: OnceLock<RwLock<HashMap<SubscriberId, Weak<dyn Reactive>>>> = OnceLock::new();
static SIGNAL_SUBSCRIBERS: OnceLock<RwLock<HashMap<SignalId, IndexSet<SubscriberId>>>> =
    OnceLock::new();

thread_local! {
    static BATCH_DEPTH: Cell<usize> = const { Cell::new(0) };
    static FLUSHING: Cell<bool> = const { Cell::new(false) };
    static PENDING: RefCell<IndexSet<SubscriberId>> = RefCell::new(IndexSet::new());
}

fn get_registry() -> &'static RwLock<HashMap<SubscriberId, Weak<dyn Reactive>>> {
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

fn get_signal_subscribers() -> &'static RwLock<HashMap<SignalId, IndexSet<SubscriberId>>> {
    SIGNAL_SUBSCRIBERS.get_or_init(|| RwLock::new(HashMap::new()))
}

impl Runtime {
    /// Register a reactive value with the runtime.
    ///
    /// Returns a handle that unregisters the value when dropped.
    pub fn register(reactive: &Arc<dyn Reactive>) -> ReactiveHandle {
        let id = reactive.subscriber_id();

        get_registry().write().insert(id, Arc::downgrade(reactive));

        ReactiveHandle { subscriber_id: id }
    }

    /// Unregister a reactive value and forget its dependencies.
    fn unregister(id: SubscriberId) {
        get_registry().write().remove(&id);
        Self::clear_dependencies(id);
        PENDING.with(|pending| {
            pending.borrow_mut().shift_remove(&id);
        });
    }

    /// Check whether a subscriber is still registered.
    pub fn is_registered(id: SubscriberId) -> bool {
        get_registry().read().contains_key(&id)
    }

    /// Record that a subscriber depends on a signal.
    pub fn add_dependency(signal_id: SignalId, subscriber_id: SubscriberId) {
        get_signal_subscribers()
            .write()
            .entry(signal_id)
            .or_default()
            .insert(subscriber_id);
    }

    /// Remove all dependencies for a subscriber.
    ///
    /// Called before re-running a computation to clear stale dependencies.
    pub fn clear_dependencies(subscriber_id: SubscriberId) {
        let mut subscribers = get_signal_subscribers().write();

        subscribers.retain(|_, subs| {
            subs.shift_remove(&subscriber_id);
            !subs.is_empty()
        });
    }

    /// Forget a signal that no longer exists.
    pub(crate) fn drop_signal(signal_id: SignalId) {
        get_signal_subscribers().write().remove(&signal_id);
    }

    /// Number of subscribers currently depending on a signal.
    pub fn subscriber_count(signal_id: SignalId) -> usize {
        get_signal_subscribers()
            .read()
            .get(&signal_id)
            .map_or(0, IndexSet::len)
    }

    /// Queue every subscriber of a signal and flush unless a batch is open.
    pub fn notify_signal_change(signal_id: SignalId) {
        let subscriber_ids = get_signal_subscribers()
            .read()
            .get(&signal_id)
            .cloned()
            .unwrap_or_default();

        if subscriber_ids.is_empty() {
            return;
        }

        tracing::trace!(
            signal = signal_id.raw(),
            subscribers = subscriber_ids.len(),
            "signal changed"
        );

        PENDING.with(|pending| pending.borrow_mut().extend(subscriber_ids));

        if !Self::is_batching() {
            Self::flush();
        }
    }

    /// Whether writes on this thread are currently deferred.
    pub fn is_batching() -> bool {
        BATCH_DEPTH.with(Cell::get) > 0
    }

    /// Number of effects waiting to run on this thread.
    pub fn pending_count() -> usize {
        PENDING.with(|pending| pending.borrow().len())
    }

    /// Run queued effects until the queue is empty.
    ///
    /// Re-entrant calls (from an effect that writes a signal) return at once;
    /// the outer loop picks up whatever they queued.
    fn flush() {
        if FLUSHING.with(|flushing| flushing.replace(true)) {
            return;
        }
        let _reset = FlushGuard;

        let mut runs = 0usize;
        while let Some(id) = PENDING.with(|pending| pending.borrow_mut().shift_remove_index(0)) {
            runs += 1;
            if runs > MAX_FLUSH_RUNS {
                let dropped = PENDING.with(|pending| {
                    let mut pending = pending.borrow_mut();
                    let len = pending.len();
                    pending.clear();
                    len
                });
                tracing::error!(runs, dropped, "aborting flush: effects keep re-triggering each other");
                break;
            }

            // The registry lock is released before user code runs.
            let reactive = get_registry().read().get(&id).and_then(Weak::upgrade);
            if let Some(reactive) = reactive {
                if !reactive.is_disposed() {
                    reactive.run();
                }
            }
        }

        if runs > 0 {
            tracing::trace!(runs, "flush complete");
        }
    }

    /// Get the current subscriber being tracked, if any.
    pub fn current_subscriber() -> Option<SubscriberId> {
        ReactiveContext::current_subscriber()
    }
}

struct FlushGuard;

impl Drop for FlushGuard {
    fn drop(&mut self) {
        FLUSHING.with(|flushing| flushing.set(false));
    }
}

struct BatchGuard;

impl Drop for BatchGuard {
    fn drop(&mut self) {
        let depth = BATCH_DEPTH.with(|depth| {
            let next = depth.get().saturating_sub(1);
            depth.set(next);
            next
        });

        if depth == 0 && std::thread::panicking() {
            // Effects queued by an aborted batch are discarded.
            PENDING.with(|pending| pending.borrow_mut().clear());
        }
    }
}

/// Group writes so dependent effects run once, after `f` returns.
///
/// Batches nest; only the outermost one flushes. Reads inside the batch
/// already see the written values.
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
    BATCH_DEPTH.with(|depth| depth.set(depth.get() + 1));
    let result = {
        let _guard = BatchGuard;
        f()
    };

    if !Runtime::is_batching() {
        Runtime::flush();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

    struct MockReactive {
        id: SubscriberId,
        runs: AtomicI32,
        disposed: AtomicBool,
    }

    impl MockReactive {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                id: SubscriberId::new(),
                runs: AtomicI32::new(0),
                disposed: AtomicBool::new(false),
            })
        }
    }

    impl Reactive for MockReactive {
        fn subscriber_id(&self) -> SubscriberId {
            self.id
        }

        fn run(&self) {
            self.runs.fetch_add(1, Ordering::SeqCst);
        }

        fn is_disposed(&self) -> bool {
            self.disposed.load(Ordering::SeqCst)
        }
    }

    fn register(mock: &Arc<MockReactive>) -> ReactiveHandle {
        let reactive: Arc<dyn Reactive> = mock.clone();
        Runtime::register(&reactive)
    }

    #[test]
    fn runtime_registers_and_unregisters() {
        let reactive = MockReactive::new();
        let id = reactive.id;

        let handle = register(&reactive);
        assert!(Runtime::is_registered(id));

        drop(handle);
        assert!(!Runtime::is_registered(id));
    }

    #[test]
    fn runtime_runs_subscribers_on_change() {
        let reactive = MockReactive::new();
        let _handle = register(&reactive);
        let signal = SignalId::new();

        Runtime::add_dependency(signal, reactive.id);
        Runtime::notify_signal_change(signal);

        assert_eq!(reactive.runs.load(Ordering::SeqCst), 1);
        assert_eq!(Runtime::pending_count(), 0);
    }

    #[test]
    fn batch_defers_and_coalesces() {
        let reactive = MockReactive::new();
        let _handle = register(&reactive);
        let a = SignalId::new();
        let b = SignalId::new();
        Runtime::add_dependency(a, reactive.id);
        Runtime::add_dependency(b, reactive.id);

        batch(|| {
            Runtime::notify_signal_change(a);
            Runtime::notify_signal_change(b);
            Runtime::notify_signal_change(a);
            assert_eq!(reactive.runs.load(Ordering::SeqCst), 0);
            assert_eq!(Runtime::pending_count(), 1);
        });

        assert_eq!(reactive.runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn nested_batches_flush_once_at_the_outermost() {
        let reactive = MockReactive::new();
        let _handle = register(&reactive);
        let signal = SignalId::new();
        Runtime::add_dependency(signal, reactive.id);

        batch(|| {
            batch(|| Runtime::notify_signal_change(signal));
            assert_eq!(reactive.runs.load(Ordering::SeqCst), 0);
        });

        assert_eq!(reactive.runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn disposed_subscribers_are_skipped() {
        let reactive = MockReactive::new();
        let _handle = register(&reactive);
        let signal = SignalId::new();
        Runtime::add_dependency(signal, reactive.id);

        reactive.disposed.store(true, Ordering::SeqCst);
        Runtime::notify_signal_change(signal);

        assert_eq!(reactive.runs.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn runtime_clears_dependencies() {
        let reactive = MockReactive::new();
        let _handle = register(&reactive);
        let signal = SignalId::new();

        Runtime::add_dependency(signal, reactive.id);
        assert_eq!(Runtime::subscriber_count(signal), 1);

        Runtime::clear_dependencies(reactive.id);
        assert_eq!(Runtime::subscriber_count(signal), 0);
    }
}
