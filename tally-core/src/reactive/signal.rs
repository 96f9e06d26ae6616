//! Signal Implementation
//!
//! A Signal is the fundamental reactive primitive. It holds a value and lets
//! the runtime know who read it and when it changed.
//!
//! # How Signals Work
//!
//! 1. When a signal is read inside a running effect, the effect is recorded as
//!    a dependent.
//!
//! 2. When a signal's value changes, the runtime queues every dependent.
//!
//! 3. Writes commit immediately: any read after a write, inside or outside a
//!    batch, returns the new value.
//!
//! Writing a value equal to the current one is a no-op.

use std::fmt::Debug;
use std::sync::Arc;

use parking_lot::RwLock;

use super::context::ReactiveContext;
use super::runtime::Runtime;
use super::SignalId;

/// A mutation request for a signal: a literal replacement or a transform of
/// the current value.
pub enum Update<T> {
    /// Store this value.
    Replace(T),
    /// Store `f(current)`.
    Transform(Box<dyn FnOnce(&T) -> T + Send>),
}

impl<T> Update<T> {
    /// Build a transform update from a closure.
    pub fn transform<F>(f: F) -> Self
    where
        F: FnOnce(&T) -> T + Send + 'static,
    {
        Update::Transform(Box::new(f))
    }

    fn resolve(self, current: &T) -> T {
        match self {
            Update::Replace(value) => value,
            Update::Transform(f) => f(current),
        }
    }
}

impl<T: Debug> Debug for Update<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Update::Replace(value) => f.debug_tuple("Replace").field(value).finish(),
            Update::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}

struct SignalInner<T> {
    id: SignalId,
    value: RwLock<T>,
}

impl<T> Drop for SignalInner<T> {
    fn drop(&mut self) {
        Runtime::drop_signal(self.id);
    }
}

/// A reactive signal holding a value of type T.
///
/// Clones share the same value.
///
/// # Example
///
/// ```rust
/// use tally_core::reactive::Signal;
///
/// let count = Signal::new(0);
/// count.update(|n| n + 1);
/// assert_eq!(count.get(), 1);
/// ```
pub struct Signal<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    inner: Arc<SignalInner<T>>,
}

impl<T> Signal<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create a new signal with the given initial value.
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(SignalInner {
                id: SignalId::new(),
                value: RwLock::new(value),
            }),
        }
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> SignalId {
        self.inner.id
    }

    /// Get the current value, registering the running effect as a dependent.
    pub fn get(&self) -> T {
        self.track();
        self.get_untracked()
    }

    /// Get the current value without tracking dependencies.
    pub fn get_untracked(&self) -> T {
        self.inner.value.read().clone()
    }

    /// Borrow the current value, registering the running effect as a dependent.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.track();
        f(&self.inner.value.read())
    }

    fn track(&self) {
        if let Some(subscriber_id) = ReactiveContext::track_dependency(self.inner.id) {
            Runtime::add_dependency(self.inner.id, subscriber_id);
        }
    }

    /// Set a new value and notify dependents.
    pub fn set(&self, value: T) {
        {
            let mut guard = self.inner.value.write();
            if *guard == value {
                return;
            }
            *guard = value;
        }

        Runtime::notify_signal_change(self.inner.id);
    }

    /// Update the value from the current one.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        // The lock is not held while `f` runs, so it may read this signal.
        let current = self.get_untracked();
        self.set(f(&current));
    }

    /// Apply an [`Update`].
    pub fn apply(&self, update: Update<T>) {
        let current = self.get_untracked();
        self.set(update.resolve(&current));
    }

    /// Get the number of effects currently depending on this signal.
    pub fn subscriber_count(&self) -> usize {
        Runtime::subscriber_count(self.inner.id)
    }

    /// Whether two handles refer to the same signal.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Clone for Signal<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Debug for Signal<T>
where
    T: Clone + PartialEq + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.inner.id)
            .field("value", &self.get_untracked())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

/// Read half of a signal.
pub struct ReadSignal<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    signal: Signal<T>,
}

impl<T> ReadSignal<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Tracked read.
    pub fn get(&self) -> T {
        self.signal.get()
    }

    /// Untracked read.
    pub fn get_untracked(&self) -> T {
        self.signal.get_untracked()
    }

    /// Tracked borrow.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.signal.with(f)
    }
}

/// Write half of a signal.
pub struct WriteSignal<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    signal: Signal<T>,
}

impl<T> WriteSignal<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Replace the value.
    pub fn set(&self, value: T) {
        self.signal.set(value);
    }

    /// Transform the value.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        self.signal.update(f);
    }

    /// Apply an [`Update`].
    pub fn apply(&self, update: Update<T>) {
        self.signal.apply(update);
    }
}

macro_rules! impl_clone_half {
    ($($half:ident),*) => {$(
        impl<T> Clone for $half<T>
        where
            T: Clone + PartialEq + Send + Sync + 'static,
        {
            fn clone(&self) -> Self {
                Self { signal: self.signal.clone() }
            }
        }
    )*};
}

impl_clone_half!(ReadSignal, WriteSignal);

/// Create a signal and split it into its read and write halves.
pub fn create_signal<T>(value: T) -> (ReadSignal<T>, WriteSignal<T>)
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    let signal = Signal::new(value);
    (
        ReadSignal {
            signal: signal.clone(),
        },
        WriteSignal { signal },
    )
}
