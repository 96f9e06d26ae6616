//! Tracking Context
//!
//! The tracking context records which computation is currently running, so a
//! signal read can register that computation as a dependent.
//!
//! # Implementation
//!
//! A thread-local stack holds one entry per running computation. Entering a
//! computation pushes an entry; dropping the returned guard pops it. An entry
//! without a subscriber marks an untracked region: reads inside it register
//! nothing, even when an outer computation is tracking.

use std::cell::RefCell;

use smallvec::SmallVec;

use super::{SignalId, SubscriberId};

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<ContextEntry>> = const { RefCell::new(Vec::new()) };
}

/// An entry in the tracking stack.
#[derive(Debug, Clone)]
struct ContextEntry {
    /// The running computation, `None` for an untracked region.
    subscriber_id: Option<SubscriberId>,
    /// Signals read while this entry was on top.
    dependencies: SmallVec<[SignalId; 4]>,
}

/// Guard that pops the tracking entry when dropped.
///
/// Popping on drop keeps the stack balanced when a computation panics.
pub struct ReactiveContext {
    subscriber_id: Option<SubscriberId>,
}

impl ReactiveContext {
    /// Enter a tracking context for the given subscriber.
    pub fn enter(subscriber_id: SubscriberId) -> Self {
        Self::push(Some(subscriber_id))
    }

    /// Enter an untracked region.
    pub fn untracked() -> Self {
        Self::push(None)
    }

    fn push(subscriber_id: Option<SubscriberId>) -> Self {
        CONTEXT_STACK.with(|stack| {
            stack.borrow_mut().push(ContextEntry {
                subscriber_id,
                dependencies: SmallVec::new(),
            });
        });

        Self { subscriber_id }
    }

    /// Check if a computation is currently tracking reads.
    pub fn is_active() -> bool {
        Self::current_subscriber().is_some()
    }

    /// Get the current subscriber ID, if any.
    pub fn current_subscriber() -> Option<SubscriberId> {
        CONTEXT_STACK.with(|stack| stack.borrow().last().and_then(|entry| entry.subscriber_id))
    }

    /// Record a dependency on the given signal.
    ///
    /// Returns the subscriber that should be registered, if any.
    pub fn track_dependency(signal_id: SignalId) -> Option<SubscriberId> {
        CONTEXT_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            let entry = stack.last_mut()?;
            let subscriber_id = entry.subscriber_id?;
            if !entry.dependencies.contains(&signal_id) {
                entry.dependencies.push(signal_id);
            }
            Some(subscriber_id)
        })
    }

    /// Get the dependencies collected in the current context.
    pub fn get_dependencies() -> SmallVec<[SignalId; 4]> {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .map(|entry| entry.dependencies.clone())
                .unwrap_or_default()
        })
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        CONTEXT_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();

            if let Some(entry) = popped.filter(|_| !std::thread::panicking()) {
                debug_assert_eq!(
                    entry.subscriber_id, self.subscriber_id,
                    "ReactiveContext mismatch: expected {:?}, got {:?}",
                    self.subscriber_id, entry.subscriber_id
                );
            }
        });
    }
}

/// Run `f` without registering any signal reads as dependencies.
pub fn untrack<R>(f: impl FnOnce() -> R) -> R {
    let _ctx = ReactiveContext::untracked();
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_tracks_subscriber() {
        let id = SubscriberId::new();

        assert!(!ReactiveContext::is_active());

        {
            let _ctx = ReactiveContext::enter(id);
            assert_eq!(ReactiveContext::current_subscriber(), Some(id));
        }

        assert!(ReactiveContext::current_subscriber().is_none());
    }

    #[test]
    fn context_deduplicates_dependencies() {
        let id = SubscriberId::new();
        let _ctx = ReactiveContext::enter(id);
        let a = SignalId::new();
        let b = SignalId::new();

        assert_eq!(ReactiveContext::track_dependency(a), Some(id));
        ReactiveContext::track_dependency(b);
        ReactiveContext::track_dependency(a);

        assert_eq!(ReactiveContext::get_dependencies().as_slice(), &[a, b]);
    }

    #[test]
    fn untracked_region_hides_outer_subscriber() {
        let id = SubscriberId::new();
        let _ctx = ReactiveContext::enter(id);

        let tracked = untrack(|| ReactiveContext::track_dependency(SignalId::new()));
        assert!(tracked.is_none());

        // Outer context is restored once the region ends
        assert_eq!(ReactiveContext::current_subscriber(), Some(id));
        assert!(ReactiveContext::get_dependencies().is_empty());
    }
}
