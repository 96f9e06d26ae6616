//! Ownership Scopes
//!
//! An [`Owner`] is a disposal scope. Everything created while an owner is
//! current (child owners, effects, cleanups registered with [`on_cleanup`])
//! is torn down when that owner is disposed.
//!
//! Owners form a tree: a new owner becomes a child of whichever owner is
//! current on this thread. Disposal is depth-first: children first (newest
//! first), then the owner's own cleanups in reverse registration order.
//! Disposal happens once; later calls are no-ops.

use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

type Cleanup = Box<dyn FnOnce() + Send>;

thread_local! {
    static OWNER_STACK: RefCell<Vec<Owner>> = const { RefCell::new(Vec::new()) };
}

/// Unique identifier for an owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerId(u64);

impl OwnerId {
    fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

struct OwnerInner {
    id: OwnerId,
    parent: Option<Weak<OwnerInner>>,
    children: Mutex<Vec<Owner>>,
    cleanups: Mutex<Vec<Cleanup>>,
    disposed: AtomicBool,
}

/// A disposal scope for reactive work and side-effect cleanups.
#[derive(Clone)]
pub struct Owner {
    inner: Arc<OwnerInner>,
}

impl Owner {
    /// Create a root owner with no parent.
    pub fn root() -> Self {
        Self::with_parent(None)
    }

    /// Create an owner under the current owner, or a root if there is none.
    pub fn new() -> Self {
        Self::with_parent(Self::current())
    }

    fn with_parent(parent: Option<Owner>) -> Self {
        let owner = Self {
            inner: Arc::new(OwnerInner {
                id: OwnerId::new(),
                parent: parent.as_ref().map(|p| Arc::downgrade(&p.inner)),
                children: Mutex::new(Vec::new()),
                cleanups: Mutex::new(Vec::new()),
                disposed: AtomicBool::new(false),
            }),
        };

        if let Some(parent) = parent {
            if parent.is_disposed() {
                // Nothing will ever dispose this child through the parent.
                owner.inner.disposed.store(true, Ordering::SeqCst);
            } else {
                parent.inner.children.lock().push(owner.clone());
            }
        }

        owner
    }

    /// The owner current on this thread, if any.
    pub fn current() -> Option<Owner> {
        OWNER_STACK.with(|stack| stack.borrow().last().cloned())
    }

    /// Get the owner's unique ID.
    pub fn id(&self) -> OwnerId {
        self.inner.id
    }

    /// Run `f` with this owner as the current one.
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        OWNER_STACK.with(|stack| stack.borrow_mut().push(self.clone()));
        let _guard = OwnerGuard { id: self.inner.id };
        f()
    }

    /// Register a cleanup on this owner.
    ///
    /// On an owner that is already disposed the cleanup runs immediately.
    pub fn add_cleanup(&self, cleanup: impl FnOnce() + Send + 'static) {
        if self.is_disposed() {
            cleanup();
            return;
        }
        self.inner.cleanups.lock().push(Box::new(cleanup));
    }

    /// Tear down children and run cleanups. Idempotent.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }

        let children = std::mem::take(&mut *self.inner.children.lock());
        for child in children.iter().rev() {
            child.dispose();
        }

        let cleanups = std::mem::take(&mut *self.inner.cleanups.lock());
        for cleanup in cleanups.into_iter().rev() {
            cleanup();
        }

        if let Some(parent) = self.inner.parent.as_ref().and_then(Weak::upgrade) {
            parent.children.lock().retain(|c| c.inner.id != self.inner.id);
        }
    }

    /// Whether the owner has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    /// Number of live child owners.
    pub fn child_count(&self) -> usize {
        self.inner.children.lock().len()
    }

    /// Number of cleanups waiting for disposal.
    pub fn cleanup_count(&self) -> usize {
        self.inner.cleanups.lock().len()
    }
}

impl Default for Owner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Owner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Owner")
            .field("id", &self.inner.id)
            .field("children", &self.child_count())
            .field("cleanups", &self.cleanup_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

struct OwnerGuard {
    id: OwnerId,
}

impl Drop for OwnerGuard {
    fn drop(&mut self) {
        OWNER_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();
            if !std::thread::panicking() {
                debug_assert_eq!(popped.map(|o| o.inner.id), Some(self.id), "owner stack mismatch");
            }
        });
    }
}

/// Register a cleanup on the current owner.
///
/// Returns `false` when no owner is current; the cleanup is then dropped
/// without running.
pub fn on_cleanup(cleanup: impl FnOnce() + Send + 'static) -> bool {
    match Owner::current() {
        Some(owner) => {
            owner.add_cleanup(cleanup);
            true
        }
        None => {
            tracing::warn!("cleanup registered outside an owner will never run");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn cleanups_run_in_reverse_order_once() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let owner = Owner::root();

        owner.run(|| {
            for i in 0..3 {
                let order = order.clone();
                assert!(on_cleanup(move || order.lock().push(i)));
            }
        });

        owner.dispose();
        owner.dispose();

        assert_eq!(*order.lock(), vec![2, 1, 0]);
        assert!(owner.is_disposed());
    }

    #[test]
    fn children_are_disposed_before_parent_cleanups() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let parent = Owner::root();

        parent.run(|| {
            let o = order.clone();
            on_cleanup(move || o.lock().push("parent"));

            let child = Owner::new();
            child.run(|| {
                let o = order.clone();
                on_cleanup(move || o.lock().push("child"));
            });
        });

        assert_eq!(parent.child_count(), 1);
        parent.dispose();
        assert_eq!(*order.lock(), vec!["child", "parent"]);
    }

    #[test]
    fn disposed_child_detaches_from_parent() {
        let parent = Owner::root();
        let child = parent.run(Owner::new);
        assert_eq!(parent.child_count(), 1);

        child.dispose();
        assert_eq!(parent.child_count(), 0);
        assert!(!parent.is_disposed());
    }

    #[test]
    fn cleanup_without_owner_is_rejected() {
        let ran = Arc::new(AtomicUsize::new(0));
        let r = ran.clone();
        assert!(!on_cleanup(move || {
            r.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn cleanup_on_disposed_owner_runs_immediately() {
        let owner = Owner::root();
        owner.dispose();

        let ran = Arc::new(AtomicUsize::new(0));
        let r = ran.clone();
        owner.add_cleanup(move || {
            r.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn owner_stack_restores_after_run() {
        let outer = Owner::root();
        outer.run(|| {
            let inner = Owner::new();
            inner.run(|| assert_eq!(Owner::current().map(|o| o.id()), Some(inner.id())));
            assert_eq!(Owner::current().map(|o| o.id()), Some(outer.id()));
        });
        assert!(Owner::current().is_none());
    }
}
