//! Providers and Consumers
//!
//! A [`Context`] is a typed key. A provider pushes a value for that key on a
//! thread-local context stack while its subtree is being constructed; any
//! consumer constructed inside that subtree resolves the key to the nearest
//! (top-most) value and keeps it as an ordinary owned clone. Nothing is looked
//! up after construction, so reads never depend on ambient state.
//!
//! Consuming a context with no provider on the stack is a wiring error and
//! surfaces as [`Error::MissingProvider`].

use std::any::Any;
use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};

thread_local! {
    static PROVIDER_STACK: RefCell<Vec<Provided>> = const { RefCell::new(Vec::new()) };
}

/// Unique identifier for a context key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl ContextId {
    fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// A type-erased value bound to a context key, ready to be pushed.
#[derive(Clone)]
pub struct Provided {
    id: ContextId,
    name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
}

impl Provided {
    /// Push this value for the duration of the returned guard.
    pub fn enter(&self) -> ProvideGuard {
        PROVIDER_STACK.with(|stack| stack.borrow_mut().push(self.clone()));
        tracing::trace!(context = self.name, "provide");
        ProvideGuard { id: self.id }
    }

    /// Name of the context this value is provided for.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl std::fmt::Debug for Provided {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provided")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

/// Pops the provided value when dropped.
pub struct ProvideGuard {
    id: ContextId,
}

impl Drop for ProvideGuard {
    fn drop(&mut self) {
        PROVIDER_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();
            if !std::thread::panicking() {
                debug_assert_eq!(popped.map(|p| p.id), Some(self.id), "provider stack mismatch");
            }
        });
    }
}

/// A typed context key.
pub struct Context<T> {
    id: ContextId,
    name: &'static str,
    hint: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Context<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a new, distinct context key.
    pub fn new(name: &'static str) -> Self {
        Self {
            id: ContextId::new(),
            name,
            hint: "no provider in scope",
            _marker: PhantomData,
        }
    }

    /// Set the hint reported when a consumer finds no provider.
    pub fn with_hint(mut self, hint: &'static str) -> Self {
        self.hint = hint;
        self
    }

    /// Get the context's unique ID.
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// Get the context's name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Bind a value to this key without pushing it yet.
    pub fn bind(&self, value: T) -> Provided {
        Provided {
            id: self.id,
            name: self.name,
            value: Arc::new(value),
        }
    }

    /// Make `value` visible to everything constructed inside `f`.
    pub fn provide<R>(&self, value: T, f: impl FnOnce() -> R) -> R {
        let _guard = self.bind(value).enter();
        f()
    }

    /// Resolve the nearest provided value, if any.
    pub fn use_context(&self) -> Option<T> {
        PROVIDER_STACK.with(|stack| {
            stack
                .borrow()
                .iter()
                .rev()
                .find(|p| p.id == self.id)
                .and_then(|p| p.value.downcast_ref::<T>().cloned())
        })
    }

    /// Resolve the nearest provided value or fail with `MissingProvider`.
    pub fn consume(&self) -> Result<T> {
        self.use_context().ok_or(Error::MissingProvider {
            context: self.name,
            hint: self.hint,
        })
    }
}

impl<T> std::fmt::Debug for Context<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

/// Make `value` visible to everything constructed inside `f`.
pub fn provide<T, R>(context: &Context<T>, value: T, f: impl FnOnce() -> R) -> R
where
    T: Clone + Send + Sync + 'static,
{
    context.provide(value, f)
}

/// Resolve the nearest provided value or fail with `MissingProvider`.
pub fn consume<T>(context: &Context<T>) -> Result<T>
where
    T: Clone + Send + Sync + 'static,
{
    context.consume()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_without_provider_fails() {
        let ctx: Context<i32> = Context::new("number").with_hint("wrap it");
        let err = ctx.consume().unwrap_err();

        assert!(err.is_missing_provider());
        assert_eq!(err.to_string(), "Missing context `number`: wrap it");
    }

    #[test]
    fn nearest_provider_wins() {
        let ctx: Context<&'static str> = Context::new("label");

        provide(&ctx, "outer", || {
            assert_eq!(ctx.consume().unwrap(), "outer");
            provide(&ctx, "inner", || assert_eq!(consume(&ctx).unwrap(), "inner"));
            assert_eq!(ctx.consume().unwrap(), "outer");
        });

        assert!(ctx.use_context().is_none());
    }

    #[test]
    fn contexts_of_the_same_type_are_distinct() {
        let a: Context<u8> = Context::new("a");
        let b: Context<u8> = Context::new("b");

        a.provide(1, || {
            assert_eq!(a.use_context(), Some(1));
            assert!(b.use_context().is_none());
        });
    }

    #[test]
    fn unwinding_past_guards_out_of_order_leaves_an_empty_stack() {
        let a: Context<u8> = Context::new("a");
        let b: Context<u8> = Context::new("b");

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let first = a.bind(1).enter();
            let second = b.bind(2).enter();
            // Tuple fields drop front to back, so `first` pops `b`'s entry.
            let _guards = (first, second);
            panic!("render failed");
        }));

        assert!(result.is_err());
        assert!(a.use_context().is_none());
        assert!(b.use_context().is_none());
    }

    #[test]
    fn bound_value_is_pushed_only_while_guard_lives() {
        let ctx: Context<String> = Context::new("name");
        let bound = ctx.bind("x".to_string());

        {
            let _guard = bound.enter();
            assert_eq!(ctx.use_context().as_deref(), Some("x"));
        }
        assert!(ctx.use_context().is_none());
    }
}
