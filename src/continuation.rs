//! Single-shot continuations.
//!
//! Every operation resolves by applying an opaque, caller-supplied callable
//! to its final result, exactly once. [`Continuation`] makes that contract
//! structural: [`complete`](Continuation::complete) consumes the
//! continuation, so a second invocation does not compile, and dropping a
//! continuation that was never invoked trips a debug assertion instead of
//! silently losing the caller's callback.

use std::fmt;

/// A consumed, one-time callback holding an operation's delivery.
///
/// Continuations are invoked synchronously from within the completion
/// dispatch that drives the owning operation to its terminal state, on the
/// thread driving the reactor.
pub struct Continuation<T> {
    deliver: Option<Box<dyn FnOnce(T)>>,
}

impl<T> Continuation<T> {
    /// Wrap a callback as a single-shot continuation.
    pub fn new(deliver: impl FnOnce(T) + 'static) -> Self {
        Self {
            deliver: Some(Box::new(deliver)),
        }
    }

    /// Invoke the continuation with the operation's final value.
    ///
    /// Takes the continuation by value; the type system rules out a second
    /// delivery.
    pub fn complete(mut self, value: T) {
        let deliver = self
            .deliver
            .take()
            .expect("continuation invariant: callback present until completion");
        deliver(value);
    }
}

impl<T> fmt::Debug for Continuation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Continuation")
            .field("delivered", &self.deliver.is_none())
            .finish()
    }
}

impl<T> Drop for Continuation<T> {
    fn drop(&mut self) {
        // An operation that reaches any terminal state has already consumed
        // the callback via `complete`. Skip the check while unwinding so a
        // failing operation test does not cascade into a double panic.
        if self.deliver.is_some() && !std::thread::panicking() {
            debug_assert!(false, "continuation dropped without being invoked");
        }
    }
}
