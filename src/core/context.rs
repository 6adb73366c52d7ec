// ============================================================================
// spark-aggregates - Reactive Context
// Thread-local batching state for cell notifications
// ============================================================================

use std::cell::{Cell, RefCell};
use std::sync::Arc;

use super::types::Subscriber;

// =============================================================================
// REACTIVE CONTEXT
// =============================================================================

/// Thread-local reactive context.
///
/// Cells are shared between threads, but a batch belongs to the thread that
/// opened it: notifications raised by that thread are parked here until its
/// outermost batch exits.
pub struct ReactiveContext {
    /// Current batch depth (for nested batches)
    pub batch_depth: Cell<u32>,

    /// Subscribers to notify once the batch completes
    pub pending: RefCell<Vec<Arc<Subscriber>>>,

    /// Whether this thread is currently delivering pending notifications
    pub is_flushing: Cell<bool>,
}

impl ReactiveContext {
    pub fn new() -> Self {
        Self {
            batch_depth: Cell::new(0),
            pending: RefCell::new(Vec::new()),
            is_flushing: Cell::new(false),
        }
    }

    // =========================================================================
    // BATCHING
    // =========================================================================

    /// Increment batch depth, returns new depth
    pub fn enter_batch(&self) -> u32 {
        let depth = self.batch_depth.get() + 1;
        self.batch_depth.set(depth);
        depth
    }

    /// Decrement batch depth, returns new depth
    pub fn exit_batch(&self) -> u32 {
        let depth = self.batch_depth.get().saturating_sub(1);
        self.batch_depth.set(depth);
        depth
    }

    pub fn is_batching(&self) -> bool {
        self.batch_depth.get() > 0
    }

    // =========================================================================
    // PENDING NOTIFICATIONS
    // =========================================================================

    /// Queue a subscriber, skipping it if it is already queued.
    pub fn add_pending(&self, subscriber: Arc<Subscriber>) {
        let mut pending = self.pending.borrow_mut();
        if !pending.iter().any(|s| s.id() == subscriber.id()) {
            pending.push(subscriber);
        }
    }

    pub fn take_pending(&self) -> Vec<Arc<Subscriber>> {
        self.pending.replace(Vec::new())
    }

    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Set flushing mode, returning previous
    pub fn set_flushing(&self, value: bool) -> bool {
        self.is_flushing.replace(value)
    }

    pub fn is_flushing(&self) -> bool {
        self.is_flushing.get()
    }
}

impl Default for ReactiveContext {
    fn default() -> Self {
        Self::new()
    }
}

thread_local! {
    static CONTEXT: ReactiveContext = ReactiveContext::new();
}

/// Run `f` with this thread's reactive context.
///
/// Do not call back into cells from inside `f`: the context is borrowed
/// for the duration of the call.
pub fn with_context<R>(f: impl FnOnce(&ReactiveContext) -> R) -> R {
    CONTEXT.with(f)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_depth_nests() {
        let ctx = ReactiveContext::new();
        assert!(!ctx.is_batching());
        assert_eq!(ctx.enter_batch(), 1);
        assert_eq!(ctx.enter_batch(), 2);
        assert_eq!(ctx.exit_batch(), 1);
        assert!(ctx.is_batching());
        assert_eq!(ctx.exit_batch(), 0);
        assert_eq!(ctx.exit_batch(), 0);
    }

    #[test]
    fn pending_is_deduplicated() {
        let ctx = ReactiveContext::new();
        let sub = Subscriber::new(|| {});
        ctx.add_pending(sub.clone());
        ctx.add_pending(sub);
        ctx.add_pending(Subscriber::new(|| {}));
        assert_eq!(ctx.pending_count(), 2);
        assert_eq!(ctx.take_pending().len(), 2);
        assert_eq!(ctx.pending_count(), 0);
    }

    #[test]
    fn context_is_per_thread() {
        let batching = || with_context(|ctx| ctx.is_batching());
        with_context(|ctx| ctx.enter_batch());
        let other = std::thread::spawn(batching).join().unwrap();
        assert!(!other);
        assert!(batching());
        with_context(|ctx| ctx.exit_batch());
    }
}
