// ============================================================================
// spark-aggregates - Notification Scheduling
// Deliver cell notifications now, or park them until the batch exits
// ============================================================================
//
// There is no scheduler thread: a notification runs on the thread that wrote
// the cell. Inside a batch it is queued in the thread-local context and the
// queue is drained when the outermost batch exits.
// ============================================================================

use std::sync::Arc;

use crate::core::context::with_context;
use crate::core::types::Subscriber;

// =============================================================================
// NOTIFY
// =============================================================================

/// Notify `subscribers` of a write.
///
/// Runs them immediately unless this thread is batching, in which case each
/// one is queued at most once.
pub fn notify_subscribers(subscribers: Vec<Arc<Subscriber>>) {
    if subscribers.is_empty() {
        return;
    }

    let deferred = with_context(|ctx| {
        if !ctx.is_batching() {
            return false;
        }
        for subscriber in &subscribers {
            ctx.add_pending(subscriber.clone());
        }
        true
    });

    if deferred {
        return;
    }

    for subscriber in subscribers {
        subscriber.notify();
    }
}

// =============================================================================
// FLUSH
// =============================================================================

/// Deliver every queued notification for this thread.
///
/// Callbacks may write cells and queue more work; the loop runs until the
/// queue stays empty. Re-entrant calls return immediately and leave the
/// work to the outer loop.
pub fn flush_pending() {
    let already_flushing = with_context(|ctx| ctx.set_flushing(true));
    if already_flushing {
        return;
    }

    struct FlushGuard;

    impl Drop for FlushGuard {
        fn drop(&mut self) {
            with_context(|ctx| ctx.set_flushing(false));
        }
    }

    let _guard = FlushGuard;

    loop {
        let pending = with_context(|ctx| ctx.take_pending());
        if pending.is_empty() {
            break;
        }
        tracing::trace!(count = pending.len(), "flushing pending notifications");
        for subscriber in pending {
            subscriber.notify();
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, Arc<Subscriber>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let sub = Subscriber::new({
            let hits = hits.clone();
            move || {
                hits.fetch_add(1, Ordering::SeqCst);
            }
        });
        (hits, sub)
    }

    #[test]
    fn notifies_immediately_outside_batch() {
        let (hits, sub) = counter();
        notify_subscribers(vec![sub]);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn queues_inside_batch_until_flush() {
        let (hits, sub) = counter();

        with_context(|ctx| ctx.enter_batch());
        notify_subscribers(vec![sub.clone()]);
        notify_subscribers(vec![sub]);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        with_context(|ctx| ctx.exit_batch());

        flush_pending();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn flush_with_empty_queue_is_noop() {
        flush_pending();
        assert!(!with_context(|ctx| ctx.is_flushing()));
    }
}
