// ============================================================================
// spark-aggregates - Batching
// Group multiple writes into a single notification pass
// ============================================================================

use crate::core::context::with_context;
use crate::reactivity::scheduling::flush_pending;

// =============================================================================
// BATCH
// =============================================================================

/// Batch multiple cell writes into a single notification pass.
///
/// Without batching, every write notifies its subscribers immediately.
/// With batching, each subscriber runs once after the outermost batch exits,
/// however many of its cells were written.
///
/// # Example
///
/// ```
/// use spark_aggregates::{batch, watch, ObservableCell};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// let a = ObservableCell::new(1);
/// let b = ObservableCell::new(2);
/// let runs = Arc::new(AtomicUsize::new(0));
///
/// let _sub = watch(&[a.as_any_cell(), b.as_any_cell()], {
///     let runs = runs.clone();
///     move || {
///         runs.fetch_add(1, Ordering::SeqCst);
///     }
/// });
///
/// batch(|| {
///     a.set(10);
///     b.set(20);
/// });
///
/// assert_eq!(runs.load(Ordering::SeqCst), 1);
/// ```
pub fn batch<T>(f: impl FnOnce() -> T) -> T {
    with_context(|ctx| ctx.enter_batch());

    // Use a guard pattern to ensure we exit the batch even on panic
    struct BatchGuard;

    impl Drop for BatchGuard {
        fn drop(&mut self) {
            let depth = with_context(|ctx| ctx.exit_batch());

            // When outermost batch completes, deliver what was queued
            if depth == 0 {
                flush_pending();
            }
        }
    }

    let _guard = BatchGuard;
    f()
}

/// Check if currently inside a batch.
///
/// # Example
///
/// ```
/// use spark_aggregates::{batch, is_batching};
///
/// assert!(!is_batching());
///
/// batch(|| {
///     assert!(is_batching());
/// });
///
/// assert!(!is_batching());
/// ```
pub fn is_batching() -> bool {
    with_context(|ctx| ctx.is_batching())
}

// =============================================================================
// TESTS
// =============================================================================
