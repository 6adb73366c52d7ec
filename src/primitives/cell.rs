// ============================================================================
// spark-aggregates - Observable Cell
// A thread-safe value with synchronous change subscribers
// ============================================================================

use std::sync::Arc;

use crate::core::types::{AnyCell, CellInner, EqualsFn, Subscriber};
use crate::primitives::subscription::Subscription;
use crate::reactivity::scheduling::notify_subscribers;

// =============================================================================
// OBSERVABLE CELL - The public cell handle
// =============================================================================

/// A shared, observable value.
///
/// Every collection field and every total is one of these. Clones share the
/// same value. A write that changes the value notifies subscribers
/// synchronously on the writing thread (or once at the end of the current
/// batch).
///
/// # Example
///
/// ```
/// use spark_aggregates::ObservableCell;
///
/// let price = ObservableCell::new(10i64);
/// assert_eq!(price.get(), 10);
///
/// price.set(12);
/// assert_eq!(price.get(), 12);
/// ```
pub struct ObservableCell<T> {
    inner: Arc<CellInner<T>>,
}

impl<T> Clone for ObservableCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Send + Sync + 'static> ObservableCell<T> {
    /// Create a new cell with the given initial value.
    pub fn new(value: T) -> Self
    where
        T: PartialEq,
    {
        Self {
            inner: Arc::new(CellInner::new(value)),
        }
    }

    /// Create a new cell with a custom equality function.
    pub fn new_with_equals(value: T, equals: EqualsFn<T>) -> Self {
        Self {
            inner: Arc::new(CellInner::new_with_equals(value, equals)),
        }
    }

    /// Get the current value (cloning).
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.inner.get()
    }

    /// Access the current value with a closure (avoids cloning).
    ///
    /// The value is read-locked while `f` runs; do not write this cell from `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.with(f)
    }

    /// Set the cell's value.
    ///
    /// Returns true if the value changed (based on the equality function).
    /// If it didn't change, no notifications are sent.
    pub fn set(&self, value: T) -> bool {
        let changed = self.inner.set(value);
        if changed {
            notify_subscribers(self.inner.subscribers());
        }
        changed
    }

    /// Update the value in place using a closure. Always notifies.
    ///
    /// # Example
    ///
    /// ```
    /// use spark_aggregates::ObservableCell;
    ///
    /// let qty = ObservableCell::new(1i64);
    /// qty.update(|q| *q += 4);
    /// assert_eq!(qty.get(), 5);
    /// ```
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.inner.update(f);
        notify_subscribers(self.inner.subscribers());
    }

    /// Write version, incremented on every change.
    pub fn version(&self) -> u64 {
        self.inner.version()
    }

    /// Run `callback` after every change of this cell.
    pub fn subscribe(&self, callback: impl Fn() + Send + Sync + 'static) -> Subscription {
        Subscription::attach(Subscriber::new(callback), &[self.as_any_cell()])
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscriber_count()
    }

    /// A handle that can read and subscribe but never write.
    pub fn read_only(&self) -> ReadOnlyCell<T> {
        ReadOnlyCell { cell: self.clone() }
    }

    /// The cell as a type-erased `AnyCell`, for multi-cell subscriptions.
    pub fn as_any_cell(&self) -> Arc<dyn AnyCell> {
        self.inner.clone()
    }

    /// True if both handles point at the same cell.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> std::fmt::Debug for ObservableCell<T>
where
    T: std::fmt::Debug + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.inner.with(|value| {
            f.debug_struct("ObservableCell")
                .field("value", value)
                .field("version", &self.inner.version())
                .finish()
        })
    }
}

// =============================================================================
// READ-ONLY CELL
// =============================================================================

/// Read side of an [`ObservableCell`].
///
/// Handed out for values the crate maintains itself, such as published
/// totals: holders observe every change but cannot store a value.
pub struct ReadOnlyCell<T> {
    cell: ObservableCell<T>,
}

impl<T> Clone for ReadOnlyCell<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T: Send + Sync + 'static> ReadOnlyCell<T> {
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.cell.get()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.cell.with(f)
    }

    pub fn version(&self) -> u64 {
        self.cell.version()
    }

    pub fn subscribe(&self, callback: impl Fn() + Send + Sync + 'static) -> Subscription {
        self.cell.subscribe(callback)
    }

    pub fn subscriber_count(&self) -> usize {
        self.cell.subscriber_count()
    }

    /// For [`watch`](crate::primitives::subscription::watch) over several cells.
    pub fn as_any_cell(&self) -> Arc<dyn AnyCell> {
        self.cell.as_any_cell()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.cell.ptr_eq(&other.cell)
    }
}

impl<T> std::fmt::Debug for ReadOnlyCell<T>
where
    T: std::fmt::Debug + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.cell.with(|value| {
            f.debug_struct("ReadOnlyCell")
                .field("value", value)
                .field("version", &self.cell.version())
                .finish()
        })
    }
}

// =============================================================================
// CELL CREATION FUNCTIONS
// =============================================================================

/// Create a new observable cell.
pub fn cell<T>(value: T) -> ObservableCell<T>
where
    T: PartialEq + Send + Sync + 'static,
{
    ObservableCell::new(value)
}

/// Create a cell for f64 values with safe NaN handling.
///
/// # Example
///
/// ```
/// use spark_aggregates::primitives::cell::cell_f64;
///
/// let value = cell_f64(f64::NAN);
/// assert!(!value.set(f64::NAN));
/// assert!(value.set(1.0));
/// ```
pub fn cell_f64(value: f64) -> ObservableCell<f64> {
    ObservableCell::new_with_equals(value, crate::reactivity::equality::safe_equals_f64)
}

/// Create a cell for f32 values with safe NaN handling.
pub fn cell_f32(value: f32) -> ObservableCell<f32> {
    ObservableCell::new_with_equals(value, crate::reactivity::equality::safe_equals_f32)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(cell: &ObservableCell<i64>) -> (Arc<AtomicUsize>, Subscription) {
        let hits = Arc::new(AtomicUsize::new(0));
        let sub = cell.subscribe({
            let hits = hits.clone();
            move || {
                hits.fetch_add(1, Ordering::SeqCst);
            }
        });
        (hits, sub)
    }

    #[test]
    fn cell_set_and_get() {
        let c = cell(1i64);
        assert!(c.set(2));
        assert_eq!(c.get(), 2);
        assert!(!c.set(2));
        assert_eq!(c.version(), 1);
    }

    #[test]
    fn subscriber_runs_on_change_only() {
        let c = cell(0i64);
        let (hits, _sub) = counting(&c);

        c.set(1);
        c.set(1);
        c.set(2);

        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn update_always_notifies() {
        let c = cell(5i64);
        let (hits, _sub) = counting(&c);

        c.update(|v| *v += 0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn subscriber_can_read_the_cell() {
        let c = cell(0i64);
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let _sub = c.subscribe({
            let c = c.clone();
            let seen = seen.clone();
            move || seen.lock().push(c.get())
        });

        c.set(3);
        c.set(4);
        assert_eq!(*seen.lock(), vec![3, 4]);
    }

    #[test]
    fn clones_share_state() {
        let a = cell(1i64);
        let b = a.clone();
        a.set(9);
        assert_eq!(b.get(), 9);
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn writes_from_other_threads_notify_on_writer_thread() {
        let c = cell(0i64);
        let (hits, _sub) = counting(&c);

        let handles: Vec<_> = (1..=4)
            .map(|n| {
                let c = c.clone();
                std::thread::spawn(move || {
                    c.set(n);
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert!(hits.load(Ordering::SeqCst) >= 1);
        assert!((1..=4).contains(&c.get()));
    }

    #[test]
    fn cell_f64_nan_handling() {
        let c = cell_f64(f64::NAN);
        assert!(!c.set(f64::NAN));
        assert!(c.set(1.0));
    }

    #[test]
    fn read_only_view_tracks_writer() {
        let c = cell(1i64);
        let view = c.read_only();
        let hits = Arc::new(AtomicUsize::new(0));
        let _sub = view.subscribe({
            let hits = hits.clone();
            move || {
                hits.fetch_add(1, Ordering::SeqCst);
            }
        });

        c.set(7);
        assert_eq!(view.get(), 7);
        assert_eq!(view.version(), c.version());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(view.ptr_eq(&view.clone()));
        assert!(format!("{:?}", view).contains("ReadOnlyCell"));
    }

    #[test]
    fn cell_debug() {
        let c = cell(42i64);
        let debug = format!("{:?}", c);
        assert!(debug.contains("ObservableCell"));
        assert!(debug.contains("42"));
    }
}
