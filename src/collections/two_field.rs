// ============================================================================
// spark-aggregates - TwoFieldCollection
// Concurrent elements of two observable fields with live aggregate totals
// ============================================================================

use std::fmt;
use std::mem;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;

use crate::core::constants::FIRST_ELEM_ID;
use crate::core::error::{CollectionError, Result};
use crate::core::types::{ElemId, ElemKey, ElemSnapshot, EqualsFn, Scalar, TotalValue};
use crate::policy::compare::CompareFn;
use crate::policy::locking::CoarseLock;
use crate::policy::TotalPolicy;
use crate::primitives::cell::{ObservableCell, ReadOnlyCell};
use crate::primitives::subscription::{watch, Subscription};
use crate::reactivity::batching::batch;

use super::aggregate::AggregateEngine;
use super::config::{CollectionBuilder, CollectionConfig};
use super::key_index::KeyIndex;
use super::order_index::{OrderIndex, OrderedIter};

// =============================================================================
// ELEMENT RECORD
// =============================================================================

struct ElemRecord<F1, F2, K> {
    field1: ObservableCell<F1>,
    field2: ObservableCell<F2>,
    /// Field values last folded into the totals and the order index.
    last1: F1,
    last2: F2,
    key: Option<K>,
    /// Change subscription on both field cells. Cancelled before the record
    /// leaves the store.
    monitor: Option<Subscription>,
}

impl<F1: Clone, F2: Clone, K: Clone> ElemRecord<F1, F2, K> {
    fn snapshot(&self) -> ElemSnapshot<F1, F2, K> {
        ElemSnapshot {
            field1: self.last1.clone(),
            field2: self.last2.clone(),
            key: self.key.clone(),
        }
    }
}

// =============================================================================
// COLLECTION INNER
// =============================================================================

struct CollectionInner<F1, F2, T1, T2, K> {
    config: CollectionConfig,
    store: DashMap<ElemId, ElemRecord<F1, F2, K>>,
    keys: KeyIndex<K>,
    order: Option<Arc<OrderIndex<F1, F2, K>>>,
    engine: AggregateEngine<F1, F2, T1, T2>,
    coarse: CoarseLock,
    next_id: AtomicU64,
    live: AtomicUsize,
    field1_equals: EqualsFn<F1>,
    field2_equals: EqualsFn<F2>,
}

impl<F1, F2, T1, T2, K> CollectionInner<F1, F2, T1, T2, K>
where
    F1: Scalar + PartialOrd,
    F2: Scalar + PartialOrd,
    T1: TotalValue,
    T2: TotalValue,
    K: ElemKey,
{
    /// Fold a field write into the totals and the order index.
    ///
    /// Everything happens under the element's store entry, so a concurrent
    /// removal of the same element waits until the transition is complete.
    fn on_field_change(&self, id: ElemId) {
        batch(|| {
            let Some(mut entry) = self.store.get_mut(&id) else {
                return;
            };
            let record = &mut *entry;

            let new1 = record.field1.get();
            let new2 = record.field2.get();
            if (self.field1_equals)(&new1, &record.last1) && (self.field2_equals)(&new2, &record.last2)
            {
                return;
            }

            let old1 = mem::replace(&mut record.last1, new1);
            let old2 = mem::replace(&mut record.last2, new2);
            let new = (&record.last1, &record.last2);

            let moved = match &self.order {
                Some(order) => order.reposition(id, (&old1, &old2), new),
                None => false,
            };
            self.engine.on_update((&old1, &old2), new);
            tracing::trace!(id, moved, "element fields changed");
        });
    }

    fn remove_record(&self, id: ElemId) -> bool {
        let Some((_, mut record)) = self.store.remove(&id) else {
            return false;
        };

        if let Some(mut monitor) = record.monitor.take() {
            monitor.cancel();
        }
        if let Some(order) = &self.order {
            order.remove(id, &record.last1, &record.last2);
        }
        self.engine.on_remove(&record.last1, &record.last2);
        if let Some(key) = &record.key {
            self.keys.erase(key, id);
        }
        self.live.fetch_sub(1, Ordering::AcqRel);

        tracing::debug!(id, "element removed");
        true
    }

    fn order(&self) -> Result<&Arc<OrderIndex<F1, F2, K>>> {
        self.order.as_ref().ok_or(CollectionError::OrderTrackingDisabled)
    }
}

impl<F1, F2, T1, T2, K> Drop for CollectionInner<F1, F2, T1, T2, K> {
    fn drop(&mut self) {
        // Subscriptions first: no callback may reach a record being destroyed
        for mut record in self.store.iter_mut() {
            if let Some(mut monitor) = record.monitor.take() {
                monitor.cancel();
            }
        }
        if let Some(order) = self.order.take() {
            order.clear();
        }
        self.keys.teardown();
        let remaining = self.store.len();
        self.store.clear();
        tracing::debug!(remaining, "collection torn down");
    }
}

// =============================================================================
// TWO FIELD COLLECTION - The public handle
// =============================================================================

/// A concurrent collection of two-field elements with two live totals.
///
/// Each element carries two [`ObservableCell`]s. Writing either cell (from
/// any thread) immediately folds the change into both totals and repositions
/// the element in the order index. Totals are never recomputed from scratch:
/// Sum totals accumulate deltas, Min/Max totals keep a value→count index.
///
/// The handle is cheap to clone; clones share the collection. The collection
/// is torn down when the last handle drops.
///
/// # Example
///
/// ```
/// use spark_aggregates::policy::{by_field1, Field1Extract, TotalPolicy};
/// use spark_aggregates::TwoFieldCollection;
///
/// // total1 = Σ field2, total2 = min field1
/// let book: TwoFieldCollection<i64, i64, i64, i64> = TwoFieldCollection::builder(
///     TotalPolicy::field2_sum(),
///     TotalPolicy::min(Field1Extract),
/// )
/// .order_by(by_field1())
/// .build();
///
/// let a = book.insert(3, 10);
/// let b = book.insert(1, 20);
/// let c = book.insert(2, 5);
/// assert_eq!(book.totals(), (35, 1));
///
/// book.field1(b).unwrap().set(0);
/// assert_eq!(book.total2(), 0);
///
/// book.remove(a);
/// assert_eq!(book.total1(), 25);
/// assert_eq!(book.bottom_k(10).unwrap(), vec![b, c]);
/// ```
pub struct TwoFieldCollection<F1 = f64, F2 = i64, T1 = F2, T2 = f64, K = ()> {
    inner: Arc<CollectionInner<F1, F2, T1, T2, K>>,
}

impl<F1, F2, T1, T2, K> Clone for TwoFieldCollection<F1, F2, T1, T2, K> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<F1, F2, T1, T2, K> TwoFieldCollection<F1, F2, T1, T2, K>
where
    F1: Scalar + PartialOrd,
    F2: Scalar + PartialOrd,
    T1: TotalValue,
    T2: TotalValue,
    K: ElemKey,
{
    /// Collection with default configuration: fine-grained locking,
    /// independent totals, no order index.
    pub fn new(total1: TotalPolicy<F1, F2, T1>, total2: TotalPolicy<F1, F2, T2>) -> Self {
        Self::builder(total1, total2).build()
    }

    pub fn builder(
        total1: TotalPolicy<F1, F2, T1>,
        total2: TotalPolicy<F1, F2, T2>,
    ) -> CollectionBuilder<F1, F2, T1, T2, K> {
        CollectionBuilder::new(total1, total2)
    }

    pub(crate) fn from_builder(builder: CollectionBuilder<F1, F2, T1, T2, K>) -> Self {
        let config = builder.config;
        let order = config
            .track_order
            .then(|| Arc::new(OrderIndex::new(builder.compare)));

        let inner = CollectionInner {
            config,
            store: DashMap::new(),
            keys: KeyIndex::new(),
            order,
            engine: AggregateEngine::new(builder.total1, builder.total2, config.combined_atomic),
            coarse: CoarseLock::new(config.lock_policy),
            next_id: AtomicU64::new(FIRST_ELEM_ID),
            live: AtomicUsize::new(0),
            field1_equals: builder.field1_equals,
            field2_equals: builder.field2_equals,
        };
        tracing::debug!(?config, "collection created");

        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn config(&self) -> CollectionConfig {
        self.inner.config
    }

    // =========================================================================
    // INSERTION
    // =========================================================================

    /// Insert an element and fold it into the totals. Returns its new id.
    pub fn insert(&self, field1: F1, field2: F2) -> ElemId {
        batch(|| {
            let _coarse = self.inner.coarse.acquire();
            self.insert_record(field1, field2, None)
        })
    }

    /// Insert an element reachable through `key`.
    ///
    /// If another live element already holds `key`, that element keeps it:
    /// the new element is inserted but `find_by_key` does not resolve to it.
    pub fn insert_with_key(&self, field1: F1, field2: F2, key: K) -> ElemId {
        batch(|| {
            let _coarse = self.inner.coarse.acquire();
            self.insert_record(field1, field2, Some(key))
        })
    }

    /// Insert many elements under one lock acquisition and one batch, so
    /// total observers see a single notification.
    pub fn insert_batch<I>(&self, items: I) -> Vec<ElemId>
    where
        I: IntoIterator<Item = (F1, F2, Option<K>)>,
    {
        batch(|| {
            let _coarse = self.inner.coarse.acquire();
            let ids: Vec<ElemId> = items
                .into_iter()
                .map(|(field1, field2, key)| self.insert_record(field1, field2, key))
                .collect();
            tracing::debug!(count = ids.len(), "batch inserted");
            ids
        })
    }

    fn insert_record(&self, field1: F1, field2: F2, key: Option<K>) -> ElemId {
        let inner = &self.inner;
        let id = inner.next_id.fetch_add(1, Ordering::Relaxed);

        let cell1 = ObservableCell::new_with_equals(field1.clone(), inner.field1_equals);
        let cell2 = ObservableCell::new_with_equals(field2.clone(), inner.field2_equals);
        let monitor = {
            let weak: Weak<CollectionInner<F1, F2, T1, T2, K>> = Arc::downgrade(inner);
            watch(&[cell1.as_any_cell(), cell2.as_any_cell()], move || {
                if let Some(inner) = weak.upgrade() {
                    inner.on_field_change(id);
                }
            })
        };

        let record = ElemRecord {
            field1: cell1,
            field2: cell2,
            last1: field1,
            last2: field2,
            key: key.clone(),
            monitor: Some(monitor),
        };

        let entry = inner.store.entry(id).or_insert(record);
        inner.engine.on_insert(&entry.last1, &entry.last2);
        if let Some(order) = &inner.order {
            order.insert(id, entry.snapshot());
        }
        if let Some(key) = key {
            let owner = inner.keys.insert(key, id);
            if owner != id {
                tracing::debug!(id, owner, "key already held");
            }
        }
        inner.live.fetch_add(1, Ordering::AcqRel);
        drop(entry);

        tracing::debug!(id, "element inserted");
        id
    }

    // =========================================================================
    // REMOVAL
    // =========================================================================

    /// Remove an element, folding it out of the totals. False if absent.
    pub fn remove(&self, id: ElemId) -> bool {
        batch(|| {
            let _coarse = self.inner.coarse.acquire();
            self.inner.remove_record(id)
        })
    }

    /// Remove the element currently holding `key`. False if none does.
    pub fn remove_by_key(&self, key: &K) -> bool {
        match self.inner.keys.find(key) {
            Some(id) => self.remove(id),
            None => false,
        }
    }

    // =========================================================================
    // LOOKUP
    // =========================================================================

    pub fn find_by_key(&self, key: &K) -> Option<ElemId> {
        self.inner.keys.find(key)
    }

    /// Scan the store for `key`, ignoring the key index.
    ///
    /// With duplicate keys this returns the oldest live holder. That matches
    /// [`find_by_key`](Self::find_by_key) until the owning element is removed;
    /// afterwards the index no longer resolves the key, while the scan still
    /// finds the remaining holders.
    pub fn find_by_key_linear(&self, key: &K) -> Option<ElemId> {
        self.inner
            .store
            .iter()
            .filter(|entry| entry.value().key.as_ref() == Some(key))
            .map(|entry| *entry.key())
            .min()
    }

    /// Handle to an element's field1 cell. Writes through it update the totals.
    pub fn field1(&self, id: ElemId) -> Result<ObservableCell<F1>> {
        self.inner
            .store
            .get(&id)
            .map(|entry| entry.field1.clone())
            .ok_or(CollectionError::ElementNotFound { id })
    }

    /// Handle to an element's field2 cell.
    pub fn field2(&self, id: ElemId) -> Result<ObservableCell<F2>> {
        self.inner
            .store
            .get(&id)
            .map(|entry| entry.field2.clone())
            .ok_or(CollectionError::ElementNotFound { id })
    }

    /// Last-known fields and key of an element.
    pub fn snapshot(&self, id: ElemId) -> Option<ElemSnapshot<F1, F2, K>> {
        self.inner.store.get(&id).map(|entry| entry.snapshot())
    }

    pub fn contains(&self, id: ElemId) -> bool {
        self.inner.store.contains_key(&id)
    }

    /// Live ids, ascending.
    pub fn ids(&self) -> Vec<ElemId> {
        let mut ids: Vec<ElemId> = self.inner.store.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        ids
    }

    /// Copy every element out, then call `f` for each in id order.
    ///
    /// No lock is held while `f` runs, so `f` may write fields or call back
    /// into the collection.
    pub fn for_each_snapshot(&self, mut f: impl FnMut(ElemId, &ElemSnapshot<F1, F2, K>)) {
        let mut rows: Vec<(ElemId, ElemSnapshot<F1, F2, K>)> = self
            .inner
            .store
            .iter()
            .map(|entry| (*entry.key(), entry.value().snapshot()))
            .collect();
        rows.sort_unstable_by_key(|(id, _)| *id);
        for (id, snapshot) in &rows {
            f(*id, snapshot);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.live.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // =========================================================================
    // TOTALS
    // =========================================================================

    pub fn total1(&self) -> T1 {
        self.inner.engine.total1()
    }

    pub fn total2(&self) -> T2 {
        self.inner.engine.total2()
    }

    /// Both totals. With `combined_atomic` the pair always reflects the same
    /// set of applied mutations.
    pub fn totals(&self) -> (T1, T2) {
        self.inner.engine.totals()
    }

    /// Read-only view of the cell total1 is published to.
    ///
    /// Only the collection writes its totals:
    ///
    /// ```compile_fail
    /// use spark_aggregates::TwoFieldCollection;
    ///
    /// let book: TwoFieldCollection = TwoFieldCollection::default();
    /// book.total1_cell().set(999);
    /// ```
    pub fn total1_cell(&self) -> ReadOnlyCell<T1> {
        self.inner.engine.total1_cell().read_only()
    }

    /// Read-only view of the cell total2 is published to.
    pub fn total2_cell(&self) -> ReadOnlyCell<T2> {
        self.inner.engine.total2_cell().read_only()
    }

    /// Run `callback` whenever either total changes.
    ///
    /// One mutation that moves both totals triggers the callback once.
    pub fn on_totals_changed(&self, callback: impl Fn() + Send + Sync + 'static) -> Subscription {
        let engine = &self.inner.engine;
        watch(
            &[engine.total1_cell().as_any_cell(), engine.total2_cell().as_any_cell()],
            callback,
        )
    }

    // =========================================================================
    // ORDER INDEX
    // =========================================================================

    /// Walk elements in comparator order. `.rev()` walks largest first.
    pub fn iter_ordered(&self) -> Result<OrderedIter<F1, F2, K>> {
        Ok(OrderedIter::new(self.inner.order()?.clone()))
    }

    /// Up to `k` ids, largest first.
    pub fn top_k(&self, k: usize) -> Result<Vec<ElemId>> {
        Ok(self.inner.order()?.top_k(k))
    }

    /// Up to `k` ids, smallest first.
    pub fn bottom_k(&self, k: usize) -> Result<Vec<ElemId>> {
        Ok(self.inner.order()?.bottom_k(k))
    }

    /// Replace the comparator. The index is rebuilt before any reader sees
    /// the new comparator.
    pub fn set_compare(&self, compare: CompareFn<F1, F2>) -> Result<()> {
        let order = self.inner.order()?;
        let _coarse = self.inner.coarse.acquire();
        order.set_compare(compare);
        tracing::debug!(len = order.len(), "comparator replaced");
        Ok(())
    }

    /// Rebuild the index with the current comparator, for comparators whose
    /// captured state has changed.
    pub fn rebuild_order_index(&self) -> Result<()> {
        let order = self.inner.order()?;
        let _coarse = self.inner.coarse.acquire();
        order.rebuild();
        tracing::debug!(len = order.len(), "order index rebuilt");
        Ok(())
    }
}

// =============================================================================
// DEFAULTS
// =============================================================================

impl<K: ElemKey> Default for TwoFieldCollection<f64, i64, i64, f64, K> {
    /// Price/quantity book: total1 = Σ quantity, total2 = Σ price × quantity.
    fn default() -> Self {
        Self::new(TotalPolicy::field2_sum(), TotalPolicy::notional_sum())
    }
}

impl<F1, F2, T1, T2, K> fmt::Debug for TwoFieldCollection<F1, F2, T1, T2, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwoFieldCollection")
            .field("len", &self.inner.live.load(Ordering::Acquire))
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{by_field1, Field1Extract, Field2Extract, LockPolicy};
    use std::sync::atomic::AtomicUsize;

    type Book = TwoFieldCollection<i64, i64, i64, i64, String>;

    fn book() -> Book {
        TwoFieldCollection::builder(TotalPolicy::field2_sum(), TotalPolicy::min(Field1Extract))
            .order_by(by_field1())
            .build()
    }

    fn order(c: &Book) -> Vec<ElemId> {
        c.iter_ordered().unwrap().map(|(id, _)| id).collect()
    }

    #[test]
    fn scenario_sum_min_and_order() {
        let c = book();
        let e1 = c.insert(3, 10);
        let e2 = c.insert(1, 20);
        let e3 = c.insert(2, 5);
        assert_eq!((e1, e2, e3), (1, 2, 3));
        assert_eq!(c.total1(), 35);
        assert_eq!(c.total2(), 1);

        c.field1(e2).unwrap().set(0);
        assert_eq!(c.total2(), 0);

        assert!(c.remove(e1));
        assert_eq!(c.total1(), 25);
        assert_eq!(c.total2(), 0);
        assert_eq!(order(&c), vec![2, 3]);
    }

    #[test]
    fn ids_are_never_reused() {
        let c = book();
        let a = c.insert(1, 1);
        c.remove(a);
        let b = c.insert(1, 1);
        assert!(b > a);
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn remove_absent_is_noop() {
        let c = book();
        c.insert(1, 1);
        assert!(!c.remove(99));
        assert!(!c.remove_by_key(&"nope".to_string()));
        assert_eq!(c.len(), 1);
        assert_eq!(c.total1(), 1);
    }

    #[test]
    fn stale_handle_accessors_fail() {
        let c = book();
        let id = c.insert(1, 1);
        c.remove(id);
        assert_eq!(c.field1(id).unwrap_err(), CollectionError::ElementNotFound { id });
        assert!(c.field2(id).is_err());
        assert!(c.snapshot(id).is_none());
        assert!(!c.contains(id));
    }

    #[test]
    fn writes_after_removal_do_not_touch_totals() {
        let c = book();
        let id = c.insert(5, 7);
        let qty = c.field2(id).unwrap();
        c.remove(id);

        qty.set(1_000);
        assert_eq!(c.total1(), 0);
        assert_eq!(qty.subscriber_count(), 0);
    }

    #[test]
    fn keys_resolve_and_follow_removal() {
        let c = book();
        let a = c.insert_with_key(10, 1, "a".into());
        let b = c.insert_with_key(20, 2, "b".into());

        assert_eq!(c.find_by_key(&"a".into()), Some(a));
        assert_eq!(c.find_by_key_linear(&"b".into()), Some(b));

        assert!(c.remove_by_key(&"a".into()));
        assert_eq!(c.find_by_key(&"a".into()), None);
        assert_eq!(c.find_by_key_linear(&"a".into()), None);
        assert_eq!(c.total1(), 2);
    }

    #[test]
    fn duplicate_key_stays_with_first_holder() {
        let c = book();
        let first = c.insert_with_key(1, 1, "k".into());
        let second = c.insert_with_key(2, 2, "k".into());
        assert_eq!(c.len(), 2);
        assert_eq!(c.find_by_key(&"k".into()), Some(first));
        assert_eq!(c.find_by_key_linear(&"k".into()), Some(first));

        // Removing the later holder leaves the owner's mapping alone
        c.remove(second);
        assert_eq!(c.find_by_key(&"k".into()), Some(first));

        assert!(c.remove_by_key(&"k".into()));
        assert_eq!(c.find_by_key(&"k".into()), None);
        assert!(c.is_empty());
    }

    #[test]
    fn key_freed_by_owner_goes_to_next_keyed_insert() {
        let c = book();
        let first = c.insert_with_key(1, 1, "k".into());
        let second = c.insert_with_key(2, 2, "k".into());

        c.remove(first);
        assert_eq!(c.find_by_key(&"k".into()), None);
        assert_eq!(c.find_by_key_linear(&"k".into()), Some(second));

        let third = c.insert_with_key(3, 3, "k".into());
        assert_eq!(c.find_by_key(&"k".into()), Some(third));
    }

    #[test]
    fn snapshots_carry_latest_fields_and_key() {
        let c = book();
        let id = c.insert_with_key(4, 9, "x".into());
        c.field2(id).unwrap().set(11);

        let snap = c.snapshot(id).unwrap();
        assert_eq!((snap.field1, snap.field2), (4, 11));
        assert_eq!(snap.key.as_deref(), Some("x"));

        let mut rows = Vec::new();
        c.for_each_snapshot(|id, s| rows.push((id, s.field2)));
        assert_eq!(rows, vec![(id, 11)]);
    }

    #[test]
    fn batch_insert_notifies_once() {
        let c = book();
        let hits = Arc::new(AtomicUsize::new(0));
        let _sub = c.on_totals_changed({
            let hits = hits.clone();
            move || {
                hits.fetch_add(1, Ordering::SeqCst);
            }
        });

        let ids = c.insert_batch(vec![(3, 1, None), (2, 2, None), (1, 3, Some("z".into()))]);
        assert_eq!(ids.len(), 3);
        assert_eq!(c.totals(), (6, 1));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(c.find_by_key(&"z".into()), Some(ids[2]));
    }

    #[test]
    fn order_operations_require_tracking() {
        let c: TwoFieldCollection<i64, i64, i64, i64> =
            TwoFieldCollection::new(TotalPolicy::field2_sum(), TotalPolicy::max(Field2Extract));
        c.insert(1, 1);
        assert_eq!(c.top_k(1).unwrap_err(), CollectionError::OrderTrackingDisabled);
        assert!(c.bottom_k(1).is_err());
        assert!(c.iter_ordered().is_err());
        assert!(c.set_compare(by_field1()).is_err());
        assert!(c.rebuild_order_index().is_err());
    }

    #[test]
    fn set_compare_reorders() {
        let c = book();
        let a = c.insert(1, 30);
        let b = c.insert(2, 10);
        let d = c.insert(3, 20);
        assert_eq!(c.bottom_k(3).unwrap(), vec![a, b, d]);

        c.set_compare(crate::policy::by_field2()).unwrap();
        assert_eq!(c.bottom_k(3).unwrap(), vec![b, d, a]);
        assert_eq!(c.top_k(1).unwrap(), vec![a]);
        c.rebuild_order_index().unwrap();
        assert_eq!(order(&c), vec![b, d, a]);
    }

    #[test]
    fn nan_prices_keep_the_order_index_sound() {
        let c: TwoFieldCollection<f64, i64, i64, f64> =
            TwoFieldCollection::builder(TotalPolicy::field2_sum(), TotalPolicy::notional_sum())
                .order_by(by_field1())
                .build();
        let a = c.insert(2.0, 1);
        let nan = c.insert(f64::NAN, 1);
        let b = c.insert(1.0, 1);
        assert_eq!(c.bottom_k(3).unwrap(), vec![b, a, nan]);

        c.field1(nan).unwrap().set(0.5);
        c.field1(a).unwrap().set(f64::NAN);
        assert_eq!(c.bottom_k(3).unwrap(), vec![nan, b, a]);

        assert!(c.remove(a));
        assert_eq!(c.top_k(3).unwrap(), vec![b, nan]);
    }

    #[test]
    fn coarse_and_combined_config() {
        let c: TwoFieldCollection = TwoFieldCollection::builder(
            TotalPolicy::field2_sum(),
            TotalPolicy::notional_sum(),
        )
        .lock_policy(LockPolicy::Coarse)
        .combined_atomic(true)
        .build();

        let id = c.insert(2.5, 4);
        c.field1(id).unwrap().set(3.0);
        assert_eq!(c.totals(), (4, 12.0));
        assert_eq!(c.config().lock_policy, LockPolicy::Coarse);
    }

    #[test]
    fn default_collection_is_a_price_book() {
        let c: TwoFieldCollection = TwoFieldCollection::default();
        c.insert(10.0, 3);
        c.insert(2.0, 5);
        assert_eq!(c.totals(), (8, 40.0));
        assert!(!c.config().track_order);
    }

    #[test]
    fn total_views_follow_folds() {
        let c = book();
        let id = c.insert(3, 10);
        let (sum, min) = (c.total1_cell(), c.total2_cell());
        assert_eq!((sum.get(), min.get()), (10, 3));

        c.field2(id).unwrap().set(11);
        c.field1(id).unwrap().set(2);
        assert_eq!((sum.get(), min.get()), (11, 2));
        assert_eq!(c.totals(), (11, 2));
    }

    #[test]
    fn teardown_detaches_field_cells() {
        let c = book();
        let id = c.insert(1, 1);
        let cell = c.field1(id).unwrap();
        assert_eq!(cell.subscriber_count(), 1);

        drop(c);
        assert_eq!(cell.subscriber_count(), 0);
        // Writes to an orphaned cell are harmless
        cell.set(5);
    }
}
