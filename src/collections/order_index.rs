// ============================================================================
// spark-aggregates - Order Index
// Live ids sorted by a replaceable comparator, id as the tie-break
// ============================================================================
//
// Entries are keyed by (field snapshot, id, comparator). The key's snapshot is
// only replaced when a mutation moves the element to a non-equivalent rank;
// equivalent moves update the stored snapshot in place, which leaves the tree
// untouched and keeps every key's relative order unchanged.
//
// All access goes through one RwLock. Comparator swaps rebuild under the
// write lock, so a reader sees either the old order or the new one.
// ============================================================================

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::core::types::{ElemId, ElemSnapshot};
use crate::policy::compare::{equivalent, CompareFn};

// =============================================================================
// ORDER KEY
// =============================================================================

struct OrderKey<F1, F2> {
    field1: F1,
    field2: F2,
    id: ElemId,
    cmp: CompareFn<F1, F2>,
}

impl<F1: Clone, F2: Clone> Clone for OrderKey<F1, F2> {
    fn clone(&self) -> Self {
        Self {
            field1: self.field1.clone(),
            field2: self.field2.clone(),
            id: self.id,
            cmp: self.cmp.clone(),
        }
    }
}

impl<F1, F2> Ord for OrderKey<F1, F2> {
    fn cmp(&self, other: &Self) -> Ordering {
        if (self.cmp)(&self.field1, &self.field2, &other.field1, &other.field2) {
            Ordering::Less
        } else if (self.cmp)(&other.field1, &other.field2, &self.field1, &self.field2) {
            Ordering::Greater
        } else {
            self.id.cmp(&other.id)
        }
    }
}

impl<F1, F2> PartialOrd for OrderKey<F1, F2> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<F1, F2> PartialEq for OrderKey<F1, F2> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<F1, F2> Eq for OrderKey<F1, F2> {}

// =============================================================================
// ORDER INDEX
// =============================================================================

struct OrderState<F1, F2, K> {
    cmp: CompareFn<F1, F2>,
    entries: BTreeMap<OrderKey<F1, F2>, ElemSnapshot<F1, F2, K>>,
    /// Bumped whenever every key is rebuilt. Iterators re-key their cursors
    /// when they see it move.
    generation: u64,
}

impl<F1: Clone, F2: Clone, K> OrderState<F1, F2, K> {
    fn key(&self, id: ElemId, field1: &F1, field2: &F2) -> OrderKey<F1, F2> {
        OrderKey {
            field1: field1.clone(),
            field2: field2.clone(),
            id,
            cmp: self.cmp.clone(),
        }
    }

    fn rekey(&mut self) {
        let entries = std::mem::take(&mut self.entries);
        self.entries = entries
            .into_iter()
            .map(|(key, snap)| (self.key(key.id, &snap.field1, &snap.field2), snap))
            .collect();
        self.generation += 1;
    }
}

/// The sorted view over live elements.
pub(crate) struct OrderIndex<F1, F2, K> {
    state: RwLock<OrderState<F1, F2, K>>,
}

impl<F1, F2, K> OrderIndex<F1, F2, K>
where
    F1: Clone,
    F2: Clone,
    K: Clone,
{
    pub(crate) fn new(cmp: CompareFn<F1, F2>) -> Self {
        Self {
            state: RwLock::new(OrderState {
                cmp,
                entries: BTreeMap::new(),
                generation: 0,
            }),
        }
    }

    pub(crate) fn insert(&self, id: ElemId, snapshot: ElemSnapshot<F1, F2, K>) {
        let mut state = self.state.write();
        let key = state.key(id, &snapshot.field1, &snapshot.field2);
        state.entries.insert(key, snapshot);
    }

    /// Remove `id`, located by its last indexed fields.
    pub(crate) fn remove(&self, id: ElemId, field1: &F1, field2: &F2) -> bool {
        let mut state = self.state.write();
        let lookup = state.key(id, field1, field2);
        state.entries.remove(&lookup).is_some()
    }

    /// Move `id` from its old fields to its new ones.
    ///
    /// Returns true when the element changed rank.
    pub(crate) fn reposition(&self, id: ElemId, old: (&F1, &F2), new: (&F1, &F2)) -> bool {
        let mut state = self.state.write();
        let lookup = state.key(id, old.0, old.1);

        if equivalent(&state.cmp, old.0, old.1, new.0, new.1) {
            if let Some(snap) = state.entries.get_mut(&lookup) {
                snap.field1 = new.0.clone();
                snap.field2 = new.1.clone();
            }
            return false;
        }

        let Some(mut snap) = state.entries.remove(&lookup) else {
            return false;
        };
        snap.field1 = new.0.clone();
        snap.field2 = new.1.clone();
        let key = state.key(id, new.0, new.1);
        state.entries.insert(key, snap);
        true
    }

    /// Replace the comparator and rebuild every key.
    pub(crate) fn set_compare(&self, cmp: CompareFn<F1, F2>) {
        let mut state = self.state.write();
        state.cmp = cmp;
        state.rekey();
    }

    /// Rebuild every key with the current comparator.
    pub(crate) fn rebuild(&self) {
        self.state.write().rekey();
    }

    /// Up to `k` ids, largest first.
    pub(crate) fn top_k(&self, k: usize) -> Vec<ElemId> {
        let state = self.state.read();
        state.entries.keys().rev().take(k).map(|key| key.id).collect()
    }

    /// Up to `k` ids, smallest first.
    pub(crate) fn bottom_k(&self, k: usize) -> Vec<ElemId> {
        let state = self.state.read();
        state.entries.keys().take(k).map(|key| key.id).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.state.read().entries.len()
    }
}

impl<F1, F2, K> OrderIndex<F1, F2, K> {
    pub(crate) fn clear(&self) {
        self.state.write().entries.clear();
    }
}

// =============================================================================
// ORDERED ITERATOR
// =============================================================================

/// Walks the order index from both ends, ascending from the front.
///
/// Each step takes the read lock just long enough to find the next entry and
/// copy its snapshot, so writers interleave freely with a long walk. Elements
/// inserted ahead of a cursor are seen; elements behind it are not. After a
/// comparator swap the cursors are re-positioned in the new order.
pub struct OrderedIter<F1, F2, K> {
    index: Arc<OrderIndex<F1, F2, K>>,
    front: Option<OrderKey<F1, F2>>,
    back: Option<OrderKey<F1, F2>>,
    generation: u64,
    done: bool,
}

impl<F1, F2, K> OrderedIter<F1, F2, K>
where
    F1: Clone,
    F2: Clone,
    K: Clone,
{
    pub(crate) fn new(index: Arc<OrderIndex<F1, F2, K>>) -> Self {
        let generation = index.state.read().generation;
        Self {
            index,
            front: None,
            back: None,
            generation,
            done: false,
        }
    }

    fn step(&mut self, from_back: bool) -> Option<(ElemId, ElemSnapshot<F1, F2, K>)> {
        if self.done {
            return None;
        }
        let index = self.index.clone();
        let state = index.state.read();

        if state.generation != self.generation {
            for cursor in [&mut self.front, &mut self.back] {
                if let Some(key) = cursor.as_mut() {
                    key.cmp = state.cmp.clone();
                }
            }
            self.generation = state.generation;
        }

        if let (Some(front), Some(back)) = (&self.front, &self.back) {
            if front >= back {
                self.done = true;
                return None;
            }
        }

        let lower = self.front.as_ref().map_or(Bound::Unbounded, Bound::Excluded);
        let upper = self.back.as_ref().map_or(Bound::Unbounded, Bound::Excluded);
        let mut range = state.entries.range((lower, upper));
        let found = if from_back { range.next_back() } else { range.next() };

        let Some((key, snap)) = found else {
            self.done = true;
            return None;
        };
        let item = (key.id, snap.clone());
        let cursor = state.key(key.id, &key.field1, &key.field2);
        if from_back {
            self.back = Some(cursor);
        } else {
            self.front = Some(cursor);
        }
        Some(item)
    }
}

impl<F1, F2, K> Iterator for OrderedIter<F1, F2, K>
where
    F1: Clone,
    F2: Clone,
    K: Clone,
{
    type Item = (ElemId, ElemSnapshot<F1, F2, K>);

    fn next(&mut self) -> Option<Self::Item> {
        self.step(false)
    }
}

impl<F1, F2, K> DoubleEndedIterator for OrderedIter<F1, F2, K>
where
    F1: Clone,
    F2: Clone,
    K: Clone,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        self.step(true)
    }
}

impl<F1, F2, K> fmt::Debug for OrderedIter<F1, F2, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderedIter")
            .field("front", &self.front.as_ref().map(|k| k.id))
            .field("back", &self.back.as_ref().map(|k| k.id))
            .field("done", &self.done)
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
