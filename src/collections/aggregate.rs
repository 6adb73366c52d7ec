// ============================================================================
// spark-aggregates - Aggregate Engine
// Incrementally maintained Sum / Min / Max totals
// ============================================================================

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use parking_lot::Mutex;

use crate::core::types::{AggMode, Scalar, TotalValue};
use crate::policy::TotalPolicy;
use crate::primitives::cell::ObservableCell;
use crate::reactivity::equality::total_equals;

// =============================================================================
// RANKED VALUE
// =============================================================================

/// A total value ordered by `TotalValue::total_cmp`, so it can key a BTreeMap.
#[derive(Debug, Clone)]
pub(crate) struct Ranked<T>(pub(crate) T);

impl<T: TotalValue> PartialEq for Ranked<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl<T: TotalValue> Eq for Ranked<T> {}

impl<T: TotalValue> PartialOrd for Ranked<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: TotalValue> Ord for Ranked<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

// =============================================================================
// TOTAL SLOT
// =============================================================================

/// A field pair before or after a transition. `None` stands for "absent":
/// before insertion, after removal.
pub(crate) type Side<'a, F1, F2> = Option<(&'a F1, &'a F2)>;

struct TotalState<T> {
    value: T,
    /// Value→count index of live extracted values (Min/Max only).
    counts: BTreeMap<Ranked<T>, usize>,
}

/// One total: its policy, its running state and the cell it is published to.
///
/// The state mutex is held while the new value is published, so concurrent
/// transitions on different elements publish in the order they folded.
pub(crate) struct TotalSlot<F1, F2, T> {
    policy: TotalPolicy<F1, F2, T>,
    state: Mutex<TotalState<T>>,
    cell: ObservableCell<T>,
}

impl<F1, F2, T> TotalSlot<F1, F2, T>
where
    F1: Scalar,
    F2: Scalar,
    T: TotalValue,
{
    pub(crate) fn new(policy: TotalPolicy<F1, F2, T>) -> Self {
        let initial = match policy.mode() {
            AggMode::Sum => T::default(),
            AggMode::Min | AggMode::Max => policy.empty().clone(),
        };
        Self {
            state: Mutex::new(TotalState {
                value: initial.clone(),
                counts: BTreeMap::new(),
            }),
            cell: ObservableCell::new_with_equals(initial, total_equals::<T>),
            policy,
        }
    }

    pub(crate) fn mode(&self) -> AggMode {
        self.policy.mode()
    }

    pub(crate) fn cell(&self) -> &ObservableCell<T> {
        &self.cell
    }

    /// Fold one element transition into the total.
    pub(crate) fn transition(&self, old: Side<'_, F1, F2>, new: Side<'_, F1, F2>) {
        let mut state = self.state.lock();
        let changed = match self.policy.mode() {
            AggMode::Sum => self.fold_sum(&mut state, old, new),
            AggMode::Min | AggMode::Max => self.fold_ranked(&mut state, old, new),
        };
        if changed {
            self.cell.set(state.value.clone());
        }
    }

    fn fold_sum(
        &self,
        state: &mut TotalState<T>,
        old: Side<'_, F1, F2>,
        new: Side<'_, F1, F2>,
    ) -> bool {
        let zero1 = F1::default();
        let zero2 = F2::default();
        let (o1, o2) = old.unwrap_or((&zero1, &zero2));
        let (n1, n2) = new.unwrap_or((&zero1, &zero2));

        let delta = self.policy.delta(n1, n2, o1, o2);
        self.policy.apply(&mut state.value, &delta)
    }

    fn fold_ranked(
        &self,
        state: &mut TotalState<T>,
        old: Side<'_, F1, F2>,
        new: Side<'_, F1, F2>,
    ) -> bool {
        if let Some((o1, o2)) = old {
            let gone = Ranked(self.policy.extract(o1, o2));
            if let Entry::Occupied(mut slot) = state.counts.entry(gone) {
                *slot.get_mut() -= 1;
                if *slot.get() == 0 {
                    slot.remove();
                }
            }
        }
        if let Some((n1, n2)) = new {
            let came = Ranked(self.policy.extract(n1, n2));
            *state.counts.entry(came).or_insert(0) += 1;
        }

        let extreme = match self.policy.mode() {
            AggMode::Max => state.counts.keys().next_back(),
            _ => state.counts.keys().next(),
        };
        let next = extreme
            .map(|ranked| ranked.0.clone())
            .unwrap_or_else(|| self.policy.empty().clone());

        if total_equals(&next, &state.value) {
            return false;
        }
        state.value = next;
        true
    }

    /// Number of distinct live extracted values (Min/Max only).
    #[cfg(test)]
    pub(crate) fn distinct_values(&self) -> usize {
        self.state.lock().counts.len()
    }
}

// =============================================================================
// AGGREGATE ENGINE
// =============================================================================

/// Both totals, plus the optional critical section that makes them move
/// together.
pub(crate) struct AggregateEngine<F1, F2, T1, T2> {
    total1: TotalSlot<F1, F2, T1>,
    total2: TotalSlot<F1, F2, T2>,
    combined: Option<Mutex<()>>,
}

impl<F1, F2, T1, T2> AggregateEngine<F1, F2, T1, T2>
where
    F1: Scalar,
    F2: Scalar,
    T1: TotalValue,
    T2: TotalValue,
{
    pub(crate) fn new(
        total1: TotalPolicy<F1, F2, T1>,
        total2: TotalPolicy<F1, F2, T2>,
        combined_atomic: bool,
    ) -> Self {
        Self {
            total1: TotalSlot::new(total1),
            total2: TotalSlot::new(total2),
            combined: combined_atomic.then(|| Mutex::new(())),
        }
    }

    pub(crate) fn on_insert(&self, f1: &F1, f2: &F2) {
        self.transition(None, Some((f1, f2)));
    }

    pub(crate) fn on_update(&self, old: (&F1, &F2), new: (&F1, &F2)) {
        self.transition(Some(old), Some(new));
    }

    pub(crate) fn on_remove(&self, f1: &F1, f2: &F2) {
        self.transition(Some((f1, f2)), None);
    }

    fn transition(&self, old: Side<'_, F1, F2>, new: Side<'_, F1, F2>) {
        let _combined = self.combined.as_ref().map(|m| m.lock());
        self.total1.transition(old, new);
        self.total2.transition(old, new);
        tracing::trace!(
            mode1 = ?self.total1.mode(),
            mode2 = ?self.total2.mode(),
            inserted = old.is_none(),
            removed = new.is_none(),
            "aggregate transition"
        );
    }

    pub(crate) fn total1(&self) -> T1 {
        self.total1.cell().get()
    }

    pub(crate) fn total2(&self) -> T2 {
        self.total2.cell().get()
    }

    /// Both totals. Under the combined mode the pair belongs to one
    /// transition boundary.
    pub(crate) fn totals(&self) -> (T1, T2) {
        let _combined = self.combined.as_ref().map(|m| m.lock());
        (self.total1(), self.total2())
    }

    pub(crate) fn total1_cell(&self) -> &ObservableCell<T1> {
        self.total1.cell()
    }

    pub(crate) fn total2_cell(&self) -> &ObservableCell<T2> {
        self.total2.cell()
    }

    #[cfg(test)]
    pub(crate) fn is_combined(&self) -> bool {
        self.combined.is_some()
    }
}

// =============================================================================
// TESTS
// =============================================================================
