// ============================================================================
// spark-aggregates - Collection Configuration
// Runtime policy switches and the typed builder
// ============================================================================

use crate::core::types::{default_equals, ElemKey, EqualsFn, Scalar, TotalValue};
use crate::policy::compare::{lexicographic, CompareFn};
use crate::policy::locking::LockPolicy;
use crate::policy::TotalPolicy;

use super::two_field::TwoFieldCollection;

// =============================================================================
// CONFIG
// =============================================================================

/// Policy switches fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CollectionConfig {
    /// Fine-grained concurrency or one collection-wide mutex for mutations.
    pub lock_policy: LockPolicy,
    /// Recompute and publish both totals under one critical section.
    pub combined_atomic: bool,
    /// Maintain the order index. Adds a sorted-tree update to every mutation.
    pub track_order: bool,
}

// =============================================================================
// BUILDER
// =============================================================================

/// Builder for [`TwoFieldCollection`].
///
/// # Example
///
/// ```
/// use spark_aggregates::policy::{by_field1, Field1Extract, TotalPolicy};
/// use spark_aggregates::{LockPolicy, TwoFieldCollection};
///
/// let book: TwoFieldCollection<f64, i64, i64, f64> = TwoFieldCollection::builder(
///     TotalPolicy::field2_sum(),
///     TotalPolicy::min(Field1Extract).with_empty(f64::INFINITY),
/// )
/// .order_by(by_field1())
/// .lock_policy(LockPolicy::Coarse)
/// .build();
///
/// book.insert(101.5, 10);
/// book.insert(100.25, 4);
/// assert_eq!(book.totals(), (14, 100.25));
/// ```
pub struct CollectionBuilder<F1, F2, T1, T2, K> {
    pub(crate) config: CollectionConfig,
    pub(crate) total1: TotalPolicy<F1, F2, T1>,
    pub(crate) total2: TotalPolicy<F1, F2, T2>,
    pub(crate) compare: CompareFn<F1, F2>,
    pub(crate) field1_equals: EqualsFn<F1>,
    pub(crate) field2_equals: EqualsFn<F2>,
    _key: std::marker::PhantomData<fn() -> K>,
}

impl<F1, F2, T1, T2, K> CollectionBuilder<F1, F2, T1, T2, K>
where
    F1: Scalar + PartialOrd,
    F2: Scalar + PartialOrd,
    T1: TotalValue,
    T2: TotalValue,
    K: ElemKey,
{
    pub fn new(total1: TotalPolicy<F1, F2, T1>, total2: TotalPolicy<F1, F2, T2>) -> Self {
        Self {
            config: CollectionConfig::default(),
            total1,
            total2,
            compare: lexicographic(),
            field1_equals: default_equals,
            field2_equals: default_equals,
            _key: std::marker::PhantomData,
        }
    }

    /// Replace every switch at once.
    pub fn config(mut self, config: CollectionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn lock_policy(mut self, policy: LockPolicy) -> Self {
        self.config.lock_policy = policy;
        self
    }

    pub fn combined_atomic(mut self, combined: bool) -> Self {
        self.config.combined_atomic = combined;
        self
    }

    /// Enable or disable the order index (lexicographic unless `order_by`).
    pub fn track_order(mut self, track: bool) -> Self {
        self.config.track_order = track;
        self
    }

    /// Enable the order index with `compare`.
    pub fn order_by(mut self, compare: CompareFn<F1, F2>) -> Self {
        self.compare = compare;
        self.config.track_order = true;
        self
    }

    /// Change detection for field1 writes (e.g. `safe_equals_f64` for NaN).
    pub fn field1_equals(mut self, equals: EqualsFn<F1>) -> Self {
        self.field1_equals = equals;
        self
    }

    /// Change detection for field2 writes.
    pub fn field2_equals(mut self, equals: EqualsFn<F2>) -> Self {
        self.field2_equals = equals;
        self
    }

    pub fn build(self) -> TwoFieldCollection<F1, F2, T1, T2, K> {
        TwoFieldCollection::from_builder(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = CollectionConfig::default();
        assert_eq!(config.lock_policy, LockPolicy::Fine);
        assert!(!config.combined_atomic);
        assert!(!config.track_order);
    }

    #[test]
    fn builder_switches() {
        let builder: CollectionBuilder<f64, i64, i64, f64, ()> =
            CollectionBuilder::new(TotalPolicy::field2_sum(), TotalPolicy::notional_sum())
                .combined_atomic(true)
                .track_order(true)
                .lock_policy(LockPolicy::Coarse);

        assert_eq!(
            builder.config,
            CollectionConfig {
                lock_policy: LockPolicy::Coarse,
                combined_atomic: true,
                track_order: true,
            }
        );
    }

    #[test]
    fn order_by_enables_tracking() {
        let builder: CollectionBuilder<i32, i32, i32, i32, ()> =
            CollectionBuilder::new(TotalPolicy::noop(), TotalPolicy::noop())
                .order_by(crate::policy::by_field2());
        assert!(builder.config.track_order);
    }
}
