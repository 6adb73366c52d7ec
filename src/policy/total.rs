// ============================================================================
// spark-aggregates - Total Policy
// Mode, functors and empty sentinel of one aggregate total
// ============================================================================

use std::fmt;
use std::ops::{AddAssign, Mul, Sub};
use std::sync::Arc;

use num_traits::AsPrimitive;

use crate::core::types::{AggMode, Scalar};
use crate::policy::apply::{AddApply, ApplyFn, NoopApply};
use crate::policy::delta::{DeltaFn, Field2Delta, NoopDelta, NotionalDelta};
use crate::policy::extract::{ExtractFn, NoopExtract};

/// Everything the aggregate engine needs to maintain one total.
///
/// Sum totals use `delta` and `apply`; Min/Max totals use `extract` and
/// publish `empty` while no element is live.
///
/// # Example
///
/// ```
/// use spark_aggregates::policy::{Field1Extract, TotalPolicy};
/// use spark_aggregates::AggMode;
///
/// let lowest: TotalPolicy<f64, i64, f64> = TotalPolicy::min(Field1Extract).with_empty(f64::NAN);
/// assert_eq!(lowest.mode(), AggMode::Min);
/// assert!(lowest.empty().is_nan());
/// ```
pub struct TotalPolicy<F1, F2, T> {
    mode: AggMode,
    delta: Arc<dyn DeltaFn<F1, F2, T>>,
    apply: Arc<dyn ApplyFn<T>>,
    extract: Arc<dyn ExtractFn<F1, F2, T>>,
    empty: T,
}

impl<F1, F2, T: Clone> Clone for TotalPolicy<F1, F2, T> {
    fn clone(&self) -> Self {
        Self {
            mode: self.mode,
            delta: self.delta.clone(),
            apply: self.apply.clone(),
            extract: self.extract.clone(),
            empty: self.empty.clone(),
        }
    }
}

impl<F1, F2, T> TotalPolicy<F1, F2, T>
where
    F1: Scalar,
    F2: Scalar,
    T: Scalar,
{
    /// Running sum of `delta`, folded with `+=`.
    pub fn sum(delta: impl DeltaFn<F1, F2, T>) -> Self
    where
        T: AddAssign,
    {
        Self::sum_with(delta, AddApply)
    }

    /// Running accumulation of `delta`, folded with `apply`.
    pub fn sum_with(delta: impl DeltaFn<F1, F2, T>, apply: impl ApplyFn<T>) -> Self {
        Self {
            mode: AggMode::Sum,
            delta: Arc::new(delta),
            apply: Arc::new(apply),
            extract: Arc::new(NoopExtract),
            empty: T::default(),
        }
    }

    /// Smallest `extract` value across live elements.
    pub fn min(extract: impl ExtractFn<F1, F2, T>) -> Self {
        Self::ranked(AggMode::Min, extract)
    }

    /// Largest `extract` value across live elements.
    pub fn max(extract: impl ExtractFn<F1, F2, T>) -> Self {
        Self::ranked(AggMode::Max, extract)
    }

    /// A total that never moves off `T::default()`.
    pub fn noop() -> Self {
        Self::sum_with(NoopDelta, NoopApply)
    }

    fn ranked(mode: AggMode, extract: impl ExtractFn<F1, F2, T>) -> Self {
        Self {
            mode,
            delta: Arc::new(NoopDelta),
            apply: Arc::new(NoopApply),
            extract: Arc::new(extract),
            empty: T::default(),
        }
    }

    /// Value published by a Min/Max total while the collection is empty.
    pub fn with_empty(mut self, empty: T) -> Self {
        self.empty = empty;
        self
    }

    pub fn mode(&self) -> AggMode {
        self.mode
    }

    pub fn empty(&self) -> &T {
        &self.empty
    }

    #[inline]
    pub(crate) fn delta(&self, new1: &F1, new2: &F2, old1: &F1, old2: &F2) -> T {
        self.delta.delta(new1, new2, old1, old2)
    }

    #[inline]
    pub(crate) fn apply(&self, total: &mut T, delta: &T) -> bool {
        self.apply.apply(total, delta)
    }

    #[inline]
    pub(crate) fn extract(&self, field1: &F1, field2: &F2) -> T {
        self.extract.extract(field1, field2)
    }
}

// =============================================================================
// PRESETS
// =============================================================================

impl<F1, F2, T> TotalPolicy<F1, F2, T>
where
    F1: Scalar + AsPrimitive<T>,
    F2: Scalar + AsPrimitive<T>,
    T: Scalar + Copy + AddAssign + Sub<Output = T> + Mul<Output = T>,
{
    /// Σ field2 (total quantity).
    pub fn field2_sum() -> Self {
        Self::sum(Field2Delta)
    }

    /// Σ field1·field2 (total notional).
    pub fn notional_sum() -> Self {
        Self::sum(NotionalDelta)
    }
}

impl<F1, F2, T: fmt::Debug> fmt::Debug for TotalPolicy<F1, F2, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TotalPolicy")
            .field("mode", &self.mode)
            .field("empty", &self.empty)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// TESTS
// =============================================================================
