// ============================================================================
// spark-aggregates - Delta Functors
// How a field transition contributes to a Sum total
// ============================================================================

use std::ops::{Mul, Sub};

use num_traits::AsPrimitive;

// =============================================================================
// DELTA TRAIT
// =============================================================================

/// Computes the contribution of a `(old1, old2) -> (new1, new2)` transition.
///
/// Insertion is the transition from the default pair, removal the transition
/// back to it. Any `Fn(&F1, &F2, &F1, &F2) -> T` closure is a delta function.
pub trait DeltaFn<F1, F2, T>: Send + Sync + 'static {
    fn delta(&self, new1: &F1, new2: &F2, old1: &F1, old2: &F2) -> T;
}

impl<F1, F2, T, F> DeltaFn<F1, F2, T> for F
where
    F: Fn(&F1, &F2, &F1, &F2) -> T + Send + Sync + 'static,
{
    #[inline]
    fn delta(&self, new1: &F1, new2: &F2, old1: &F1, old2: &F2) -> T {
        self(new1, new2, old1, old2)
    }
}

// =============================================================================
// STOCK DELTAS
// =============================================================================

/// Δ = new2 − old2. Sums field2 across the collection.
#[derive(Debug, Clone, Copy, Default)]
pub struct Field2Delta;

impl<F1, F2, T> DeltaFn<F1, F2, T> for Field2Delta
where
    F2: AsPrimitive<T>,
    T: Copy + Sub<Output = T> + 'static,
{
    #[inline]
    fn delta(&self, _new1: &F1, new2: &F2, _old1: &F1, old2: &F2) -> T {
        new2.as_() - old2.as_()
    }
}

/// Δ = new1·new2 − old1·old2. Sums the product of the fields
/// (price × quantity, say).
#[derive(Debug, Clone, Copy, Default)]
pub struct NotionalDelta;

impl<F1, F2, T> DeltaFn<F1, F2, T> for NotionalDelta
where
    F1: AsPrimitive<T>,
    F2: AsPrimitive<T>,
    T: Copy + Mul<Output = T> + Sub<Output = T> + 'static,
{
    #[inline]
    fn delta(&self, new1: &F1, new2: &F2, old1: &F1, old2: &F2) -> T {
        new2.as_() * new1.as_() - old2.as_() * old1.as_()
    }
}

/// Always contributes `T::default()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDelta;

impl<F1, F2, T: Default> DeltaFn<F1, F2, T> for NoopDelta {
    #[inline]
    fn delta(&self, _: &F1, _: &F2, _: &F1, _: &F2) -> T {
        T::default()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field2_delta() {
        let d: i64 = Field2Delta.delta(&1.5f64, &10i64, &0.0, &4);
        assert_eq!(d, 6);

        // Removal: transition back to defaults
        let d: i64 = Field2Delta.delta(&0.0f64, &0i64, &1.5, &10);
        assert_eq!(d, -10);
    }

    #[test]
    fn notional_delta_casts_into_total() {
        let d: f64 = NotionalDelta.delta(&2.5f64, &4i64, &0.0, &0);
        assert_eq!(d, 10.0);

        let d: f64 = NotionalDelta.delta(&3.0f64, &4i64, &2.5, &4);
        assert_eq!(d, 2.0);
    }

    #[test]
    fn closures_are_deltas() {
        let squares = |n1: &i32, _: &i32, o1: &i32, _: &i32| n1 * n1 - o1 * o1;
        assert_eq!(DeltaFn::delta(&squares, &3, &0, &2, &0), 5);
    }

    #[test]
    fn noop_delta() {
        let d: i64 = NoopDelta.delta(&1i32, &2i32, &3, &4);
        assert_eq!(d, 0);
    }
}
