// ============================================================================
// spark-aggregates - Apply Functors
// How a delta is folded into a running Sum total
// ============================================================================

use std::ops::{Add, AddAssign};

use num_traits::Bounded;

// =============================================================================
// APPLY TRAIT
// =============================================================================

/// Folds `delta` into `total`, returning whether the total changed.
///
/// Returning false suppresses the change notification for the total.
/// Any `Fn(&mut T, &T) -> bool` closure is an apply function.
pub trait ApplyFn<T>: Send + Sync + 'static {
    fn apply(&self, total: &mut T, delta: &T) -> bool;
}

impl<T, F> ApplyFn<T> for F
where
    F: Fn(&mut T, &T) -> bool + Send + Sync + 'static,
{
    #[inline]
    fn apply(&self, total: &mut T, delta: &T) -> bool {
        self(total, delta)
    }
}

// =============================================================================
// STOCK APPLIES
// =============================================================================

/// `total += delta`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddApply;

impl<T> ApplyFn<T> for AddApply
where
    T: AddAssign + Clone,
{
    #[inline]
    fn apply(&self, total: &mut T, delta: &T) -> bool {
        *total += delta.clone();
        true
    }
}

/// `total = delta`: the delta is read as the new value of the total.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetApply;

impl<T> ApplyFn<T> for SetApply
where
    T: PartialEq + Clone,
{
    #[inline]
    fn apply(&self, total: &mut T, delta: &T) -> bool {
        if *total == *delta {
            return false;
        }
        *total = delta.clone();
        true
    }
}

/// Add, then clamp into `[lo, hi]`. Reports no change when pinned at a bound.
#[derive(Debug, Clone, Copy)]
pub struct SaturatingApply<T> {
    lo: T,
    hi: T,
}

impl<T> SaturatingApply<T> {
    pub fn new(lo: T, hi: T) -> Self {
        Self { lo, hi }
    }
}

impl<T: Bounded> Default for SaturatingApply<T> {
    /// Clamp at the type's own range.
    fn default() -> Self {
        Self::new(T::min_value(), T::max_value())
    }
}

impl<T> ApplyFn<T> for SaturatingApply<T>
where
    T: Add<Output = T> + PartialOrd + Clone + Send + Sync + 'static,
{
    fn apply(&self, total: &mut T, delta: &T) -> bool {
        let mut next = total.clone() + delta.clone();
        if next < self.lo {
            next = self.lo.clone();
        }
        if next > self.hi {
            next = self.hi.clone();
        }
        if next == *total {
            return false;
        }
        *total = next;
        true
    }
}

/// Never changes the total.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopApply;

impl<T> ApplyFn<T> for NoopApply {
    #[inline]
    fn apply(&self, _total: &mut T, _delta: &T) -> bool {
        false
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_apply() {
        let mut total = 10i64;
        assert!(AddApply.apply(&mut total, &5));
        assert_eq!(total, 15);
    }

    #[test]
    fn set_apply_reports_same_value() {
        let mut total = 3.0f64;
        assert!(!SetApply.apply(&mut total, &3.0));
        assert!(SetApply.apply(&mut total, &4.0));
        assert_eq!(total, 4.0);
    }

    #[test]
    fn saturating_apply_clamps() {
        let sat = SaturatingApply::new(0i64, 100);
        let mut total = 90;

        assert!(sat.apply(&mut total, &50));
        assert_eq!(total, 100);

        // Pinned at the bound: declined
        assert!(!sat.apply(&mut total, &1));
        assert_eq!(total, 100);

        assert!(sat.apply(&mut total, &-500));
        assert_eq!(total, 0);
    }

    #[test]
    fn saturating_default_uses_type_range() {
        let sat: SaturatingApply<i8> = SaturatingApply::default();
        let mut total = 120i8;
        assert!(sat.apply(&mut total, &7));
        assert_eq!(total, i8::MAX);
        assert!(sat.apply(&mut total, &-8));
        assert_eq!(total, 119);
    }

    #[test]
    fn noop_apply() {
        let mut total = 1u32;
        assert!(!NoopApply.apply(&mut total, &5));
        assert_eq!(total, 1);
    }

    #[test]
    fn closures_are_applies() {
        let max_of = |total: &mut i32, d: &i32| {
            if *d > *total {
                *total = *d;
                true
            } else {
                false
            }
        };
        let mut total = 2;
        assert!(ApplyFn::apply(&max_of, &mut total, &5));
        assert!(!ApplyFn::apply(&max_of, &mut total, &1));
        assert_eq!(total, 5);
    }
}
