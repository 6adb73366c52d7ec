// ============================================================================
// spark-aggregates - Equality Functions
// Change detection for cells: a write that compares equal is not a change
// ============================================================================

use crate::core::types::{EqualsFn, TotalValue};

// =============================================================================
// STRICT EQUALITY (Default)
// =============================================================================

/// Default strict equality using PartialEq.
///
/// # Example
/// ```
/// use spark_aggregates::reactivity::equality::equals;
///
/// assert!(equals(&42, &42));
/// assert!(!equals(&42, &43));
/// ```
pub fn equals<T: PartialEq>(a: &T, b: &T) -> bool {
    a == b
}

// =============================================================================
// SAFE FLOAT EQUALITY
// =============================================================================

/// Safe equality for f64 values: NaN == NaN.
///
/// With plain `PartialEq` a NaN field would count as changed on every write,
/// and each write would push a NaN delta into the totals.
///
/// # Example
/// ```
/// use spark_aggregates::reactivity::equality::safe_equals_f64;
///
/// assert!(safe_equals_f64(&1.0, &1.0));
/// assert!(!safe_equals_f64(&1.0, &2.0));
/// assert!(safe_equals_f64(&f64::NAN, &f64::NAN));
/// ```
pub fn safe_equals_f64(a: &f64, b: &f64) -> bool {
    if a.is_nan() {
        return b.is_nan();
    }
    a == b
}

/// Safe equality for f32 values.
pub fn safe_equals_f32(a: &f32, b: &f32) -> bool {
    if a.is_nan() {
        return b.is_nan();
    }
    a == b
}

/// Equality by total order: equal when `total_cmp` reports `Equal`.
///
/// Used for published totals, so a NaN sentinel is not re-announced on every
/// recomputation.
pub fn total_equals<T: TotalValue>(a: &T, b: &T) -> bool {
    a.total_cmp(b) == std::cmp::Ordering::Equal
}

// =============================================================================
// FACTORY FUNCTIONS
// =============================================================================

/// Never equal: every write notifies, even with an identical value.
///
/// # Example
/// ```
/// use spark_aggregates::reactivity::equality::never_equals;
///
/// assert!(!never_equals(&42, &42));
/// ```
pub fn never_equals<T>(_a: &T, _b: &T) -> bool {
    false
}

/// Always equal: writes are dropped and never notify.
pub fn always_equals<T>(_a: &T, _b: &T) -> bool {
    true
}

/// The default equality function for a type.
pub fn default_equals_fn<T: PartialEq + 'static>() -> EqualsFn<T> {
    equals
}

// =============================================================================
// TESTS
// =============================================================================
