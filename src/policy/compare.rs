// ============================================================================
// spark-aggregates - Comparators
// Strict-weak orderings over (field1, field2) pairs for the order index
// ============================================================================

use std::sync::Arc;

/// `cmp(a1, a2, b1, b2)`: true when element A strictly precedes element B.
///
/// Must be a strict weak ordering. Equivalent elements are still totally
/// ordered by the index through their ids.
pub type CompareFn<F1, F2> = Arc<dyn Fn(&F1, &F2, &F1, &F2) -> bool + Send + Sync>;

/// Wrap a closure as a [`CompareFn`].
pub fn compare_fn<F1, F2>(
    f: impl Fn(&F1, &F2, &F1, &F2) -> bool + Send + Sync + 'static,
) -> CompareFn<F1, F2> {
    Arc::new(f)
}

/// `a < b`, with values that are unordered even against themselves (NaN)
/// ranked after every other value and equivalent to each other.
///
/// Plain `<` is not a strict weak ordering once a NaN is involved, and the
/// order index requires one.
#[inline]
pub fn precedes<T: PartialOrd>(a: &T, b: &T) -> bool {
    match a.partial_cmp(b) {
        Some(ordering) => ordering.is_lt(),
        None => a.partial_cmp(a).is_some() && b.partial_cmp(b).is_none(),
    }
}

/// Ascending by field1, then field2. The default comparator.
///
/// NaN fields sort last (see [`precedes`]).
pub fn lexicographic<F1, F2>() -> CompareFn<F1, F2>
where
    F1: PartialOrd + 'static,
    F2: PartialOrd + 'static,
{
    Arc::new(|a1: &F1, a2: &F2, b1: &F1, b2: &F2| {
        if precedes(a1, b1) {
            return true;
        }
        if precedes(b1, a1) {
            return false;
        }
        precedes(a2, b2)
    })
}

/// Ascending by field1 only. NaN sorts last.
pub fn by_field1<F1, F2>() -> CompareFn<F1, F2>
where
    F1: PartialOrd + 'static,
    F2: 'static,
{
    Arc::new(|a1: &F1, _: &F2, b1: &F1, _: &F2| precedes(a1, b1))
}

/// Ascending by field2 only. NaN sorts last.
pub fn by_field2<F1, F2>() -> CompareFn<F1, F2>
where
    F1: 'static,
    F2: PartialOrd + 'static,
{
    Arc::new(|_: &F1, a2: &F2, _: &F1, b2: &F2| precedes(a2, b2))
}

/// The same ordering, reversed.
pub fn reversed<F1, F2>(cmp: CompareFn<F1, F2>) -> CompareFn<F1, F2>
where
    F1: 'static,
    F2: 'static,
{
    Arc::new(move |a1: &F1, a2: &F2, b1: &F1, b2: &F2| cmp(b1, b2, a1, a2))
}

/// Neither pair strictly precedes the other.
#[inline]
pub fn equivalent<F1, F2>(cmp: &CompareFn<F1, F2>, a1: &F1, a2: &F2, b1: &F1, b2: &F2) -> bool {
    !cmp(a1, a2, b1, b2) && !cmp(b1, b2, a1, a2)
}
