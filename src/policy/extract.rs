// ============================================================================
// spark-aggregates - Extract Functors
// The per-element value a Min/Max total ranks
// ============================================================================

use std::ops::Mul;

use num_traits::AsPrimitive;

/// Maps an element's fields to the value a Min/Max total ranks.
///
/// Any `Fn(&F1, &F2) -> T` closure is an extract function.
pub trait ExtractFn<F1, F2, T>: Send + Sync + 'static {
    fn extract(&self, field1: &F1, field2: &F2) -> T;
}

impl<F1, F2, T, F> ExtractFn<F1, F2, T> for F
where
    F: Fn(&F1, &F2) -> T + Send + Sync + 'static,
{
    #[inline]
    fn extract(&self, field1: &F1, field2: &F2) -> T {
        self(field1, field2)
    }
}

/// field1, cast into the total type.
#[derive(Debug, Clone, Copy, Default)]
pub struct Field1Extract;

impl<F1, F2, T> ExtractFn<F1, F2, T> for Field1Extract
where
    F1: AsPrimitive<T>,
    T: Copy + 'static,
{
    #[inline]
    fn extract(&self, field1: &F1, _field2: &F2) -> T {
        field1.as_()
    }
}

/// field2, cast into the total type.
#[derive(Debug, Clone, Copy, Default)]
pub struct Field2Extract;

impl<F1, F2, T> ExtractFn<F1, F2, T> for Field2Extract
where
    F2: AsPrimitive<T>,
    T: Copy + 'static,
{
    #[inline]
    fn extract(&self, _field1: &F1, field2: &F2) -> T {
        field2.as_()
    }
}

/// field1 · field2.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotionalExtract;

impl<F1, F2, T> ExtractFn<F1, F2, T> for NotionalExtract
where
    F1: AsPrimitive<T>,
    F2: AsPrimitive<T>,
    T: Copy + Mul<Output = T> + 'static,
{
    #[inline]
    fn extract(&self, field1: &F1, field2: &F2) -> T {
        field2.as_() * field1.as_()
    }
}

/// Always `T::default()`. Used as the extractor of Sum totals, which never rank.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopExtract;

impl<F1, F2, T: Default> ExtractFn<F1, F2, T> for NoopExtract {
    #[inline]
    fn extract(&self, _: &F1, _: &F2) -> T {
        T::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_extractors() {
        let v: f64 = Field1Extract.extract(&2.5f64, &4i64);
        assert_eq!(v, 2.5);

        let v: f64 = Field2Extract.extract(&2.5f64, &4i64);
        assert_eq!(v, 4.0);

        let v: f64 = NotionalExtract.extract(&2.5f64, &4i64);
        assert_eq!(v, 10.0);

        let v: i64 = NoopExtract.extract(&2.5f64, &4i64);
        assert_eq!(v, 0);
    }

    #[test]
    fn closure_extractor() {
        let spread = |a: &i32, b: &i32| (a - b).abs();
        assert_eq!(ExtractFn::extract(&spread, &3, &10), 7);
    }
}
