// ============================================================================
// spark-aggregates - Policy Module
// Delta, apply, extract and compare functors plus the locking policy
// ============================================================================

pub mod apply;
pub mod compare;
pub mod delta;
pub mod extract;
pub mod locking;
pub mod total;

pub use apply::{AddApply, ApplyFn, NoopApply, SaturatingApply, SetApply};
pub use compare::{
    by_field1, by_field2, compare_fn, equivalent, lexicographic, precedes, reversed, CompareFn,
};
pub use delta::{DeltaFn, Field2Delta, NoopDelta, NotionalDelta};
pub use extract::{ExtractFn, Field1Extract, Field2Extract, NoopExtract, NotionalExtract};
pub use locking::LockPolicy;
pub use total::TotalPolicy;
