// ============================================================================
// spark-aggregates - Live Aggregates over a Concurrent Collection
// ============================================================================
//
// Elements carry two observable fields. Two totals (Sum, Min or Max) follow
// every field write incrementally, an optional order index keeps the
// elements sorted, and an optional key index resolves application keys.
// ============================================================================

pub mod collections;
pub mod core;
pub mod policy;
pub mod primitives;
pub mod reactivity;

// Re-export core items at crate root for ergonomic access
pub use core::constants;
pub use core::context::{with_context, ReactiveContext};
pub use core::error::{CollectionError, Result};
pub use core::types::{
    default_equals, AggMode, AnyCell, ElemId, ElemKey, ElemSnapshot, EqualsFn, Scalar, TotalValue,
};

// Re-export primitives
pub use primitives::cell::{cell, cell_f32, cell_f64, ObservableCell, ReadOnlyCell};
pub use primitives::subscription::{watch, Subscription};

// Re-export reactivity functions
pub use reactivity::batching::{batch, is_batching};
pub use reactivity::equality::{
    always_equals, equals, never_equals, safe_equals_f32, safe_equals_f64, total_equals,
};
pub use reactivity::scheduling::flush_pending;

// Re-export policy and collections
pub use policy::{CompareFn, LockPolicy, TotalPolicy};
pub use collections::{CollectionBuilder, CollectionConfig, OrderedIter, TwoFieldCollection};

// =============================================================================
// TESTS
// =============================================================================
