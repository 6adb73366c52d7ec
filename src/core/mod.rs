// ============================================================================
// spark-aggregates - Core Module
// Fundamental types, errors and the thread-local batching context
// ============================================================================

pub mod constants;
pub mod context;
pub mod error;
pub mod types;

// Re-export commonly used items
pub use constants::*;
pub use context::{with_context, ReactiveContext};
pub use error::{CollectionError, Result};
pub use types::{
    default_equals, AggMode, AnyCell, CellInner, ElemId, ElemKey, ElemSnapshot, EqualsFn, Scalar,
    Subscriber, SubscriberId, TotalValue,
};
