// ============================================================================
// spark-aggregates - Primitives Module
// Observable cells and the subscriptions attached to them
// ============================================================================

pub mod cell;
pub mod subscription;

// Re-export for convenience
pub use cell::{cell, cell_f32, cell_f64, ObservableCell, ReadOnlyCell};
pub use subscription::{watch, Subscription};
