// ============================================================================
// spark-aggregates - Reactivity Module
// Batching, notification delivery and change detection
// ============================================================================

pub mod batching;
pub mod equality;
pub mod scheduling;

// Re-export scheduling functions
pub use scheduling::{flush_pending, notify_subscribers};

// Re-export batching functions
pub use batching::{batch, is_batching};
