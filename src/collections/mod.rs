// ============================================================================
// spark-aggregates - Collections
// The two-field collection and the indexes behind it
// ============================================================================
//
// TwoFieldCollection owns three structures next to its element store:
//
// 1. Aggregate engine: two totals, each Sum, Min or Max
// 2. Key index: application key → id, allocated on first keyed insert
// 3. Order index: ids sorted by a replaceable comparator (optional)
//
// Every element watches its own two field cells; a write anywhere folds into
// all three before the writer's call returns.
// ============================================================================

mod aggregate;
mod config;
mod key_index;
mod order_index;
mod two_field;

pub use config::{CollectionBuilder, CollectionConfig};
pub use order_index::OrderedIter;
pub use two_field::TwoFieldCollection;
