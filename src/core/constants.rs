// ============================================================================
// spark-aggregates - Constants
// Identifier seeds shared by the collection and the cell layer
// ============================================================================

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// First identifier handed out by a collection. Zero is never a live id.
pub const FIRST_ELEM_ID: u64 = 1;

/// First identifier handed out to a cell subscriber.
pub const FIRST_SUBSCRIBER_ID: u64 = 1;

/// Initial version of a freshly created cell. Bumped on every change.
pub const INITIAL_CELL_VERSION: u64 = 0;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_start_above_zero() {
        assert!(FIRST_ELEM_ID > 0);
        assert!(FIRST_SUBSCRIBER_ID > 0);
    }

    #[test]
    fn cells_start_unversioned() {
        assert_eq!(INITIAL_CELL_VERSION, 0);
    }
}
