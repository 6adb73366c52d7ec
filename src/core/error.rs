// ============================================================================
// spark-aggregates - Errors
// ============================================================================

use super::types::ElemId;

/// Errors surfaced by collection accessors.
///
/// Removing an absent id or key is not an error (it is a no-op), so this
/// enum only covers programming mistakes the caller should hear about.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollectionError {
    /// A field handle was requested for an id that is not (or no longer) live.
    #[error("element {id} not found")]
    ElementNotFound { id: ElemId },

    /// An order-index operation was called on a collection built without
    /// order tracking.
    #[error("order tracking is disabled for this collection")]
    OrderTrackingDisabled,
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, CollectionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        let err = CollectionError::ElementNotFound { id: 7 };
        assert_eq!(err.to_string(), "element 7 not found");

        let err = CollectionError::OrderTrackingDisabled;
        assert!(err.to_string().contains("order tracking"));
    }
}
