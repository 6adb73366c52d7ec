// ============================================================================
// spark-aggregates - Subscription
// Handle to a callback registered on one or more cells
// ============================================================================

use std::fmt;
use std::sync::{Arc, Weak};

use crate::core::types::{AnyCell, Subscriber, SubscriberId};

// =============================================================================
// SUBSCRIPTION
// =============================================================================

/// Registration of one callback on a set of cells.
///
/// Cancelling (or dropping) the subscription detaches the callback from every
/// cell and suppresses any notification still queued in a batch, so a
/// callback never runs after its owner has torn it down.
///
/// The subscription holds its cells weakly: it does not keep them alive.
pub struct Subscription {
    subscriber: Arc<Subscriber>,
    cells: Vec<Weak<dyn AnyCell>>,
}

impl Subscription {
    /// Register `subscriber` on every cell in `cells`.
    pub fn attach(subscriber: Arc<Subscriber>, cells: &[Arc<dyn AnyCell>]) -> Self {
        for cell in cells {
            cell.add_subscriber(subscriber.clone());
        }
        Self {
            subscriber,
            cells: cells.iter().map(Arc::downgrade).collect(),
        }
    }

    pub fn id(&self) -> SubscriberId {
        self.subscriber.id()
    }

    /// False once cancelled.
    pub fn is_active(&self) -> bool {
        self.subscriber.is_active()
    }

    /// Number of cells this subscription is still attached to.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Detach from every cell. Idempotent.
    pub fn cancel(&mut self) {
        self.subscriber.deactivate();
        for cell in self.cells.drain(..) {
            if let Some(cell) = cell.upgrade() {
                cell.remove_subscriber(self.subscriber.id());
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id())
            .field("active", &self.is_active())
            .field("cells", &self.cells.len())
            .finish()
    }
}

/// Run `callback` whenever any of `cells` changes.
///
/// Inside a batch the callback runs once, after the batch, no matter how
/// many of the cells were written.
pub fn watch(
    cells: &[Arc<dyn AnyCell>],
    callback: impl Fn() + Send + Sync + 'static,
) -> Subscription {
    Subscription::attach(Subscriber::new(callback), cells)
}

// =============================================================================
// TESTS
// =============================================================================
