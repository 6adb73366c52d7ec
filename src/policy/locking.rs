// ============================================================================
// spark-aggregates - Locking Policy
// ============================================================================

use parking_lot::{Mutex, MutexGuard};

/// Locking granularity for mutating collection operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LockPolicy {
    /// Rely on the concurrent store, the per-total locks and the order-index
    /// lock. Mutations on different elements proceed in parallel.
    #[default]
    Fine,
    /// Serialise insert, remove, batch insert, comparator swap and rebuild
    /// through one collection-wide mutex.
    Coarse,
}

/// The collection-wide mutex, taken only under [`LockPolicy::Coarse`].
pub(crate) struct CoarseLock {
    policy: LockPolicy,
    mutex: Mutex<()>,
}

impl CoarseLock {
    pub(crate) fn new(policy: LockPolicy) -> Self {
        Self {
            policy,
            mutex: Mutex::new(()),
        }
    }

    /// Guard for one mutating operation, or `None` under the fine policy.
    pub(crate) fn acquire(&self) -> Option<MutexGuard<'_, ()>> {
        match self.policy {
            LockPolicy::Fine => None,
            LockPolicy::Coarse => Some(self.mutex.lock()),
        }
    }
}
