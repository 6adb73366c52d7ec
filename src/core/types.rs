// ============================================================================
// spark-aggregates - Type Definitions
// Scalar traits, type-erased cell interface and the data behind a cell
// ============================================================================

use std::any::Any;
use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};

use parking_lot::{Mutex, RwLock};

use super::constants::{FIRST_SUBSCRIBER_ID, INITIAL_CELL_VERSION};

// =============================================================================
// IDENTIFIERS & SCALARS
// =============================================================================

/// Identifier of an element. Allocated monotonically, never reused.
pub type ElemId = u64;

/// Identifier of a cell subscriber.
pub type SubscriberId = u64;

/// Anything that can live in a field or a total.
///
/// `Default` stands in for "zero": insertion is modelled as a transition
/// from the default pair, removal as a transition back to it.
pub trait Scalar: Clone + Default + PartialEq + Send + Sync + 'static {}

impl<T> Scalar for T where T: Clone + Default + PartialEq + Send + Sync + 'static {}

/// A total that can be ranked, so Min/Max totals can index it.
///
/// Floats rank by IEEE 754 `total_cmp`, which keeps NaN from corrupting
/// the value→count index.
pub trait TotalValue: Scalar {
    fn total_cmp(&self, other: &Self) -> Ordering;
}

macro_rules! total_value_ord {
    ($($t:ty),* $(,)?) => {
        $(
            impl TotalValue for $t {
                #[inline]
                fn total_cmp(&self, other: &Self) -> Ordering {
                    Ord::cmp(self, other)
                }
            }
        )*
    };
}

total_value_ord!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl TotalValue for f32 {
    #[inline]
    fn total_cmp(&self, other: &Self) -> Ordering {
        f32::total_cmp(self, other)
    }
}

impl TotalValue for f64 {
    #[inline]
    fn total_cmp(&self, other: &Self) -> Ordering {
        f64::total_cmp(self, other)
    }
}

/// An application key for by-key lookup and removal.
pub trait ElemKey: Eq + Hash + Clone + Send + Sync + 'static {}

impl<K> ElemKey for K where K: Eq + Hash + Clone + Send + Sync + 'static {}

/// How a total folds per-element contributions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AggMode {
    /// Running accumulation of per-element deltas.
    #[default]
    Sum,
    /// Smallest extracted value across live elements.
    Min,
    /// Largest extracted value across live elements.
    Max,
}

/// A copy of an element's last-known fields and key.
#[derive(Debug, Clone, PartialEq)]
pub struct ElemSnapshot<F1, F2, K> {
    pub field1: F1,
    pub field2: F2,
    pub key: Option<K>,
}

// =============================================================================
// SUBSCRIBER
// =============================================================================

static NEXT_SUBSCRIBER_ID: AtomicU64 = AtomicU64::new(FIRST_SUBSCRIBER_ID);

/// A callback registered on one or more cells.
///
/// Subscribers are shared by `Arc` so the same callback can sit on several
/// cells and still be notified once per batch.
pub struct Subscriber {
    id: SubscriberId,
    active: AtomicBool,
    callback: Box<dyn Fn() + Send + Sync>,
}

impl Subscriber {
    pub fn new(callback: impl Fn() + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            id: NEXT_SUBSCRIBER_ID.fetch_add(1, AtomicOrdering::Relaxed),
            active: AtomicBool::new(true),
            callback: Box::new(callback),
        })
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.active.load(AtomicOrdering::Acquire)
    }

    /// Stop delivering. Notifications already queued in a batch are dropped.
    pub fn deactivate(&self) {
        self.active.store(false, AtomicOrdering::Release);
    }

    /// Run the callback unless the subscriber was deactivated.
    pub fn notify(&self) {
        if self.is_active() {
            (self.callback)();
        }
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

// =============================================================================
// TYPE-ERASED CELL INTERFACE
// =============================================================================
//
// Subscriptions span cells of different value types (an element watches its
// field1 cell and its field2 cell), so teardown goes through this trait and
// never needs T.
// =============================================================================

/// Type-erased cell interface used for subscription bookkeeping.
pub trait AnyCell: Any + Send + Sync {
    /// Write version, incremented whenever the value changes.
    fn version(&self) -> u64;

    /// Number of registered subscribers.
    fn subscriber_count(&self) -> usize;

    /// Register a subscriber.
    fn add_subscriber(&self, subscriber: Arc<Subscriber>);

    /// Deregister a subscriber by id. Unknown ids are ignored.
    fn remove_subscriber(&self, id: SubscriberId);

    /// Deregister every subscriber.
    fn clear_subscribers(&self);

    /// Upcast to Any for downcasting.
    fn as_any(&self) -> &dyn Any;
}

// =============================================================================
// CELL INNER (the data behind ObservableCell<T>)
// =============================================================================

/// Equality function type for comparing cell values
pub type EqualsFn<T> = fn(&T, &T) -> bool;

/// Default equality using PartialEq
pub fn default_equals<T: PartialEq>(a: &T, b: &T) -> bool {
    a == b
}

/// The shared state of an observable cell.
///
/// Writers take the value lock only for the write itself; subscribers are
/// collected afterwards and called with no lock held.
pub struct CellInner<T> {
    value: RwLock<T>,
    version: AtomicU64,
    subscribers: Mutex<Vec<Arc<Subscriber>>>,
    equals: EqualsFn<T>,
}

impl<T> CellInner<T> {
    pub fn new(value: T) -> Self
    where
        T: PartialEq,
    {
        Self::new_with_equals(value, default_equals)
    }

    pub fn new_with_equals(value: T, equals: EqualsFn<T>) -> Self {
        Self {
            value: RwLock::new(value),
            version: AtomicU64::new(INITIAL_CELL_VERSION),
            subscribers: Mutex::new(Vec::new()),
            equals,
        }
    }

    /// Get the current value (cloning)
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.value.read().clone()
    }

    /// Get the current value with a closure (avoids clone)
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.read())
    }

    /// Store `value` unless it equals the current one. Returns true if it changed.
    pub(crate) fn set(&self, value: T) -> bool {
        let mut current = self.value.write();
        if (self.equals)(&current, &value) {
            return false;
        }
        *current = value;
        self.version.fetch_add(1, AtomicOrdering::AcqRel);
        true
    }

    /// Mutate in place. Always counts as a change.
    pub(crate) fn update(&self, f: impl FnOnce(&mut T)) {
        let mut current = self.value.write();
        f(&mut current);
        self.version.fetch_add(1, AtomicOrdering::AcqRel);
    }

    /// Live subscribers at this instant.
    pub fn subscribers(&self) -> Vec<Arc<Subscriber>> {
        self.subscribers
            .lock()
            .iter()
            .filter(|s| s.is_active())
            .cloned()
            .collect()
    }

    pub fn equals_fn(&self) -> EqualsFn<T> {
        self.equals
    }
}

impl<T: Send + Sync + 'static> AnyCell for CellInner<T> {
    fn version(&self) -> u64 {
        self.version.load(AtomicOrdering::Acquire)
    }

    fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    fn add_subscriber(&self, subscriber: Arc<Subscriber>) {
        let mut subs = self.subscribers.lock();
        if !subs.iter().any(|s| s.id() == subscriber.id()) {
            subs.push(subscriber);
        }
    }

    fn remove_subscriber(&self, id: SubscriberId) {
        self.subscribers.lock().retain(|s| s.id() != id);
    }

    fn clear_subscribers(&self) {
        self.subscribers.lock().clear();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// =============================================================================
// TESTS
// =============================================================================
