// ============================================================================
// spark-aggregates - Key Index
// Application key → element id, materialised on first keyed insert
// ============================================================================

use std::sync::OnceLock;

use dashmap::DashMap;

use crate::core::types::{ElemId, ElemKey};

/// Concurrent key → id map. Collections that never insert with a key never
/// allocate it.
pub(crate) struct KeyIndex<K> {
    map: OnceLock<DashMap<K, ElemId>>,
}

impl<K: ElemKey> KeyIndex<K> {
    pub(crate) fn new() -> Self {
        Self {
            map: OnceLock::new(),
        }
    }

    /// Point `key` at `id` unless another element already holds it.
    /// Returns the id the key resolves to afterwards.
    pub(crate) fn insert(&self, key: K, id: ElemId) -> ElemId {
        *self.map.get_or_init(DashMap::new).entry(key).or_insert(id)
    }

    pub(crate) fn find(&self, key: &K) -> Option<ElemId> {
        self.map.get()?.get(key).map(|entry| *entry.value())
    }

    /// Erase `key` only while it still points at `id`.
    pub(crate) fn erase(&self, key: &K, id: ElemId) -> bool {
        match self.map.get() {
            Some(map) => map.remove_if(key, |_, owner| *owner == id).is_some(),
            None => false,
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.map.get().map_or(0, |map| map.len())
    }

    #[cfg(test)]
    pub(crate) fn is_materialized(&self) -> bool {
        self.map.get().is_some()
    }
}

impl<K> KeyIndex<K> {
    /// Drop the map outright. Needs no bounds on `K`, so it can run in `Drop`.
    pub(crate) fn teardown(&mut self) {
        drop(self.map.take());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lazily_materialized() {
        let index: KeyIndex<String> = KeyIndex::new();
        assert!(!index.is_materialized());
        assert_eq!(index.find(&"a".to_string()), None);
        assert!(!index.erase(&"a".to_string(), 1));

        index.insert("a".to_string(), 1);
        assert!(index.is_materialized());
        assert_eq!(index.find(&"a".to_string()), Some(1));
    }

    #[test]
    fn first_holder_keeps_key() {
        let index: KeyIndex<&'static str> = KeyIndex::new();
        assert_eq!(index.insert("k", 1), 1);
        assert_eq!(index.insert("k", 2), 1);
        assert_eq!(index.find(&"k"), Some(1));

        // A later holder must not erase the owner's mapping
        assert!(!index.erase(&"k", 2));
        assert_eq!(index.find(&"k"), Some(1));

        assert!(index.erase(&"k", 1));
        assert_eq!(index.find(&"k"), None);
        assert_eq!(index.len(), 0);

        // Once free, the key goes to the next insert
        assert_eq!(index.insert("k", 3), 3);
    }

    #[test]
    fn teardown_releases_map() {
        let mut index: KeyIndex<u32> = KeyIndex::new();
        index.insert(1, 1);
        index.teardown();
        assert!(!index.is_materialized());
    }
}
