use dashmap::DashMap;
use std::{hash::Hash, sync::Arc};

/// A process local keyed store for entities owned by a remote authority.
///
/// Entries are only ever inserted whole or evicted, never modified in place.
pub struct ResourceCache<K, V> {
    entries: DashMap<K, Arc<V>>,
}

impl<K: Eq + Hash, V> ResourceCache<K, V> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.entries.get(key).map(|e| Arc::clone(e.value()))
    }

    /// Store a value, replacing whatever was cached under the key
    pub fn insert(&self, key: K, value: V) -> Arc<V> {
        let value = Arc::new(value);
        self.entries.insert(key, Arc::clone(&value));
        value
    }

    pub fn evict(&self, key: &K) -> Option<Arc<V>> {
        self.entries.remove(key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Eq + Hash, V> Default for ResourceCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_and_evict_removes() {
        let cache = ResourceCache::new();
        cache.insert(1_u64, "stale");
        let fresh = cache.insert(1, "fresh");
        assert_eq!(*fresh, "fresh");
        assert_eq!(cache.get(&1).as_deref(), Some(&"fresh"));
        assert_eq!(cache.len(), 1);

        assert!(cache.evict(&1).is_some());
        assert!(cache.evict(&1).is_none());
        assert!(cache.is_empty());
    }
}
