//! Path-keyed, non-owning asset cache.

use std::sync::{Arc, Weak};

use caldera_core::alloc::HashMap;

/// Maps a path key to a weak reference to a previously created asset.
///
/// The cache never owns assets and never proactively evicts: once every
/// strong holder releases an asset, its entry goes dead and simply sits
/// there until a later request for the same key overwrites it. Each asset
/// type gets its own cache instance.
pub struct AssetCache<T> {
    entries: HashMap<String, Weak<T>>,
}

impl<T> Default for AssetCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> AssetCache<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Look up a live asset for `path`. A dead entry does not satisfy the
    /// request.
    pub fn get(&self, path: &str) -> Option<Arc<T>> {
        self.entries.get(path).and_then(Weak::upgrade)
    }

    /// Register an asset under `path`, replacing any (dead or live) entry.
    pub fn insert(&mut self, path: &str, asset: &Arc<T>) {
        self.entries.insert(path.to_string(), Arc::downgrade(asset));
    }

    /// Wipe every entry. In-flight loads are not cancelled; their
    /// completions just no longer find a cache entry to collide with.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of entries, dead ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_entry_is_shared() {
        let mut cache = AssetCache::new();
        let asset = Arc::new("brick".to_string());
        cache.insert("brick.png", &asset);

        let hit = cache.get("brick.png").unwrap();
        assert!(Arc::ptr_eq(&hit, &asset));
    }

    #[test]
    fn test_dead_entry_does_not_satisfy_requests() {
        let mut cache = AssetCache::new();
        let asset = Arc::new("brick".to_string());
        cache.insert("brick.png", &asset);
        drop(asset);

        // The entry stays, but a lookup misses.
        assert_eq!(cache.len(), 1);
        assert!(cache.get("brick.png").is_none());

        // A fresh insert for the same key replaces the dead entry.
        let replacement = Arc::new("brick2".to_string());
        cache.insert("brick.png", &replacement);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("brick.png").is_some());
    }

    #[test]
    fn test_clear() {
        let mut cache = AssetCache::new();
        let asset = Arc::new(1u32);
        cache.insert("a", &asset);
        cache.insert("b", &asset);

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get("a").is_none());
    }
}
