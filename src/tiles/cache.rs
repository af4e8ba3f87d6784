use std::{hash::Hash, num::NonZeroUsize, sync::Arc};

use lru::LruCache;

use crate::core::constants::TILE_CACHE_CAPACITY;

/// In-memory bitmap cache with LRU eviction.
///
/// Used both for map tiles and for marker icons (separate instances). Values
/// are shared as `Arc` and never mutated once inserted; an insert under an
/// existing key replaces the whole entry. The cache is owned by the map's
/// frame thread, so it needs no locking.
#[derive(Debug)]
pub struct TileCache<B, K = String>
where
    K: Hash + Eq,
{
    cache: LruCache<K, Arc<B>>,
}

impl<B, K: Hash + Eq> TileCache<B, K> {
    /// Create a new cache with the given capacity (at least one entry)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(capacity),
        }
    }

    /// Look up an entry, marking it most recently used
    pub fn get<Q>(&mut self, key: &Q) -> Option<Arc<B>>
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.cache.get(key).cloned()
    }

    /// Insert (or replace) an entry, evicting the least recently used one when
    /// full. Returns the evicted key, if any.
    pub fn insert(&mut self, key: K, bitmap: B) -> Option<K> {
        self.put(key, Arc::new(bitmap))
    }

    /// Insert an already shared bitmap
    pub fn put(&mut self, key: K, bitmap: Arc<B>) -> Option<K> {
        match self.cache.push(key, bitmap) {
            // `push` hands back the old entry on replacement too; only a
            // different key means something was evicted
            Some((evicted, _)) if !self.cache.contains(&evicted) => Some(evicted),
            _ => None,
        }
    }

    /// Check presence without touching recency
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.cache.contains(key)
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<Arc<B>>
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.cache.pop(key)
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cache.cap().get()
    }
}

impl<B, K: Hash + Eq> Default for TileCache<B, K> {
    fn default() -> Self {
        Self::new(TILE_CACHE_CAPACITY)
    }
}
