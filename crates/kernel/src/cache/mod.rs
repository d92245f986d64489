//! Durable content cache with tag-based invalidation.
//!
//! The cached value is always the ordered list of child ids, never the
//! hydrated blocks, so entries stay small and block data is always loaded
//! fresh from storage.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use moka::sync::Cache;
use tracing::debug;
use uuid::Uuid;

/// Default maximum number of cached id lists.
pub const DEFAULT_CAPACITY: u64 = 10_000;

/// Durable cache layer for ordered child-id lists.
///
/// Entries are registered under one or more tags (the host's cache tag);
/// invalidating a tag drops every entry registered with it. Population is a
/// plain key-set: concurrent writers race benignly because every writer
/// derives the same value from the same query.
#[derive(Clone)]
pub struct CacheLayer {
    inner: Arc<CacheLayerInner>,
}

struct CacheLayerInner {
    entries: Cache<String, Vec<Uuid>>,
    tags: DashMap<String, HashSet<String>>,
}

impl CacheLayer {
    /// Create a new cache layer with the given capacity.
    pub fn new(capacity: u64) -> Self {
        Self {
            inner: Arc::new(CacheLayerInner {
                entries: Cache::builder().max_capacity(capacity).build(),
                tags: DashMap::new(),
            }),
        }
    }

    /// Get a cached id list.
    pub fn get(&self, key: &str) -> Option<Vec<Uuid>> {
        let value = self.inner.entries.get(key);
        if value.is_some() {
            debug!(key = %key, "content cache hit");
        }
        value
    }

    /// Store an id list and register it with each tag.
    pub fn set(&self, key: &str, ids: Vec<Uuid>, tags: &[String]) {
        self.inner.entries.insert(key.to_string(), ids);

        for tag in tags {
            self.inner
                .tags
                .entry(tag.clone())
                .or_default()
                .insert(key.to_string());
        }

        debug!(key = %key, tags = ?tags, "content cache set");
    }

    /// Invalidate a single cache key.
    pub fn invalidate(&self, key: &str) {
        self.inner.entries.invalidate(key);
        debug!(key = %key, "content cache invalidated");
    }

    /// Invalidate all cache keys registered with a tag.
    pub fn invalidate_tag(&self, tag: &str) {
        let Some((_, keys)) = self.inner.tags.remove(tag) else {
            return;
        };

        for key in &keys {
            self.inner.entries.invalidate(key);
        }

        debug!(tag = %tag, keys_invalidated = keys.len(), "tag invalidated");
    }

    /// Number of entries currently cached (for monitoring).
    pub fn entry_count(&self) -> u64 {
        self.inner.entries.run_pending_tasks();
        self.inner.entries.entry_count()
    }
}

impl std::fmt::Debug for CacheLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheLayer").finish()
    }
}
