//! Cache manager for memoizing API responses in memory
//!
//! Provides a `CacheManager` that stores serializable data as JSON snapshots
//! with per-entry expiry, evicting stale entries lazily when they are read.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

/// A single cached value with its expiry
#[derive(Debug, Clone)]
struct CacheEntry {
    /// JSON snapshot of the cached data
    value: Value,
    /// When the data was cached
    cached_at: DateTime<Utc>,
    /// When the entry stops being served; `None` never expires
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(at) if now >= at)
    }
}

/// Result of reading from cache, including when the data was stored
#[derive(Debug)]
pub struct CachedData<T> {
    /// The cached data
    pub data: T,
    /// When the data was originally cached
    pub cached_at: DateTime<Utc>,
}

/// Snapshot of the cache contents used for prefix invalidation and diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// All keys currently held, sorted
    pub keys: Vec<String>,
    /// Number of entries held
    pub size: usize,
    /// Entries past their TTL that have not been read (and evicted) yet
    pub expired: usize,
}

/// Manages an in-memory map of cached values with independent TTLs
///
/// Clones share the same underlying map, so one instance can be handed to
/// several services or tasks. The lock is only held for synchronous map
/// operations and never across an `.await`.
#[derive(Debug, Clone, Default)]
pub struct CacheManager {
    entries: Arc<Mutex<HashMap<String, CacheEntry>>>,
}

impl CacheManager {
    /// Creates a new, empty CacheManager
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes data to the cache with the given TTL
    ///
    /// # Arguments
    /// * `key` - Unique identifier for the cache entry (e.g., "merchants:id=42")
    /// * `data` - The data to cache (must implement Serialize)
    /// * `ttl` - How long the entry should be served
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err` if `data` cannot be serialized to JSON
    pub fn set<T: Serialize>(&self, key: &str, data: &T, ttl: Duration) -> serde_json::Result<()> {
        let value = serde_json::to_value(data)?;
        let entry = CacheEntry {
            value,
            cached_at: Utc::now(),
            expires_at: Instant::now().checked_add(ttl),
        };

        self.entries.lock().insert(key.to_string(), entry);
        Ok(())
    }

    /// Reads data from the cache
    ///
    /// Returns `None` if the entry doesn't exist, has expired, or cannot be
    /// deserialized as `T`. An expired entry is removed as a side effect.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.read(key).map(|cached| cached.data)
    }

    /// Reads data from the cache along with the time it was stored
    ///
    /// Same miss semantics as [`CacheManager::get`].
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Option<CachedData<T>> {
        let (value, cached_at) = {
            let mut entries = self.entries.lock();
            let entry = entries.get(key)?;
            if entry.is_expired(Instant::now()) {
                entries.remove(key);
                return None;
            }
            (entry.value.clone(), entry.cached_at)
        };

        let data = serde_json::from_value(value).ok()?;
        Some(CachedData { data, cached_at })
    }

    /// Removes a single entry, returning whether it was present
    pub fn delete(&self, key: &str) -> bool {
        self.entries.lock().remove(key).is_some()
    }

    /// Removes every entry
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Removes every entry whose key starts with `prefix`
    ///
    /// Returns the number of entries removed.
    pub fn delete_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        before - entries.len()
    }

    /// Returns the keys currently held, without evicting anything
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock();
        let now = Instant::now();

        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();
        let expired = entries
            .values()
            .filter(|entry| entry.is_expired(now))
            .count();

        CacheStats {
            size: keys.len(),
            keys,
            expired,
        }
    }
}
