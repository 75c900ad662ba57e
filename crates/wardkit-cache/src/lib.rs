//! # WardKit Cache
//!
//! Versioned response cache stores for the Ward offline worker.
//!
//! A [`CacheStorage`] holds named [`Cache`] stores; each store maps a GET
//! request URL to a stored response snapshot ([`CacheEntry`]). Exactly one
//! store is "current" per worker version — everything else is stale and is
//! removed wholesale by [`CacheStorage::purge_except`] when a new version
//! activates. There is no per-entry TTL or LRU: bumping the store name is
//! the eviction mechanism.
//!
//! ## Architecture
//!
//! ```text
//! CacheStorage (one per worker)
//!     ├── "ward-v5"  (stale, deleted on activate)
//!     └── "ward-v6"  (current)
//!             └── URL → CacheEntry (status, headers, body)
//! ```

use bytes::Bytes;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

/// Errors that can occur in cache storage operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("Storage quota exceeded: need {needed} bytes, {available} available")]
    QuotaExceeded { needed: u64, available: u64 },

    #[error("No such cache: {0}")]
    NoSuchCache(String),
}

/// Milliseconds since the Unix epoch.
fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// A stored response snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Request URL this snapshot answers.
    pub url: String,

    /// Response status code.
    pub status: u16,

    /// Response headers.
    pub headers: HashMap<String, String>,

    /// Response body.
    pub body: Bytes,

    /// When the snapshot was stored (ms since epoch).
    pub cached_at: u64,
}

impl CacheEntry {
    /// Create a snapshot timestamped now.
    pub fn new(url: &str, status: u16, headers: HashMap<String, String>, body: Bytes) -> Self {
        Self {
            url: url.to_string(),
            status,
            headers,
            body,
            cached_at: now_ms(),
        }
    }

    /// Body size in bytes.
    pub fn body_len(&self) -> u64 {
        self.body.len() as u64
    }
}

/// A named cache store: GET URL → response snapshot.
///
/// Upserts are last-write-wins; a later snapshot for the same URL simply
/// replaces the earlier one.
#[derive(Debug, Default)]
pub struct Cache {
    /// Store name (the deployment version stamp, e.g. `"ward-v6"`).
    pub name: String,

    entries: HashMap<String, CacheEntry>,
    bytes_used: u64,
}

impl Cache {
    /// Create an empty store.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: HashMap::new(),
            bytes_used: 0,
        }
    }

    /// Look up the snapshot for an exact URL.
    pub fn match_url(&self, url: &str) -> Option<&CacheEntry> {
        self.entries.get(url)
    }

    /// Store a snapshot, replacing any previous one for the same URL.
    pub fn put(&mut self, entry: CacheEntry) {
        trace!(cache = %self.name, url = %entry.url, bytes = entry.body_len(), "Cache put");
        self.bytes_used += entry.body_len();
        if let Some(old) = self.entries.insert(entry.url.clone(), entry) {
            self.bytes_used -= old.body_len();
        }
    }

    /// Remove the snapshot for a URL.
    pub fn delete(&mut self, url: &str) -> bool {
        match self.entries.remove(url) {
            Some(old) => {
                self.bytes_used -= old.body_len();
                true
            }
            None => false,
        }
    }

    /// All stored URLs.
    pub fn keys(&self) -> Vec<&str> {
        self.entries.keys().map(|s| s.as_str()).collect()
    }

    /// Number of stored snapshots.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total body bytes held by this store.
    pub fn bytes_used(&self) -> u64 {
        self.bytes_used
    }
}

/// All cache stores for one worker, with an optional byte quota.
#[derive(Debug, Default)]
pub struct CacheStorage {
    caches: HashMap<String, Cache>,
    quota_bytes: Option<u64>,
}

impl CacheStorage {
    /// Create unbounded storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create storage that rejects writes past `quota_bytes` of body data.
    pub fn with_quota(quota_bytes: u64) -> Self {
        Self {
            caches: HashMap::new(),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Open a store, creating it lazily on first use.
    pub fn open(&mut self, name: &str) -> &mut Cache {
        self.caches
            .entry(name.to_string())
            .or_insert_with(|| Cache::new(name))
    }

    /// Whether a store exists.
    pub fn has(&self, name: &str) -> bool {
        self.caches.contains_key(name)
    }

    /// Delete a whole store.
    pub fn delete(&mut self, name: &str) -> bool {
        self.caches.remove(name).is_some()
    }

    /// Names of all stores.
    pub fn keys(&self) -> Vec<&str> {
        self.caches.keys().map(|s| s.as_str()).collect()
    }

    /// Total body bytes across all stores.
    pub fn bytes_used(&self) -> u64 {
        self.caches.values().map(Cache::bytes_used).sum()
    }

    /// Look up a URL in a specific store.
    pub fn match_in(&self, cache_name: &str, url: &str) -> Option<&CacheEntry> {
        self.caches.get(cache_name)?.match_url(url)
    }

    /// Look up a URL across every store.
    pub fn match_url(&self, url: &str) -> Option<&CacheEntry> {
        self.caches.values().find_map(|c| c.match_url(url))
    }

    /// Store a snapshot into a named store, enforcing the quota.
    ///
    /// Replacing an entry only counts the size delta against the quota.
    pub fn put(&mut self, cache_name: &str, entry: CacheEntry) -> Result<(), CacheError> {
        if let Some(quota) = self.quota_bytes {
            let replaced = self
                .match_in(cache_name, &entry.url)
                .map(CacheEntry::body_len)
                .unwrap_or(0);
            let used = self.bytes_used() - replaced;
            let needed = entry.body_len();
            if used + needed > quota {
                return Err(CacheError::QuotaExceeded {
                    needed,
                    available: quota.saturating_sub(used),
                });
            }
        }
        self.open(cache_name).put(entry);
        Ok(())
    }

    /// Delete every store whose name differs from `current`.
    ///
    /// This is the sole eviction mechanism: it runs when a new worker
    /// version activates, retiring the previous version's stores in one
    /// step. Returns the deleted names.
    pub fn purge_except(&mut self, current: &str) -> Vec<String> {
        let stale: Vec<String> = self
            .caches
            .keys()
            .filter(|name| name.as_str() != current)
            .cloned()
            .collect();
        for name in &stale {
            self.caches.remove(name);
            debug!(cache = %name, "Purged stale cache store");
        }
        stale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(url: &str, body: &str) -> CacheEntry {
        CacheEntry::new(url, 200, HashMap::new(), Bytes::from(body.to_string()))
    }

    #[test]
    fn test_put_and_match() {
        let mut cache = Cache::new("ward-v6");
        cache.put(entry("/", "<html>"));

        assert!(cache.match_url("/").is_some());
        assert!(cache.match_url("/other").is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_put_is_last_write_wins() {
        let mut cache = Cache::new("ward-v6");
        cache.put(entry("/app.js", "v1"));
        cache.put(entry("/app.js", "v2-longer"));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.match_url("/app.js").unwrap().body, Bytes::from("v2-longer"));
        assert_eq!(cache.bytes_used(), "v2-longer".len() as u64);
    }

    #[test]
    fn test_delete_adjusts_accounting() {
        let mut cache = Cache::new("ward-v6");
        cache.put(entry("/a", "aaaa"));
        cache.put(entry("/b", "bb"));
        assert_eq!(cache.bytes_used(), 6);

        assert!(cache.delete("/a"));
        assert!(!cache.delete("/a"));
        assert_eq!(cache.bytes_used(), 2);
    }

    #[test]
    fn test_open_is_lazy() {
        let mut storage = CacheStorage::new();
        assert!(!storage.has("ward-v6"));

        storage.open("ward-v6");
        assert!(storage.has("ward-v6"));
    }

    #[test]
    fn test_match_across_stores() {
        let mut storage = CacheStorage::new();
        storage.open("ward-v5").put(entry("/old.css", "x"));
        storage.open("ward-v6").put(entry("/", "<html>"));

        assert!(storage.match_url("/old.css").is_some());
        assert!(storage.match_in("ward-v6", "/").is_some());
        assert!(storage.match_in("ward-v6", "/old.css").is_none());
    }

    #[test]
    fn test_purge_except_retains_only_current() {
        let mut storage = CacheStorage::new();
        storage.open("ward-v3");
        storage.open("ward-v5");
        storage.open("ward-v6").put(entry("/", "<html>"));

        let mut deleted = storage.purge_except("ward-v6");
        deleted.sort();
        assert_eq!(deleted, vec!["ward-v3".to_string(), "ward-v5".to_string()]);

        assert!(storage.has("ward-v6"));
        assert!(!storage.has("ward-v3"));
        assert!(!storage.has("ward-v5"));
        assert!(storage.match_in("ward-v6", "/").is_some());
    }

    #[test]
    fn test_quota_rejects_oversized_write() {
        let mut storage = CacheStorage::with_quota(10);
        storage.put("ward-v6", entry("/a", "12345")).unwrap();

        let err = storage.put("ward-v6", entry("/b", "1234567")).unwrap_err();
        assert_eq!(
            err,
            CacheError::QuotaExceeded {
                needed: 7,
                available: 5,
            }
        );

        // Replacing an existing entry only charges the delta.
        storage.put("ward-v6", entry("/a", "123456789")).unwrap();
        assert_eq!(storage.bytes_used(), 9);
    }

    #[test]
    fn test_entry_is_timestamped() {
        let e = entry("/", "x");
        assert!(e.cached_at > 0);
        assert_eq!(e.body_len(), 1);
    }
}
