//! Fetch types and the network seam.
//!
//! The worker never talks to a socket itself: everything goes through the
//! [`Network`] trait, which the embedding platform implements over its own
//! fetch machinery (and tests implement with programmable mocks). Cache
//! writes on the response path are detached via [`spawn_cache_write`] —
//! best-effort, logged on failure, never awaited by the caller.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use hashbrown::HashMap;
use tokio::sync::RwLock;
use tracing::warn;
use url::Url;

use wardkit_cache::{CacheEntry, CacheStorage};

use crate::WorkerError;

/// Boxed future returned by [`Network::fetch`].
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The platform's fetch machinery, as seen by the worker.
pub trait Network: Send + Sync {
    /// Perform a live request. Timeout and abort behavior are the backend's
    /// own; the worker imposes none of its own.
    fn fetch(&self, request: FetchRequest) -> BoxFuture<'static, Result<FetchResponse, WorkerError>>;
}

/// An intercepted request.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Absolute request URL.
    pub url: Url,

    /// Request method. Only GET is ever served from cache.
    pub method: String,

    /// Whether this is a top-level page navigation rather than a
    /// sub-resource load.
    pub is_navigation: bool,
}

impl FetchRequest {
    /// A GET sub-resource request.
    pub fn get(url: Url) -> Self {
        Self {
            url,
            method: "GET".to_string(),
            is_navigation: false,
        }
    }

    /// A top-level navigation request.
    pub fn navigation(url: Url) -> Self {
        Self {
            url,
            method: "GET".to_string(),
            is_navigation: true,
        }
    }
}

/// Where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    /// Live network response.
    Network,
    /// Served from the cache store.
    Cache,
    /// Built by the worker itself (offline placeholder).
    Synthesized,
}

/// A response handed back to the platform.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// Status code.
    pub status: u16,

    /// Status text.
    pub status_text: String,

    /// Response headers.
    pub headers: HashMap<String, String>,

    /// Response body.
    pub body: Bytes,

    /// Where this response originated.
    pub source: ResponseSource,
}

impl FetchResponse {
    /// A successful network response.
    pub fn network(status: u16, headers: HashMap<String, String>, body: Bytes) -> Self {
        Self {
            status,
            status_text: String::new(),
            headers,
            body,
            source: ResponseSource::Network,
        }
    }

    /// The synthesized offline placeholder: 503, plain-text `"Offline"`.
    ///
    /// Returned only when nothing is cached and the request is not a
    /// navigation.
    pub fn offline() -> Self {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "text/plain".to_string());
        Self {
            status: 503,
            status_text: "Service Unavailable".to_string(),
            headers,
            body: Bytes::from_static(b"Offline"),
            source: ResponseSource::Synthesized,
        }
    }

    /// Rehydrate a response from a cached snapshot.
    pub fn from_entry(entry: &CacheEntry) -> Self {
        Self {
            status: entry.status,
            status_text: String::new(),
            headers: entry.headers.clone(),
            body: entry.body.clone(),
            source: ResponseSource::Cache,
        }
    }

    /// Snapshot this response for the cache under `key`.
    pub fn to_entry(&self, key: &str) -> CacheEntry {
        CacheEntry::new(key, self.status, self.headers.clone(), self.body.clone())
    }

    /// Whether this is an HTTP 200 — the only responses the worker caches.
    pub fn ok(&self) -> bool {
        self.status == 200
    }
}

/// Result of intercepting a request.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// Not intercepted — default browser handling applies.
    Passthrough,
    /// The worker's response.
    Response(FetchResponse),
}

/// Cache identity for a request: path plus query, GET-only by construction.
///
/// Cross-origin requests never reach the cache, so the origin is not part
/// of the key.
pub fn cache_key(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

/// Detach a best-effort cache write.
///
/// The write is spawned and dropped, never joined against the response path:
/// a failed put (quota, storage gone) is logged and swallowed so it cannot
/// add latency or fail the user-visible response.
pub(crate) fn spawn_cache_write(
    storage: Arc<RwLock<CacheStorage>>,
    cache_name: String,
    entry: CacheEntry,
) {
    tokio::spawn(async move {
        let url = entry.url.clone();
        if let Err(error) = storage.write().await.put(&cache_name, entry) {
            warn!(%error, cache = %cache_name, %url, "Dropping failed cache write");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_placeholder() {
        let response = FetchResponse::offline();
        assert_eq!(response.status, 503);
        assert_eq!(response.body, Bytes::from_static(b"Offline"));
        assert_eq!(response.source, ResponseSource::Synthesized);
        assert!(!response.ok());
    }

    #[test]
    fn test_entry_round_trip_source() {
        let response = FetchResponse::network(200, HashMap::new(), Bytes::from_static(b"<html>"));
        let entry = response.to_entry("/");
        assert_eq!(entry.url, "/");
        assert_eq!(entry.status, 200);

        let cached = FetchResponse::from_entry(&entry);
        assert_eq!(cached.source, ResponseSource::Cache);
        assert_eq!(cached.body, response.body);
    }

    #[test]
    fn test_cache_key_keeps_query() {
        let url = Url::parse("https://ward.example.org/manifest.json?v=6").unwrap();
        assert_eq!(cache_key(&url), "/manifest.json?v=6");

        let url = Url::parse("https://ward.example.org/dashboard").unwrap();
        assert_eq!(cache_key(&url), "/dashboard");
    }

    #[test]
    fn test_request_constructors() {
        let url = Url::parse("https://ward.example.org/").unwrap();
        let get = FetchRequest::get(url.clone());
        assert_eq!(get.method, "GET");
        assert!(!get.is_navigation);

        let nav = FetchRequest::navigation(url);
        assert!(nav.is_navigation);
    }

    #[tokio::test]
    async fn test_spawned_write_failure_is_swallowed() {
        // Quota of zero: every write fails, and nothing observable breaks.
        let storage = Arc::new(RwLock::new(CacheStorage::with_quota(0)));
        let entry = CacheEntry::new("/big", 200, HashMap::new(), Bytes::from_static(b"body"));

        spawn_cache_write(storage.clone(), "ward-v6".to_string(), entry);
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        assert!(storage.read().await.match_in("ward-v6", "/big").is_none());
    }
}
