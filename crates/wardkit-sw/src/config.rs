//! Worker configuration.
//!
//! Everything here is fixed at build/deploy time and injected once when the
//! worker is constructed. Bumping `cache_name` is the only supported way to
//! invalidate previously cached assets: the new worker version installs into
//! the new store and activation purges every other store.

use serde::{Deserialize, Serialize};
use url::Url;

/// Deploy-time worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Current cache store name — the deployment version stamp.
    pub cache_name: String,

    /// Application origin. Requests from any other origin bypass the worker.
    pub origin: Url,

    /// Root document path, also the navigation fallback target.
    pub app_root: String,

    /// Assets precached during install. Query-string suffixes (`?v=N`) bust
    /// intermediate HTTP caches when content changes without a path change.
    pub static_assets: Vec<String>,

    /// Minimal install set, retried when the full list fails.
    pub fallback_assets: Vec<String>,

    /// Backend prefix. Never intercepted, never cached.
    pub api_prefix: String,

    /// Path suffixes that mark an app-shell asset.
    pub shell_extensions: Vec<String>,

    /// Path substrings that mark build-output bundles as app-shell.
    pub shell_markers: Vec<String>,

    /// Notification tag used when a push payload carries none. Same-tag
    /// notifications replace each other instead of stacking.
    pub default_tag: String,

    /// Icon shown on notifications.
    pub notification_icon: String,

    /// Badge shown on notifications.
    pub notification_badge: String,

    /// Optional cap on total cached body bytes.
    pub quota_bytes: Option<u64>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            cache_name: "ward-v6".to_string(),
            origin: Url::parse("https://ward.example.org").expect("static origin URL"),
            app_root: "/".to_string(),
            static_assets: vec![
                "/".to_string(),
                "/manifest.json?v=6".to_string(),
                "/icons/icon-192.png".to_string(),
                "/icons/icon-512.png".to_string(),
            ],
            fallback_assets: vec!["/".to_string(), "/manifest.json?v=6".to_string()],
            api_prefix: "/api/".to_string(),
            shell_extensions: vec![
                ".js".to_string(),
                ".css".to_string(),
                ".woff".to_string(),
                ".woff2".to_string(),
            ],
            shell_markers: vec![
                "/assets/".to_string(),
                "/static/js/".to_string(),
                "/static/css/".to_string(),
            ],
            default_tag: "ward".to_string(),
            notification_icon: "/icons/icon-192.png".to_string(),
            notification_badge: "/icons/icon-72.png".to_string(),
            quota_bytes: None,
        }
    }
}

impl WorkerConfig {
    /// Resolve an application path against the configured origin.
    pub fn resolve(&self, path: &str) -> Result<Url, url::ParseError> {
        self.origin.join(path)
    }
}
