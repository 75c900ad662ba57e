//! Request classification.
//!
//! Every intercepted request falls into exactly one class, recomputed per
//! request and never stored. The class decides which strategy runs: API and
//! cross-origin requests pass through untouched, app-shell and generic
//! cacheable requests go through the network-first path.

use url::Url;

use crate::config::WorkerConfig;

/// Classification of an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
    /// Different origin — never intercepted.
    CrossOrigin,
    /// Backend call — always hits the network live, never cached.
    Api,
    /// App-shell asset (root document, scripts, styles, fonts, bundles).
    AppShell,
    /// Any other same-origin request.
    Cacheable,
}

/// Classify a request URL against the worker configuration.
pub fn classify(config: &WorkerConfig, url: &Url) -> RequestClass {
    if url.origin() != config.origin.origin() {
        return RequestClass::CrossOrigin;
    }

    let path = url.path();
    if path.starts_with(&config.api_prefix) {
        return RequestClass::Api;
    }

    if path == config.app_root
        || config.shell_extensions.iter().any(|ext| path.ends_with(ext.as_str()))
        || config.shell_markers.iter().any(|marker| path.contains(marker.as_str()))
    {
        return RequestClass::AppShell;
    }

    RequestClass::Cacheable
}
