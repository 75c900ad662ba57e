//! # WardKit Service Worker
//!
//! Offline cache worker for the Ward PWA.
//!
//! The worker is a single event-driven state machine: the platform dispatches
//! a lifecycle event, the worker picks a strategy from the event kind and the
//! request classification, reads or writes the versioned cache store, and
//! hands a response (or a displayed notification) back to the platform.
//!
//! ## Features
//!
//! - **Lifecycle**: install (precache the app shell, with a minimal fallback
//!   set), activate (purge stale cache versions, claim open windows)
//! - **Fetch interception**: network-first with cache fallback, synthesized
//!   offline response, navigation fallback to the cached root document
//! - **Push notifications**: payload parsing, tag-based replacement with
//!   forced renotify, click routing into open application windows
//!
//! ## Architecture
//!
//! ```text
//! OfflineWorker
//!     ├── WorkerConfig        (deploy-time constants, never mutated)
//!     ├── CacheStorage        ("ward-v6" → URL → response snapshot)
//!     ├── dyn Network         (platform fetch seam)
//!     ├── Clients             (open application windows)
//!     └── NotificationCenter  (displayed notifications, keyed by tag)
//!
//! WorkerEvent::{Install, Activate, Fetch, Push,
//!               NotificationClick, NotificationClose}
//!     └── dispatch() → one handler per event kind
//! ```

use thiserror::Error;

pub mod classify;
pub mod clients;
pub mod config;
pub mod fetch;
pub mod lifecycle;
pub mod push;
pub mod worker;

pub use classify::{classify, RequestClass};
pub use clients::{Clients, WindowClient};
pub use config::WorkerConfig;
pub use fetch::{BoxFuture, FetchOutcome, FetchRequest, FetchResponse, Network, ResponseSource};
pub use lifecycle::WorkerState;
pub use push::{NotificationCenter, NotificationDescriptor, PushAction, PushPayload};
pub use worker::{EventOutcome, OfflineWorker, WorkerEvent};

/// Errors that can occur in worker operations.
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Install failed: {0}")]
    InstallFailed(String),

    #[error("Network request failed: {0}")]
    NetworkFailed(String),

    #[error("Offline and not cached: {0}")]
    Offline(String),

    #[error("State error: {0}")]
    BadState(String),

    #[error("Cache error: {0}")]
    Cache(#[from] wardkit_cache::CacheError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
