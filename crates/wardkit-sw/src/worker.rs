//! The offline worker: one state machine, one handler per event kind.
//!
//! Handlers are async and run on the platform's single-threaded, cooperative
//! event loop: a handler suspends at every cache or network await, other
//! events may start while it is suspended, and concurrent in-flight fetches
//! for different URLs are expected. Same-key cache puts are last-write-wins;
//! the only lock is the one around the store itself.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use wardkit_cache::CacheStorage;

use crate::classify::{classify, RequestClass};
use crate::clients::Clients;
use crate::config::WorkerConfig;
use crate::fetch::{
    cache_key, spawn_cache_write, FetchOutcome, FetchRequest, FetchResponse, Network,
};
use crate::lifecycle::{precache, WorkerState};
use crate::push::{NotificationCenter, NotificationDescriptor, PushPayload};
use crate::WorkerError;

/// A platform lifecycle event.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Install,
    Activate,
    Fetch(FetchRequest),
    /// Push message, with its raw payload if one was delivered.
    Push(Option<Bytes>),
    NotificationClick {
        tag: String,
        /// Action button the user chose, if any.
        action: Option<String>,
    },
    NotificationClose {
        tag: String,
    },
}

/// What an event produced.
#[derive(Debug)]
pub enum EventOutcome {
    /// Event handled; nothing to return to the platform.
    Done,
    /// Fetch decision for the platform to apply.
    Fetch(FetchOutcome),
}

/// The offline cache worker.
pub struct OfflineWorker {
    config: WorkerConfig,
    state: RwLock<WorkerState>,
    storage: Arc<RwLock<CacheStorage>>,
    network: Arc<dyn Network>,
    clients: Arc<RwLock<Clients>>,
    notifications: Arc<RwLock<NotificationCenter>>,
    skip_waiting: AtomicBool,
}

impl OfflineWorker {
    /// Create a worker over the platform's network backend.
    pub fn new(config: WorkerConfig, network: Arc<dyn Network>) -> Self {
        let storage = match config.quota_bytes {
            Some(quota) => CacheStorage::with_quota(quota),
            None => CacheStorage::new(),
        };
        Self {
            config,
            state: RwLock::new(WorkerState::Parsed),
            storage: Arc::new(RwLock::new(storage)),
            network,
            clients: Arc::new(RwLock::new(Clients::new())),
            notifications: Arc::new(RwLock::new(NotificationCenter::new())),
            skip_waiting: AtomicBool::new(false),
        }
    }

    /// The worker configuration.
    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    /// Shared handle to the cache storage.
    pub fn storage(&self) -> Arc<RwLock<CacheStorage>> {
        self.storage.clone()
    }

    /// Shared handle to the window-client registry.
    pub fn clients(&self) -> Arc<RwLock<Clients>> {
        self.clients.clone()
    }

    /// Shared handle to the notification center.
    pub fn notifications(&self) -> Arc<RwLock<NotificationCenter>> {
        self.notifications.clone()
    }

    /// Whether install requested immediate activation.
    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    async fn set_state(&self, state: WorkerState) {
        *self.state.write().await = state;
    }

    /// Dispatch a platform event to its handler.
    pub async fn dispatch(&self, event: WorkerEvent) -> Result<EventOutcome, WorkerError> {
        match event {
            WorkerEvent::Install => self.handle_install().await.map(|_| EventOutcome::Done),
            WorkerEvent::Activate => self.handle_activate().await.map(|_| EventOutcome::Done),
            WorkerEvent::Fetch(request) => {
                self.handle_fetch(request).await.map(EventOutcome::Fetch)
            }
            WorkerEvent::Push(payload) => self
                .handle_push(payload)
                .await
                .map(|_| EventOutcome::Done),
            WorkerEvent::NotificationClick { tag, action } => self
                .handle_notification_click(&tag, action.as_deref())
                .await
                .map(|_| EventOutcome::Done),
            WorkerEvent::NotificationClose { tag } => {
                self.handle_notification_close(&tag);
                Ok(EventOutcome::Done)
            }
        }
    }

    /// Install: precache the static asset list into the current-version
    /// store, falling back to the minimal set, then request skip-waiting.
    ///
    /// The returned future is the wait-until contract: install is not
    /// complete until it settles. On failure the worker goes redundant and
    /// the previously active version stays live; the platform may retry
    /// install later.
    pub async fn handle_install(&self) -> Result<(), WorkerError> {
        self.set_state(WorkerState::Installing).await;

        let full = precache(
            &self.network,
            &self.storage,
            &self.config.origin,
            &self.config.cache_name,
            &self.config.static_assets,
        )
        .await;

        if let Err(error) = full {
            warn!(%error, "Full precache failed, retrying with fallback set");
            if let Err(error) = precache(
                &self.network,
                &self.storage,
                &self.config.origin,
                &self.config.cache_name,
                &self.config.fallback_assets,
            )
            .await
            {
                self.set_state(WorkerState::Redundant).await;
                return Err(WorkerError::InstallFailed(error.to_string()));
            }
        }

        self.skip_waiting.store(true, Ordering::SeqCst);
        self.set_state(WorkerState::Installed).await;
        info!(cache = %self.config.cache_name, "Install complete, skip-waiting requested");
        Ok(())
    }

    /// Activate: purge every stale cache store and claim open windows.
    ///
    /// The platform dispatches this only after install has settled, so the
    /// purge can never delete a store that is still being populated.
    pub async fn handle_activate(&self) -> Result<(), WorkerError> {
        if self.state().await != WorkerState::Installed {
            return Err(WorkerError::BadState(
                "activate before successful install".to_string(),
            ));
        }
        self.set_state(WorkerState::Activating).await;

        let purged = self
            .storage
            .write()
            .await
            .purge_except(&self.config.cache_name);
        let claimed = self.clients.write().await.claim();

        self.set_state(WorkerState::Activated).await;
        info!(cache = %self.config.cache_name, ?purged, claimed, "Worker activated");
        Ok(())
    }

    /// Fetch: classify the request and run the matching strategy.
    pub async fn handle_fetch(&self, request: FetchRequest) -> Result<FetchOutcome, WorkerError> {
        // Only an activated worker intercepts anything.
        if self.state().await != WorkerState::Activated {
            return Ok(FetchOutcome::Passthrough);
        }
        if request.method != "GET" {
            return Ok(FetchOutcome::Passthrough);
        }

        match classify(&self.config, &request.url) {
            RequestClass::CrossOrigin | RequestClass::Api => Ok(FetchOutcome::Passthrough),
            RequestClass::AppShell => self.network_first(request, true).await,
            RequestClass::Cacheable => self.network_first(request, false).await,
        }
    }

    /// Network-first: await the live response, cache 200s as a detached
    /// side effect, and degrade through cache → cached root (navigations) →
    /// terminal fallback on network failure.
    ///
    /// For app-shell requests the terminal fallback is an error (never-fetched
    /// shell assets cannot be synthesized); for generic requests it is the
    /// 503 `"Offline"` placeholder.
    async fn network_first(
        &self,
        request: FetchRequest,
        shell: bool,
    ) -> Result<FetchOutcome, WorkerError> {
        let key = cache_key(&request.url);

        match self.network.fetch(request.clone()).await {
            Ok(response) => {
                if response.ok() {
                    spawn_cache_write(
                        self.storage.clone(),
                        self.config.cache_name.clone(),
                        response.to_entry(&key),
                    );
                }
                Ok(FetchOutcome::Response(response))
            }
            Err(error) => {
                debug!(%error, url = %request.url, "Network failed, consulting cache");
                let storage = self.storage.read().await;

                if let Some(entry) = storage.match_in(&self.config.cache_name, &key) {
                    return Ok(FetchOutcome::Response(FetchResponse::from_entry(entry)));
                }

                // A navigation should land on something navigable: serve the
                // cached root document rather than a raw error.
                if request.is_navigation {
                    if let Some(root) =
                        storage.match_in(&self.config.cache_name, &self.config.app_root)
                    {
                        return Ok(FetchOutcome::Response(FetchResponse::from_entry(root)));
                    }
                }

                if shell {
                    Err(WorkerError::Offline(key))
                } else {
                    Ok(FetchOutcome::Response(FetchResponse::offline()))
                }
            }
        }
    }

    /// Push: parse the payload and display a notification.
    ///
    /// No payload and malformed payloads are silent no-ops, not errors.
    pub async fn handle_push(&self, payload: Option<Bytes>) -> Result<(), WorkerError> {
        let raw = match payload {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Ok(()),
        };

        let payload: PushPayload = match serde_json::from_slice(&raw) {
            Ok(payload) => payload,
            Err(error) => {
                warn!(%error, "Ignoring malformed push payload");
                return Ok(());
            }
        };

        let descriptor = NotificationDescriptor::from_payload(payload, &self.config);
        debug!(tag = %descriptor.tag, title = %descriptor.title, "Displaying notification");
        self.notifications.write().await.show(descriptor);
        Ok(())
    }

    /// Notification click: close first, then route into the application.
    ///
    /// Focuses an existing same-origin window (navigating it when the target
    /// is not the root) instead of opening a duplicate; opens a new window
    /// only when none is open.
    pub async fn handle_notification_click(
        &self,
        tag: &str,
        action: Option<&str>,
    ) -> Result<(), WorkerError> {
        let descriptor = self.notifications.write().await.close(tag);

        if action == Some("close") {
            return Ok(());
        }

        let target_path = descriptor
            .map(|d| d.url)
            .unwrap_or_else(|| self.config.app_root.clone());
        let target = self.config.resolve(&target_path)?;

        let mut clients = self.clients.write().await;
        let existing = clients
            .same_origin(&self.config.origin)
            .first()
            .map(|c| c.id.clone());

        match existing {
            Some(id) => {
                clients.focus(&id);
                if target_path != self.config.app_root {
                    clients.navigate(&id, target);
                }
            }
            None => {
                clients.open_window(target)?;
            }
        }
        Ok(())
    }

    /// Notification close: observation point only, no state change.
    pub fn handle_notification_close(&self, tag: &str) {
        debug!(%tag, "Notification dismissed");
    }
}
