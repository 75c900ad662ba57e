//! Worker lifecycle: state ladder and install-time precaching.
//!
//! Install populates the current-version store with the static asset list
//! (falling back to a minimal set), activate purges every other store and
//! claims open windows. The platform guarantees activate runs only after
//! install has settled, so the purge can never race the population.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, trace};
use url::Url;

use wardkit_cache::CacheStorage;

use crate::fetch::{FetchRequest, Network};
use crate::WorkerError;

/// Worker lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerState {
    /// Initial state, not yet installed.
    Parsed,
    /// Install event in flight.
    Installing,
    /// Installed, eligible to activate.
    Installed,
    /// Activate event in flight.
    Activating,
    /// Active and intercepting requests.
    Activated,
    /// Install failed or worker replaced; the previous version stays live.
    Redundant,
}

impl Default for WorkerState {
    fn default() -> Self {
        Self::Parsed
    }
}

/// Fetch every asset and store it in the named cache.
///
/// A non-200 status counts as failure: caching an error page into the app
/// shell would be worse than a smaller install set. Returns the number of
/// assets stored.
pub(crate) async fn precache(
    network: &Arc<dyn Network>,
    storage: &Arc<RwLock<CacheStorage>>,
    origin: &Url,
    cache_name: &str,
    assets: &[String],
) -> Result<usize, WorkerError> {
    for path in assets {
        let url = origin.join(path)?;
        trace!(%url, cache = %cache_name, "Precaching asset");

        let response = network.fetch(FetchRequest::get(url)).await?;
        if !response.ok() {
            return Err(WorkerError::InstallFailed(format!(
                "{} returned status {}",
                path, response.status
            )));
        }

        storage
            .write()
            .await
            .put(cache_name, response.to_entry(path))?;
    }

    debug!(cache = %cache_name, assets = assets.len(), "Precache complete");
    Ok(assets.len())
}
