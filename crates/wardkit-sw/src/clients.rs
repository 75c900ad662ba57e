//! Open application windows, as seen by the worker.
//!
//! The registry backs notification-click routing (focus an existing window
//! instead of opening a duplicate) and the claim step of activation.

use hashbrown::HashMap;
use tracing::debug;
use url::Url;

use crate::WorkerError;

/// An open window at some origin.
#[derive(Debug, Clone)]
pub struct WindowClient {
    /// Client id, unique within this registry.
    pub id: String,

    /// Current window URL.
    pub url: Url,

    /// Whether the window currently has focus.
    pub focused: bool,

    /// Whether this worker controls the window's requests.
    pub controlled: bool,
}

/// Registry of open windows.
#[derive(Debug, Default)]
pub struct Clients {
    clients: HashMap<String, WindowClient>,
    next_id: u64,
}

impl Clients {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an existing (uncontrolled) window. Returns its id.
    pub fn add(&mut self, url: Url) -> String {
        self.next_id += 1;
        let id = format!("client-{}", self.next_id);
        self.clients.insert(
            id.clone(),
            WindowClient {
                id: id.clone(),
                url,
                focused: false,
                controlled: false,
            },
        );
        id
    }

    /// Remove a window (tab closed).
    pub fn remove(&mut self, id: &str) -> Option<WindowClient> {
        self.clients.remove(id)
    }

    /// Look up a window by id.
    pub fn get(&self, id: &str) -> Option<&WindowClient> {
        self.clients.get(id)
    }

    /// All windows at the given origin, controlled or not.
    pub fn same_origin(&self, origin: &Url) -> Vec<&WindowClient> {
        self.clients
            .values()
            .filter(|c| c.url.origin() == origin.origin())
            .collect()
    }

    /// Focus a window.
    pub fn focus(&mut self, id: &str) -> bool {
        for client in self.clients.values_mut() {
            client.focused = client.id == id;
        }
        self.clients.contains_key(id)
    }

    /// Point a window at a new URL.
    pub fn navigate(&mut self, id: &str, url: Url) -> bool {
        match self.clients.get_mut(id) {
            Some(client) => {
                client.url = url;
                true
            }
            None => false,
        }
    }

    /// Open a new focused window. Returns its id.
    pub fn open_window(&mut self, url: Url) -> Result<String, WorkerError> {
        let id = self.add(url);
        self.focus(&id);
        debug!(client = %id, "Opened new window");
        Ok(id)
    }

    /// Take control of every open window (activation step), so interception
    /// starts without a reload. Returns how many windows were claimed.
    pub fn claim(&mut self) -> usize {
        let mut claimed = 0;
        for client in self.clients.values_mut() {
            if !client.controlled {
                client.controlled = true;
                claimed += 1;
            }
        }
        claimed
    }

    /// Number of open windows.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Whether no windows are open.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
