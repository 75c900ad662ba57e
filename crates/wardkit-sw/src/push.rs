//! Push payloads and notification display.
//!
//! A push payload is opaque JSON from the push service; it becomes a
//! [`NotificationDescriptor`] with Ward defaults filled in, then goes to the
//! [`NotificationCenter`] — the worker's view of the platform's notification
//! tray. Notifications are keyed by tag: a new notification with an existing
//! tag replaces the old one, and because renotify is always on it still
//! alerts the user.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::WorkerConfig;

/// A button on a displayed notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushAction {
    /// Action identifier reported back on click.
    pub action: String,
    /// Button label.
    pub title: String,
}

impl PushAction {
    /// The default two-button set.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self {
                action: "open".to_string(),
                title: "Open".to_string(),
            },
            Self {
                action: "close".to_string(),
                title: "Close".to_string(),
            },
        ]
    }
}

/// Parsed push payload. Every field is optional on the wire; missing ones
/// take Ward defaults when the descriptor is built.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PushPayload {
    pub title: Option<String>,
    pub body: Option<String>,
    /// Alias for `body` used by older server versions.
    pub description: Option<String>,
    pub tag: Option<String>,
    #[serde(rename = "requireInteraction")]
    pub require_interaction: bool,
    pub url: Option<String>,
    #[serde(rename = "notificationId")]
    pub notification_id: Option<String>,
    pub actions: Option<Vec<PushAction>>,
}

/// A notification as handed to the platform for display.
#[derive(Debug, Clone)]
pub struct NotificationDescriptor {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    /// De-duplication key; same tag replaces instead of stacking.
    pub tag: String,
    /// Always true: a replacement notification must re-alert the user.
    pub renotify: bool,
    pub require_interaction: bool,
    /// Navigation target consumed on click.
    pub url: String,
    /// Opaque id passed through from the server, consumed on click.
    pub notification_id: Option<String>,
    pub actions: Vec<PushAction>,
}

impl NotificationDescriptor {
    /// Build a descriptor from a payload, filling Ward defaults.
    pub fn from_payload(payload: PushPayload, config: &WorkerConfig) -> Self {
        Self {
            title: payload.title.unwrap_or_default(),
            body: payload.body.or(payload.description).unwrap_or_default(),
            icon: config.notification_icon.clone(),
            badge: config.notification_badge.clone(),
            tag: payload.tag.unwrap_or_else(|| config.default_tag.clone()),
            renotify: true,
            require_interaction: payload.require_interaction,
            url: payload.url.unwrap_or_else(|| config.app_root.clone()),
            notification_id: payload.notification_id,
            actions: payload.actions.unwrap_or_else(PushAction::defaults),
        }
    }
}

/// The worker's mirror of the platform notification tray.
#[derive(Debug, Default)]
pub struct NotificationCenter {
    visible: HashMap<String, NotificationDescriptor>,
    alerts: u64,
}

impl NotificationCenter {
    /// Create an empty center.
    pub fn new() -> Self {
        Self::default()
    }

    /// Display a notification. Same-tag notifications replace each other,
    /// and each display alerts the user (renotify contract).
    pub fn show(&mut self, descriptor: NotificationDescriptor) {
        self.alerts += 1;
        let replaced = self
            .visible
            .insert(descriptor.tag.clone(), descriptor)
            .is_some();
        debug!(replaced, alerts = self.alerts, "Notification shown");
    }

    /// Close (and return) the notification with this tag.
    pub fn close(&mut self, tag: &str) -> Option<NotificationDescriptor> {
        self.visible.remove(tag)
    }

    /// The notification currently displayed under a tag.
    pub fn get(&self, tag: &str) -> Option<&NotificationDescriptor> {
        self.visible.get(tag)
    }

    /// Number of notifications currently displayed.
    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    /// Total times the user has been alerted, including replacements.
    pub fn alert_count(&self) -> u64 {
        self.alerts
    }
}
