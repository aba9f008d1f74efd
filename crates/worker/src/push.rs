//! Push payloads and notification clicks.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BODY: &str = "New update available!";
const ICON: &str = "/assets/icons/icon-192x192.png";
const BADGE: &str = "/assets/icons/badge-72x72.png";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct NotificationData {
    /// Milliseconds since the Unix epoch.
    pub date_of_arrival: i64,
    pub primary_key: u32,
}

/// A notification ready to be shown by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub data: NotificationData,
    pub actions: Vec<NotificationAction>,
}

#[derive(Deserialize)]
struct PushOverrides {
    title: Option<String>,
    body: Option<String>,
}

impl Notification {
    /// Build the notification for a push event.
    ///
    /// An absent or blank payload gives the defaults. A JSON object may
    /// override `title` and `body`. Any other text becomes the body. A
    /// payload that isn't UTF-8, or looks like a JSON object but doesn't
    /// parse, also gives the defaults.
    pub fn from_push(payload: Option<&[u8]>, app_name: &str, now: DateTime<Utc>) -> Self {
        let mut notification = Self::defaults(app_name, now);

        let Some(bytes) = payload else { return notification };
        let Ok(text) = std::str::from_utf8(bytes) else {
            tracing::debug!(len = bytes.len(), "push payload is not UTF-8, using defaults");
            return notification;
        };
        let text = text.trim();
        if text.is_empty() {
            return notification;
        }

        if text.starts_with('{') {
            match serde_json::from_str::<PushOverrides>(text) {
                Ok(overrides) => {
                    if let Some(title) = overrides.title.filter(|t| !t.trim().is_empty()) {
                        notification.title = title;
                    }
                    if let Some(body) = overrides.body.filter(|b| !b.trim().is_empty()) {
                        notification.body = body;
                    }
                }
                Err(e) => tracing::debug!(error = %e, "malformed push payload, using defaults"),
            }
        } else {
            notification.body = text.to_string();
        }

        notification
    }

    fn defaults(app_name: &str, now: DateTime<Utc>) -> Self {
        Self {
            title: app_name.to_string(),
            body: DEFAULT_BODY.to_string(),
            icon: ICON.to_string(),
            badge: BADGE.to_string(),
            vibrate: vec![100, 50, 100],
            data: NotificationData { date_of_arrival: now.timestamp_millis(), primary_key: 1 },
            actions: vec![
                NotificationAction {
                    action: "explore".into(),
                    title: "View Update".into(),
                    icon: "/assets/icons/checkmark.png".into(),
                },
                NotificationAction { action: "close".into(), title: "Close".into(), icon: "/assets/icons/xmark.png".into() },
            ],
        }
    }
}

/// In-app URL to open for a clicked notification action.
pub fn route_click(action: &str, routes: &BTreeMap<String, String>) -> Option<String> {
    if action == "close" {
        return None;
    }
    routes.get(action).cloned()
}
