//! Background sync, push and notification events

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{clients::WindowClient, manager::OfflineCacheManager};
use crate::{
    error::NotifyError,
    notify::{
        Notification, NotificationAction, NotificationData, APP_BADGE, APP_ICON, DEFAULT_VIBRATE,
    },
};

pub const SYNC_TAG: &str = "pomodoro-sync";
pub const REMINDER_TAG: &str = "pomodoro-reminder";

/// Push message body; every field is optional
#[derive(Debug, Default, Deserialize)]
pub struct PushPayload {
    pub title: Option<String>,
    pub body: Option<String>,
    pub id: Option<serde_json::Value>,
    pub url: Option<String>,
}

/// A click on a shown notification
#[derive(Debug, Default, Clone, Deserialize)]
pub struct NotificationClick {
    /// `start`, `close`, or none for a click on the body
    pub action: Option<String>,
    /// Target URL from the notification data
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum ClickOutcome {
    Dismissed,
    Focused { client: WindowClient },
    Opened { client: WindowClient },
    Failed { url: String },
}

impl OfflineCacheManager {
    /// Background sync. Only `pomodoro-sync` is handled and it has nothing to
    /// send yet.
    pub async fn background_sync(&self, tag: &str) -> bool {
        if tag != SYNC_TAG {
            debug!("Ignoring sync tag {}", tag);
            return false;
        }
        info!("Background sync triggered");
        // TODO: upload completed sessions once a sync endpoint exists.
        debug!("Nothing to sync");
        true
    }

    /// Show a notification built from a push message, falling back to fixed
    /// text for absent fields
    pub async fn push(&self, payload: Option<&[u8]>) -> Notification {
        let payload = match payload {
            Some(raw) if !raw.is_empty() => serde_json::from_slice(raw).unwrap_or_else(|e| {
                warn!("Ignoring malformed push payload: {}", e);
                PushPayload::default()
            }),
            _ => PushPayload::default(),
        };

        let mut notification = Notification::new(
            payload.title.unwrap_or_else(|| "Pomodoro Timer".to_string()),
            payload.body.unwrap_or_else(|| "Time to take a break!".to_string()),
        );
        notification.vibrate = DEFAULT_VIBRATE.to_vec();
        notification.require_interaction = true;
        notification.data = Some(NotificationData {
            date_of_arrival: Utc::now().timestamp_millis(),
            primary_key: payload.id.unwrap_or_else(|| serde_json::Value::from(1)),
            url: payload.url.unwrap_or_else(|| "/".to_string()),
        });
        notification.actions = vec![
            NotificationAction {
                action: "start".to_string(),
                title: "Start Timer".to_string(),
                icon: Some(APP_ICON.to_string()),
            },
            NotificationAction {
                action: "close".to_string(),
                title: "Close".to_string(),
                icon: Some(APP_BADGE.to_string()),
            },
        ];

        self.show(notification.clone()).await;
        notification
    }

    /// Focus an open app window or open a new one. `close` only dismisses.
    pub async fn notification_click(&self, click: NotificationClick) -> ClickOutcome {
        debug!("Notification click received: {:?}", click.action);

        let start = match click.action.as_deref() {
            Some("close") => return ClickOutcome::Dismissed,
            Some("start") => true,
            _ => false,
        };

        let raw_url = click.url.as_deref().unwrap_or("/");
        let mut target = match self.origin.join(raw_url) {
            Ok(url) => url,
            Err(e) => {
                warn!("Invalid notification url {}: {}", raw_url, e);
                return ClickOutcome::Failed {
                    url: raw_url.to_string(),
                };
            }
        };
        if start {
            target.query_pairs_mut().append_pair("action", "start");
        }

        let app_origin = self.origin.origin();
        for client in self.clients.windows().await {
            let same_origin = reqwest::Url::parse(&client.url)
                .map(|url| url.origin() == app_origin)
                .unwrap_or(false);
            if same_origin {
                if let Some(client) = self.clients.focus(client.id).await {
                    return ClickOutcome::Focused { client };
                }
            }
        }

        match self.clients.open_window(&target).await {
            Some(client) => ClickOutcome::Opened { client },
            None => ClickOutcome::Failed {
                url: target.to_string(),
            },
        }
    }

    /// Periodic sync. `pomodoro-reminder` shows a fixed reminder.
    pub async fn periodic_sync(&self, tag: &str) -> bool {
        if tag != REMINDER_TAG {
            debug!("Ignoring periodic sync tag {}", tag);
            return false;
        }

        let mut notification = Notification::new(
            "Pomodoro Reminder",
            "Don't forget to use your Pomodoro Timer for better productivity!",
        );
        notification.tag = Some("reminder".to_string());
        notification.renotify = true;

        self.show(notification).await;
        true
    }

    async fn show(&self, notification: Notification) {
        match self.notifier.show(notification).await {
            Ok(()) => {}
            Err(NotifyError::PermissionDenied | NotifyError::Unsupported) => {
                debug!("Notifications unavailable, skipping");
            }
            Err(e) => warn!("Failed to show notification: {}", e),
        }
    }
}
