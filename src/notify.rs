//! Notification display capability

use std::sync::Mutex;

use async_trait::async_trait;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::NotifyError;

pub const APP_ICON: &str = "/logo192.png";
pub const APP_BADGE: &str = "/favicon.ico";
pub const DEFAULT_VIBRATE: [u32; 3] = [200, 100, 200];

/// A button shown on a notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    pub icon: Option<String>,
}

/// Payload attached to a notification and handed back on click
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    pub date_of_arrival: i64,
    pub primary_key: serde_json::Value,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: Option<String>,
    pub badge: Option<String>,
    pub tag: Option<String>,
    pub vibrate: Vec<u32>,
    pub actions: Vec<NotificationAction>,
    pub data: Option<NotificationData>,
    pub require_interaction: bool,
    pub renotify: bool,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            icon: Some(APP_ICON.to_string()),
            badge: Some(APP_BADGE.to_string()),
            tag: None,
            vibrate: Vec::new(),
            actions: Vec::new(),
            data: None,
            require_interaction: false,
            renotify: false,
        }
    }
}

/// Something that can put a notification in front of the user
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn show(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// Permission state reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPermission {
    Granted,
    Denied,
    Unsupported,
}

/// Notifier that writes notifications to the log
#[derive(Debug)]
pub struct LogNotifier {
    permission: NotificationPermission,
}

impl LogNotifier {
    pub fn new(permission: NotificationPermission) -> Self {
        Self { permission }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn show(&self, notification: Notification) -> Result<(), NotifyError> {
        match self.permission {
            NotificationPermission::Granted => {
                info!("🔔 {}: {}", notification.title, notification.body);
                Ok(())
            }
            NotificationPermission::Denied => Err(NotifyError::PermissionDenied),
            NotificationPermission::Unsupported => Err(NotifyError::Unsupported),
        }
    }
}

/// Notifier that keeps every notification it was asked to show
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    shown: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown(&self) -> Vec<Notification> {
        self.shown
            .lock()
            .map(|shown| shown.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn show(&self, notification: Notification) -> Result<(), NotifyError> {
        self.shown
            .lock()
            .map_err(|e| NotifyError::Failed(e.to_string()))?
            .push(notification);
        Ok(())
    }
}
