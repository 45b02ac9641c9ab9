//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    cache::CacheNames,
    notify::Notification,
    state::{HostState, TimerView},
};

/// Body of `PUT /api/timer/work-minutes` and `/break-minutes`
#[derive(Debug, Clone, Deserialize)]
pub struct MinutesRequest {
    pub minutes: i64,
}

/// Body of `POST /api/host/connectivity`
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectivityRequest {
    pub online: bool,
}

/// Response for timer intents
#[derive(Debug, Clone, Serialize)]
pub struct TimerResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub timer: TimerView,
}

impl TimerResponse {
    pub fn new(message: impl Into<String>, timer: TimerView) -> Self {
        Self {
            status: if timer.running { "running" } else { "paused" }.to_string(),
            message: message.into(),
            timestamp: Utc::now(),
            timer,
        }
    }
}

/// Full status response
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub timer: TimerView,
    pub ticking: bool,
    pub host: HostState,
    pub caches: CacheNames,
    pub uptime: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HostResponse {
    pub timestamp: DateTime<Utc>,
    pub host: HostState,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncResponse {
    pub tag: String,
    pub handled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PushResponse {
    pub notification: Notification,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
