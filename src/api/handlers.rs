//! HTTP endpoint handlers

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use tracing::{error, info};

use super::{
    responses::{
        ConnectivityRequest, HealthResponse, HostResponse, MinutesRequest, PushResponse,
        StatusResponse, SyncResponse, TimerResponse,
    },
    ServerContext,
};
use crate::{
    cache::{ClickOutcome, NotificationClick},
    error::Result,
    state::{HostSignals, TimerView},
};

fn respond(result: Result<TimerView>, action: &str, message: &str) -> std::result::Result<Json<TimerResponse>, StatusCode> {
    match result {
        Ok(timer) => {
            info!("{} endpoint called - {}", action, message);
            Ok(Json(TimerResponse::new(message, timer)))
        }
        Err(e) => {
            error!("Failed to {} timer: {}", action, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Handle POST /api/timer/start
pub async fn start_handler(State(ctx): State<ServerContext>) -> std::result::Result<Json<TimerResponse>, StatusCode> {
    respond(ctx.app.start().await, "start", "Timer started")
}

/// Handle POST /api/timer/pause
pub async fn pause_handler(State(ctx): State<ServerContext>) -> std::result::Result<Json<TimerResponse>, StatusCode> {
    respond(ctx.app.pause().await, "pause", "Timer paused")
}

/// Handle POST /api/timer/reset
pub async fn reset_handler(State(ctx): State<ServerContext>) -> std::result::Result<Json<TimerResponse>, StatusCode> {
    respond(ctx.app.reset().await, "reset", "Timer reset")
}

/// Handle PUT /api/timer/work-minutes
pub async fn work_minutes_handler(
    State(ctx): State<ServerContext>,
    Json(request): Json<MinutesRequest>,
) -> std::result::Result<Json<TimerResponse>, StatusCode> {
    respond(
        ctx.app.set_work_minutes(request.minutes).await,
        "set work minutes",
        "Work duration updated",
    )
}

/// Handle PUT /api/timer/break-minutes
pub async fn break_minutes_handler(
    State(ctx): State<ServerContext>,
    Json(request): Json<MinutesRequest>,
) -> std::result::Result<Json<TimerResponse>, StatusCode> {
    respond(
        ctx.app.set_break_minutes(request.minutes).await,
        "set break minutes",
        "Break duration updated",
    )
}

/// Handle GET /api/timer - Return current timer status
pub async fn status_handler(State(ctx): State<ServerContext>) -> std::result::Result<Json<StatusResponse>, StatusCode> {
    let timer = match ctx.app.view() {
        Ok(timer) => timer,
        Err(e) => {
            error!("Failed to get timer state: {}", e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let (last_action, last_action_time) = ctx.app.get_last_action();

    Ok(Json(StatusResponse {
        timer,
        ticking: ctx.app.is_ticking(),
        host: ctx.app.host_state(),
        caches: ctx.cache.names().clone(),
        uptime: ctx.app.get_uptime(),
        last_action,
        last_action_time,
    }))
}

/// Handle POST /api/host/connectivity
pub async fn connectivity_handler(
    State(ctx): State<ServerContext>,
    Json(request): Json<ConnectivityRequest>,
) -> Json<HostResponse> {
    ctx.app.on_connectivity_change(request.online);
    Json(HostResponse {
        timestamp: Utc::now(),
        host: ctx.app.host_state(),
    })
}

/// Handle POST /api/host/installable
pub async fn installable_handler(State(ctx): State<ServerContext>) -> Json<HostResponse> {
    ctx.app.on_installable();
    Json(HostResponse {
        timestamp: Utc::now(),
        host: ctx.app.host_state(),
    })
}

/// Handle POST /sw/sync/:tag
pub async fn sync_handler(State(ctx): State<ServerContext>, Path(tag): Path<String>) -> Json<SyncResponse> {
    let handled = ctx.cache.background_sync(&tag).await;
    Json(SyncResponse { tag, handled })
}

/// Handle POST /sw/periodic-sync/:tag
pub async fn periodic_sync_handler(State(ctx): State<ServerContext>, Path(tag): Path<String>) -> Json<SyncResponse> {
    let handled = ctx.cache.periodic_sync(&tag).await;
    Json(SyncResponse { tag, handled })
}

/// Handle POST /sw/push - body is the raw push payload
pub async fn push_handler(State(ctx): State<ServerContext>, body: Bytes) -> Json<PushResponse> {
    let notification = ctx.cache.push(Some(&body)).await;
    Json(PushResponse { notification })
}

/// Handle POST /sw/notification-click
pub async fn notification_click_handler(
    State(ctx): State<ServerContext>,
    Json(click): Json<NotificationClick>,
) -> Json<ClickOutcome> {
    Json(ctx.cache.notification_click(click).await)
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
