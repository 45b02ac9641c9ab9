//! HTTP API module
//!
//! Timer intents, host signals and cache events are plain routes; every other
//! request falls through to the offline cache.

pub mod assets;
pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post, put},
    Router,
};
use reqwest::Url;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    cache::{ClientRegistry, OfflineCacheManager},
    state::AppState,
};
use assets::asset_handler;
use handlers::*;

/// Shared handles given to every handler
#[derive(Clone, Debug)]
pub struct ServerContext {
    pub app: Arc<AppState>,
    pub cache: Arc<OfflineCacheManager>,
    pub clients: Arc<ClientRegistry>,
}

impl ServerContext {
    pub fn new(
        app: Arc<AppState>,
        cache: Arc<OfflineCacheManager>,
        clients: Arc<ClientRegistry>,
    ) -> Self {
        Self { app, cache, clients }
    }

    fn cache_origin(&self) -> Url {
        self.cache.origin.clone()
    }
}

/// Create the HTTP router with all endpoints
pub fn create_router(ctx: ServerContext) -> Router {
    Router::new()
        .route("/api/timer", get(status_handler))
        .route("/api/timer/start", post(start_handler))
        .route("/api/timer/pause", post(pause_handler))
        .route("/api/timer/reset", post(reset_handler))
        .route("/api/timer/work-minutes", put(work_minutes_handler))
        .route("/api/timer/break-minutes", put(break_minutes_handler))
        .route("/api/host/connectivity", post(connectivity_handler))
        .route("/api/host/installable", post(installable_handler))
        .route("/sw/sync/:tag", post(sync_handler))
        .route("/sw/periodic-sync/:tag", post(periodic_sync_handler))
        .route("/sw/push", post(push_handler))
        .route("/sw/notification-click", post(notification_click_handler))
        .route("/health", get(health_handler))
        .fallback(asset_handler)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(ctx)
}
