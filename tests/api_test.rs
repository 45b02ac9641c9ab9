// Integration tests for the HTTP router.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use reqwest::Url;
use serde_json::{json, Value};
use tower::ServiceExt;

use pomodoro_shell::{
    api::{assets::SERVED_FROM_HEADER, create_router, ServerContext},
    cache::{
        AssetRequest, AssetResponse, CacheSettings, CacheStorage, ClientRegistry, Network,
        OfflineCacheManager,
    },
    error::NetworkError,
    notify::RecordingNotifier,
    state::{AppState, TimerSnapshot, STORAGE_KEY},
    storage::{KeyValueStore, MemoryStore},
};

const ORIGIN: &str = "http://localhost:3000";

/// Upstream that is always unreachable
struct OfflineNetwork;

#[async_trait]
impl Network for OfflineNetwork {
    async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse, NetworkError> {
        Err(NetworkError::Unreachable(request.url.to_string()))
    }
}

/// Upstream that answers 200 and remembers every request it saw
#[derive(Default)]
struct RecordingNetwork {
    seen: Mutex<Vec<String>>,
}

impl RecordingNetwork {
    fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Network for RecordingNetwork {
    async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse, NetworkError> {
        self.seen
            .lock()
            .unwrap()
            .push(format!("{} {}", request.method, request.url));
        Ok(AssetResponse::new(200, Some("text/plain"), "upstream"))
    }
}

struct TestServer {
    router: Router,
    store: Arc<MemoryStore>,
    cache: Arc<OfflineCacheManager>,
}

async fn test_server() -> TestServer {
    test_server_with(Arc::new(OfflineNetwork)).await
}

async fn test_server_with(network: Arc<dyn Network>) -> TestServer {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::restore(store.clone()).await;
    let clients = Arc::new(ClientRegistry::new());
    let cache = Arc::new(
        OfflineCacheManager::new(
            CacheSettings::new(Url::parse(ORIGIN).unwrap()),
            Arc::new(CacheStorage::new()),
            network,
            clients.clone(),
            Arc::new(RecordingNotifier::new()),
        )
        .unwrap(),
    );
    let router = create_router(ServerContext::new(state, cache.clone(), clients));
    TestServer {
        router,
        store,
        cache,
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body.to_vec())
}

async fn send_json(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let (status, _, body) = send(router, request).await;
    let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test(start_paused = true)]
async fn timer_intents_update_and_persist_state() {
    let server = test_server().await;

    let (status, body) =
        send_json(&server.router, Method::PUT, "/api/timer/work-minutes", Some(json!({"minutes": 100}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timer"]["workMinutes"], 60);
    assert_eq!(body["timer"]["remainingSeconds"], 3600);
    assert_eq!(body["timer"]["display"], "60:00");

    let (_, body) =
        send_json(&server.router, Method::PUT, "/api/timer/break-minutes", Some(json!({"minutes": 0}))).await;
    assert_eq!(body["timer"]["breakMinutes"], 1);

    let (status, body) = send_json(&server.router, Method::POST, "/api/timer/start", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "running");
    assert_eq!(body["timer"]["running"], true);

    let (_, body) = send_json(&server.router, Method::GET, "/api/timer", None).await;
    assert_eq!(body["ticking"], true);
    assert_eq!(body["last_action"], "start");
    assert_eq!(body["caches"]["static_assets"], "pomodoro-static-v2");

    let (_, body) = send_json(&server.router, Method::POST, "/api/timer/pause", None).await;
    assert_eq!(body["status"], "paused");

    let (_, body) = send_json(&server.router, Method::POST, "/api/timer/reset", None).await;
    assert_eq!(body["timer"]["phase"], "work");
    assert_eq!(body["timer"]["progress"], 0.0);

    let raw = server.store.get(STORAGE_KEY).await.unwrap().unwrap();
    let saved = TimerSnapshot::from_json(&raw).unwrap();
    assert_eq!(saved.work_minutes, 60);
    assert_eq!(saved.break_minutes, 1);
    assert_eq!(saved.remaining_seconds, 3600);
}

#[tokio::test]
async fn malformed_minutes_body_is_rejected() {
    let server = test_server().await;

    let (status, _) = send_json(
        &server.router,
        Method::PUT,
        "/api/timer/work-minutes",
        Some(json!({"minutes": "ten"})),
    )
    .await;

    assert!(status.is_client_error());
}

#[tokio::test]
async fn host_signals_are_reported_in_status() {
    let server = test_server().await;

    let (_, body) =
        send_json(&server.router, Method::POST, "/api/host/connectivity", Some(json!({"online": false}))).await;
    assert_eq!(body["host"]["online"], false);

    send_json(&server.router, Method::POST, "/api/host/installable", None).await;

    let (_, body) = send_json(&server.router, Method::GET, "/api/timer", None).await;
    assert_eq!(body["host"]["online"], false);
    assert_eq!(body["host"]["installable"], true);
}

#[tokio::test]
async fn offline_navigation_gets_offline_page() {
    let server = test_server().await;
    server
        .cache
        .storage()
        .put(
            &server.cache.names().static_assets,
            "http://localhost:3000/offline.html",
            AssetResponse::new(200, Some("text/html"), "<h1>Offline</h1>"),
        )
        .await;

    let request = Request::builder()
        .uri("/timer/settings")
        .header("sec-fetch-mode", "navigate")
        .body(Body::empty())
        .unwrap();
    let (status, headers, body) = send(&server.router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[SERVED_FROM_HEADER], "offline-page");
    assert_eq!(headers[header::CONTENT_TYPE], "text/html");
    assert_eq!(body, b"<h1>Offline</h1>");

    let request = Request::builder()
        .uri("/data.json")
        .body(Body::empty())
        .unwrap();
    let (status, headers, body) = send(&server.router, request).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(headers[SERVED_FROM_HEADER], "offline");
    assert_eq!(body, b"Offline");
}

#[tokio::test]
async fn cached_assets_are_served_through_the_fallback() {
    let server = test_server().await;
    server
        .cache
        .storage()
        .put(
            &server.cache.names().dynamic,
            "http://localhost:3000/static/js/main.js",
            AssetResponse::new(200, Some("application/javascript"), "console.log(1)"),
        )
        .await;

    let request = Request::builder()
        .uri("/static/js/main.js")
        .body(Body::empty())
        .unwrap();
    let (status, headers, body) = send(&server.router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[SERVED_FROM_HEADER], "cache");
    assert_eq!(body, b"console.log(1)");
}

#[tokio::test]
async fn non_get_passes_through_to_unreachable_upstream() {
    let server = test_server().await;

    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/anything")
        .body(Body::empty())
        .unwrap();
    let (status, headers, _) = send(&server.router, request).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(headers.get(SERVED_FROM_HEADER).is_none());
}

#[tokio::test]
async fn service_worker_events() {
    let server = test_server().await;

    let (_, body) = send_json(&server.router, Method::POST, "/sw/sync/pomodoro-sync", None).await;
    assert_eq!(body["handled"], true);

    let (_, body) = send_json(&server.router, Method::POST, "/sw/periodic-sync/unknown", None).await;
    assert_eq!(body["handled"], false);

    let (_, body) =
        send_json(&server.router, Method::POST, "/sw/push", Some(json!({"title": "Focus"}))).await;
    assert_eq!(body["notification"]["title"], "Focus");
    assert_eq!(body["notification"]["body"], "Time to take a break!");

    let (_, body) = send_json(
        &server.router,
        Method::POST,
        "/sw/notification-click",
        Some(json!({"action": "close"})),
    )
    .await;
    assert_eq!(body["outcome"], "dismissed");
}

#[tokio::test]
async fn health_check() {
    let server = test_server().await;
    let (status, body) = send_json(&server.router, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn absolute_form_targets_stay_on_the_app_origin() {
    let network = Arc::new(RecordingNetwork::default());
    let server = test_server_with(network.clone()).await;

    let request = Request::builder()
        .uri("http://169.254.169.254/latest/meta-data/")
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(&server.router, request).await;
    assert_eq!(status, StatusCode::OK);

    let request = Request::builder()
        .method(Method::DELETE)
        .uri("http://internal.admin/users/1")
        .body(Body::empty())
        .unwrap();
    send(&server.router, request).await;

    assert_eq!(
        network.seen(),
        vec![
            "GET http://localhost:3000/latest/meta-data/".to_string(),
            "DELETE http://localhost:3000/users/1".to_string(),
        ]
    );
}

#[tokio::test]
async fn scheme_relative_paths_are_rejected() {
    let network = Arc::new(RecordingNetwork::default());
    let server = test_server_with(network.clone()).await;

    let request = Request::builder()
        .uri("//evil.example/steal")
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(&server.router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(network.seen().is_empty());
}
