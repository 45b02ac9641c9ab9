//! Pomodoro Shell - timer host with an offline-first asset cache
//!
//! This is the main entry point for the pomodoro-shell application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use pomodoro_shell::{
    api::{create_router, ServerContext},
    cache::{CacheSettings, CacheStorage, ClientRegistry, HttpNetwork, OfflineCacheManager},
    config::Config,
    notify::{LogNotifier, Notifier},
    state::AppState,
    storage::{FileStore, KeyValueStore, MemoryStore},
    tasks::phase_notifier_task,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("pomodoro_shell={},tower_http=info", config.log_level()))
        .init();

    info!("Starting pomodoro-shell v{}", env!("CARGO_PKG_VERSION"));
    let origin = config.origin()?;
    info!(
        "Configuration: address={}, origin={}, upstream={}, data_dir={}, cache={}",
        config.address(),
        origin,
        config.upstream,
        config.data_dir.display(),
        config.cache_version
    );

    // Timer state keeps counting without durable storage
    let store: Arc<dyn KeyValueStore> = match FileStore::open(&config.data_dir).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!("Data directory unavailable ({}), timer progress will not survive restarts", e);
            Arc::new(MemoryStore::new())
        }
    };
    let state = AppState::restore(store).await;

    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier::new(config.notifications));
    tokio::spawn(phase_notifier_task(state.subscribe_phases(), Arc::clone(&notifier)));

    // Offline cache in front of the upstream static server
    let clients = Arc::new(ClientRegistry::new());
    let network = Arc::new(HttpNetwork::new(
        origin.clone(),
        config.upstream.clone(),
        config.network_timeout(),
    )?);
    let cache = Arc::new(OfflineCacheManager::new(
        CacheSettings::new(origin).with_version(config.cache_version.clone()),
        Arc::new(CacheStorage::new()),
        network,
        clients.clone(),
        notifier,
    )?);

    let lifecycle_cache = Arc::clone(&cache);
    tokio::spawn(async move {
        match lifecycle_cache.install().await {
            Ok(_) => {
                lifecycle_cache.activate().await;
            }
            Err(e) => error!("Offline cache not activated: {}", e),
        }
    });

    let app = create_router(ServerContext::new(Arc::clone(&state), cache, clients));

    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /api/timer                - Timer status");
    info!("  POST /api/timer/start          - Start countdown");
    info!("  POST /api/timer/pause          - Pause countdown");
    info!("  POST /api/timer/reset          - Reset to a fresh work phase");
    info!("  PUT  /api/timer/work-minutes   - Set work duration");
    info!("  PUT  /api/timer/break-minutes  - Set break duration");
    info!("  GET  /health                   - Health check");
    info!("  *    /*                        - Offline-first assets");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    state.shutdown().await;
    info!("Server shutdown complete");
    Ok(())
}
