//! Offline cache lifecycle (install, activate) and fetch interception

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use futures::future::{join_all, try_join_all};
use reqwest::{Method, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::{
    clients::Clients,
    network::Network,
    storage::CacheStorage,
    types::{cache_key, AssetRequest, AssetResponse, FetchDisposition, ResponseSource, Served},
};
use crate::{
    error::{CacheError, NetworkError},
    notify::Notifier,
};

pub const DEFAULT_CACHE_VERSION: &str = "v2";
pub const ASSET_MANIFEST_PATH: &str = "/asset-manifest.json";
pub const OFFLINE_PAGE_PATH: &str = "/offline.html";
pub const STATIC_PATH_PREFIX: &str = "/static/";

/// App shell assets cached at install time
pub const STATIC_ASSETS: &[&str] = &[
    "/",
    "/index.html",
    "/manifest.json",
    "/favicon.ico",
    "/logo192.png",
    "/logo512.png",
    "/browserconfig.xml",
    OFFLINE_PAGE_PATH,
    "https://cdn.tailwindcss.com",
];

/// The three partition names owned by one cache version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheNames {
    pub app: String,
    pub static_assets: String,
    pub dynamic: String,
}

impl CacheNames {
    pub fn for_version(version: &str) -> Self {
        Self {
            app: format!("pomodoro-timer-{version}"),
            static_assets: format!("pomodoro-static-{version}"),
            dynamic: format!("pomodoro-dynamic-{version}"),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        name == self.app || name == self.static_assets || name == self.dynamic
    }
}

/// How a request is answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// `/static/` assets; network copies go to the dynamic partition
    CacheFirst,
    /// Other same-origin requests; network copies go to the static partition
    CacheFirstWithFallback,
    /// Cross-origin requests
    NetworkFirst,
}

/// Build asset manifest (`/asset-manifest.json`)
#[derive(Debug, Deserialize)]
pub struct AssetManifest {
    pub files: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallReport {
    pub static_cached: usize,
    pub dynamic_cached: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationReport {
    pub deleted: Vec<String>,
    pub claimed: usize,
}

/// Cache manager settings
#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub origin: Url,
    pub version: String,
    pub static_assets: Vec<String>,
    pub manifest_path: String,
    pub offline_page: String,
}

impl CacheSettings {
    pub fn new(origin: Url) -> Self {
        Self {
            origin,
            version: DEFAULT_CACHE_VERSION.to_string(),
            static_assets: STATIC_ASSETS.iter().map(|s| s.to_string()).collect(),
            manifest_path: ASSET_MANIFEST_PATH.to_string(),
            offline_page: OFFLINE_PAGE_PATH.to_string(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_static_assets(mut self, assets: Vec<String>) -> Self {
        self.static_assets = assets;
        self
    }
}

pub struct OfflineCacheManager {
    pub(crate) names: CacheNames,
    pub(crate) origin: Url,
    static_assets: Vec<Url>,
    manifest_url: Url,
    offline_url: Url,
    storage: Arc<CacheStorage>,
    network: Arc<dyn Network>,
    pub(crate) clients: Arc<dyn Clients>,
    pub(crate) notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for OfflineCacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfflineCacheManager")
            .field("names", &self.names)
            .field("origin", &self.origin.as_str())
            .finish_non_exhaustive()
    }
}

impl OfflineCacheManager {
    pub fn new(
        settings: CacheSettings,
        storage: Arc<CacheStorage>,
        network: Arc<dyn Network>,
        clients: Arc<dyn Clients>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, CacheError> {
        let origin = settings.origin;
        let resolve = |path: &str| {
            origin
                .join(path)
                .map_err(|e| CacheError::InvalidUrl(format!("{path}: {e}")))
        };

        let static_assets = settings
            .static_assets
            .iter()
            .map(|path| resolve(path))
            .collect::<Result<Vec<_>, _>>()?;
        let manifest_url = resolve(&settings.manifest_path)?;
        let offline_url = resolve(&settings.offline_page)?;

        Ok(Self {
            names: CacheNames::for_version(&settings.version),
            origin,
            static_assets,
            manifest_url,
            offline_url,
            storage,
            network,
            clients,
            notifier,
        })
    }

    pub fn names(&self) -> &CacheNames {
        &self.names
    }

    pub fn storage(&self) -> &Arc<CacheStorage> {
        &self.storage
    }

    /// Populate the static and dynamic partitions concurrently. Only a static
    /// failure fails the install.
    pub async fn install(&self) -> Result<InstallReport, CacheError> {
        info!("Installing offline cache {}", self.names.static_assets);

        let (static_result, dynamic_cached) =
            tokio::join!(self.precache_static(), self.precache_dynamic());

        let static_cached = static_result.inspect_err(|e| {
            error!("Offline cache installation failed: {}", e);
        })?;

        info!(
            "Offline cache installed: {} static, {} dynamic assets",
            static_cached, dynamic_cached
        );
        Ok(InstallReport {
            static_cached,
            dynamic_cached,
        })
    }

    async fn precache_static(&self) -> Result<usize, CacheError> {
        self.storage.open(&self.names.static_assets).await;
        self.add_all(&self.names.static_assets, &self.static_assets).await
    }

    async fn precache_dynamic(&self) -> usize {
        match self.try_precache_dynamic().await {
            Ok(count) => count,
            Err(e) => {
                warn!("Failed to cache dynamic assets: {}", e);
                0
            }
        }
    }

    async fn try_precache_dynamic(&self) -> Result<usize, CacheError> {
        let manifest_url = self.manifest_url.to_string();
        let response = self
            .network
            .fetch(&AssetRequest::get(self.manifest_url.clone()))
            .await
            .map_err(|source| CacheError::Fetch {
                url: manifest_url.clone(),
                source,
            })?;
        if !response.ok() {
            return Err(CacheError::BadResponse {
                url: manifest_url,
                status: response.status,
            });
        }

        let manifest: AssetManifest = serde_json::from_slice(&response.body)?;
        let urls = manifest
            .files
            .values()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(|path| {
                self.origin
                    .join(path)
                    .map_err(|e| CacheError::InvalidUrl(format!("{path}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.storage.open(&self.names.dynamic).await;
        let count = self.add_all(&self.names.dynamic, &urls).await?;
        debug!("Dynamic assets cached: {:?}", manifest.files.values().collect::<Vec<_>>());
        Ok(count)
    }

    /// Fetch every URL and store all of them, or store nothing
    async fn add_all(&self, partition: &str, urls: &[Url]) -> Result<usize, CacheError> {
        let fetches = urls.iter().map(|url| async move {
            let request = AssetRequest::get(url.clone());
            let response =
                self.network
                    .fetch(&request)
                    .await
                    .map_err(|source| CacheError::Fetch {
                        url: url.to_string(),
                        source,
                    })?;
            if !response.ok() {
                return Err(CacheError::BadResponse {
                    url: url.to_string(),
                    status: response.status,
                });
            }
            Ok((request.cache_key(), response))
        });

        let entries = try_join_all(fetches).await?;
        let count = entries.len();
        self.storage.put_all(partition, entries).await;
        Ok(count)
    }

    /// Delete partitions from other versions and claim open clients
    pub async fn activate(&self) -> ActivationReport {
        info!("Activating offline cache {}", self.names.static_assets);

        let (deleted, claimed) = tokio::join!(self.delete_stale_partitions(), self.clients.claim());

        info!(
            "Offline cache active: {} stale partitions deleted, {} clients claimed",
            deleted.len(),
            claimed
        );
        ActivationReport { deleted, claimed }
    }

    async fn delete_stale_partitions(&self) -> Vec<String> {
        let stale: Vec<String> = self
            .storage
            .keys()
            .await
            .into_iter()
            .filter(|name| !self.names.contains(name))
            .collect();

        let deletions = stale.iter().map(|name| async move {
            info!("Clearing old cache {}", name);
            self.storage.delete(name).await
        });
        join_all(deletions).await;
        stale
    }

    pub fn strategy_for(&self, url: &Url) -> Strategy {
        if url.path().starts_with(STATIC_PATH_PREFIX) {
            Strategy::CacheFirst
        } else if url.origin() == self.origin.origin() {
            Strategy::CacheFirstWithFallback
        } else {
            Strategy::NetworkFirst
        }
    }

    /// Intercept a request. Non-GET requests are not handled.
    pub async fn handle_fetch(&self, request: &AssetRequest) -> FetchDisposition {
        if request.method != Method::GET {
            return FetchDisposition::PassThrough;
        }

        let served = match self.strategy_for(&request.url) {
            Strategy::CacheFirst => self.cache_first(request).await,
            Strategy::CacheFirstWithFallback => self.cache_first_with_fallback(request).await,
            Strategy::NetworkFirst => self.network_first(request).await,
        };
        debug!(
            "{} {} served from {} ({})",
            request.method,
            request.url,
            served.source.as_str(),
            served.response.status
        );
        FetchDisposition::Respond(served)
    }

    /// Forward a request the cache does not handle. Only same-origin requests
    /// are forwarded.
    pub async fn pass_through(&self, request: &AssetRequest) -> Result<AssetResponse, NetworkError> {
        if request.url.origin() != self.origin.origin() {
            warn!("Not forwarding {} {}", request.method, request.url);
            return Err(NetworkError::CrossOrigin(request.url.to_string()));
        }
        self.network.fetch(request).await
    }

    async fn cache_first(&self, request: &AssetRequest) -> Served {
        let key = request.cache_key();
        if let Some(cached) = self.storage.match_any(&key).await {
            return Served::new(cached, ResponseSource::Cache);
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                if response.ok() {
                    self.storage
                        .put(&self.names.dynamic, &key, response.clone())
                        .await;
                }
                Served::new(response, ResponseSource::Network)
            }
            Err(e) => {
                warn!("Cache first failed for {}: {}", key, e);
                self.offline_page().await
            }
        }
    }

    async fn cache_first_with_fallback(&self, request: &AssetRequest) -> Served {
        let key = request.cache_key();
        if let Some(cached) = self.storage.match_any(&key).await {
            return Served::new(cached, ResponseSource::Cache);
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                if response.ok() {
                    self.storage
                        .put(&self.names.static_assets, &key, response.clone())
                        .await;
                }
                Served::new(response, ResponseSource::Network)
            }
            Err(e) => {
                warn!("Cache first with fallback failed for {}: {}", key, e);
                if request.is_navigation() {
                    return self.offline_page().await;
                }
                match self.storage.match_any(&key).await {
                    Some(cached) => Served::new(cached, ResponseSource::Cache),
                    None => Served::offline(),
                }
            }
        }
    }

    async fn network_first(&self, request: &AssetRequest) -> Served {
        let key = request.cache_key();
        match self.network.fetch(request).await {
            Ok(response) => {
                if response.ok() {
                    self.storage
                        .put(&self.names.static_assets, &key, response.clone())
                        .await;
                }
                Served::new(response, ResponseSource::Network)
            }
            Err(e) => {
                debug!("Network first failed for {}, trying cache: {}", key, e);
                match self.storage.match_any(&key).await {
                    Some(cached) => Served::new(cached, ResponseSource::Cache),
                    None => Served::offline(),
                }
            }
        }
    }

    async fn offline_page(&self) -> Served {
        match self.storage.match_any(&cache_key(&self.offline_url)).await {
            Some(page) => Served::new(page, ResponseSource::OfflinePage),
            None => {
                warn!("Offline page is not cached");
                Served::offline()
            }
        }
    }
}
