//! Upstream network access

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, Url};
use tracing::debug;

use super::types::{AssetRequest, AssetResponse};
use crate::error::NetworkError;

/// Performs a request against the real network
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse, NetworkError>;
}

/// reqwest-backed network. Same-origin requests are served by `upstream`;
/// cross-origin requests go to their own host.
#[derive(Debug, Clone)]
pub struct HttpNetwork {
    client: Client,
    origin: Url,
    upstream: Url,
}

impl HttpNetwork {
    pub fn new(origin: Url, mut upstream: Url, timeout: Duration) -> Result<Self, NetworkError> {
        let client = Client::builder().timeout(timeout).build()?;
        // Treat the upstream path as a directory so relative joins keep it.
        if !upstream.path().ends_with('/') {
            let path = format!("{}/", upstream.path());
            upstream.set_path(&path);
        }
        Ok(Self {
            client,
            origin,
            upstream,
        })
    }

    fn target_url(&self, url: &Url) -> Result<Url, NetworkError> {
        if url.origin() != self.origin.origin() {
            return Ok(url.clone());
        }
        let path = url.path().trim_start_matches('/');
        // `./` keeps a path like `http:x` from parsing as a new scheme.
        let path_and_query = match url.query() {
            Some(query) => format!("./{}?{}", path, query),
            None => format!("./{}", path),
        };
        let target = self
            .upstream
            .join(&path_and_query)
            .map_err(|e| NetworkError::Unreachable(format!("{}: {}", url, e)))?;
        if target.origin() != self.upstream.origin() {
            return Err(NetworkError::CrossOrigin(url.to_string()));
        }
        Ok(target)
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse, NetworkError> {
        let target = self.target_url(&request.url)?;
        debug!("{} {} -> {}", request.method, request.url, target);

        let mut builder = self.client.request(request.method.clone(), target);
        if let Some(content_type) = &request.content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?;

        Ok(AssetResponse {
            status,
            content_type,
            body,
        })
    }
}
