//! Request and response types seen by the cache manager

use bytes::Bytes;
use reqwest::{Method, Url};
use serde::Serialize;

/// What kind of resource the request is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// A page navigation
    Document,
    Other,
}

#[derive(Debug, Clone)]
pub struct AssetRequest {
    pub method: Method,
    pub url: Url,
    pub destination: Destination,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl AssetRequest {
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            destination: Destination::Other,
            content_type: None,
            body: Bytes::new(),
        }
    }

    pub fn navigation(url: Url) -> Self {
        Self {
            destination: Destination::Document,
            ..Self::get(url)
        }
    }

    pub fn is_navigation(&self) -> bool {
        self.destination == Destination::Document
    }

    /// Cache key: the URL without its fragment
    pub fn cache_key(&self) -> String {
        cache_key(&self.url)
    }
}

pub fn cache_key(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl AssetResponse {
    pub fn new(status: u16, content_type: Option<&str>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type: content_type.map(str::to_string),
            body: body.into(),
        }
    }

    /// Synthetic response returned when neither cache nor network can answer
    pub fn offline() -> Self {
        Self::new(503, Some("text/plain; charset=utf-8"), "Offline")
    }

    /// 2xx status
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Where a served response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseSource {
    Cache,
    Network,
    OfflinePage,
    Offline,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Cache => "cache",
            ResponseSource::Network => "network",
            ResponseSource::OfflinePage => "offline-page",
            ResponseSource::Offline => "offline",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    pub response: AssetResponse,
    pub source: ResponseSource,
}

impl Served {
    pub fn new(response: AssetResponse, source: ResponseSource) -> Self {
        Self { response, source }
    }

    pub fn offline() -> Self {
        Self::new(AssetResponse::offline(), ResponseSource::Offline)
    }
}

/// Outcome of fetch interception
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchDisposition {
    /// Not handled; forward to the network untouched
    PassThrough,
    Respond(Served),
}
