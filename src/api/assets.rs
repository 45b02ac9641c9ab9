//! Fallback handler routing every other request through the offline cache

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use reqwest::Url;
use tracing::{debug, warn};

use super::ServerContext;
use crate::cache::{AssetRequest, AssetResponse, Destination, FetchDisposition};

const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;
pub const SERVED_FROM_HEADER: &str = "x-served-from";

/// Handle any request not matched by the API routes
pub async fn asset_handler(State(ctx): State<ServerContext>, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    let url = match request_url(&ctx.cache_origin(), &parts) {
        Some(url) => url,
        None => return (StatusCode::BAD_REQUEST, "Invalid request URL").into_response(),
    };
    let body = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(body) => body,
        Err(e) => {
            warn!("Failed to read request body: {}", e);
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    let destination = if is_navigation(&parts.headers) {
        Destination::Document
    } else {
        Destination::Other
    };
    let asset_request = AssetRequest {
        method: parts.method.clone(),
        url,
        destination,
        content_type: parts
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    };

    if asset_request.is_navigation() && asset_request.method == reqwest::Method::GET {
        ctx.clients.register(&asset_request.url);
    }

    match ctx.cache.handle_fetch(&asset_request).await {
        FetchDisposition::Respond(served) => {
            into_response(served.response, Some(served.source.as_str()))
        }
        FetchDisposition::PassThrough => match ctx.cache.pass_through(&asset_request).await {
            Ok(response) => into_response(response, None),
            Err(e) => {
                warn!("Pass-through {} {} failed: {}", asset_request.method, asset_request.url, e);
                (StatusCode::BAD_GATEWAY, "Upstream unavailable").into_response()
            }
        },
    }
}

/// Resolve the request target against the app origin. Absolute-form targets
/// keep only their path and query, so foreign hosts are never reached.
fn request_url(origin: &Url, parts: &Parts) -> Option<Url> {
    let path_and_query = parts.uri.path_and_query().map_or("/", |pq| pq.as_str());
    if !path_and_query.starts_with('/') {
        return None;
    }
    let url = origin.join(path_and_query).ok()?;
    (url.origin() == origin.origin()).then_some(url)
}

fn is_navigation(headers: &HeaderMap) -> bool {
    let header_is = |name: &str, expected: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case(expected))
    };
    if header_is("sec-fetch-mode", "navigate") || header_is("sec-fetch-dest", "document") {
        return true;
    }
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}

fn into_response(asset: AssetResponse, source: Option<&'static str>) -> Response {
    let status = StatusCode::from_u16(asset.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut response = Response::new(Body::from(asset.body));
    *response.status_mut() = status;

    if let Some(content_type) = asset
        .content_type
        .as_deref()
        .and_then(|v| HeaderValue::from_str(v).ok())
    {
        response.headers_mut().insert(header::CONTENT_TYPE, content_type);
    }
    if let Some(source) = source {
        debug!("Serving from {}", source);
        response
            .headers_mut()
            .insert(SERVED_FROM_HEADER, HeaderValue::from_static(source));
    }
    response
}
