//! API Handlers
//!
//! HTTP request handlers for each proxy endpoint.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::error::{CacheError, Result};
use crate::models::{ClientMessage, HealthResponse, MediaQuery, WorkerMessage};
use crate::proxy::{forwardable, MediaCache, Served, UpstreamRequest};

/// Header reporting how the cache produced a response.
pub const X_CACHE: &str = "x-cache";

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The caching engine
    pub cache: MediaCache,
}

impl AppState {
    /// Creates a new AppState around the given engine.
    pub fn new(cache: MediaCache) -> Self {
        Self { cache }
    }
}

/// Handler for ANY /media?url=...
///
/// GET requests run through the cache pipeline; every other method is
/// forwarded upstream untouched. End-to-end headers travel both ways.
pub async fn media_handler(
    State(state): State<AppState>,
    method: Method,
    Query(query): Query<MediaQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let url = query.upstream_url().map_err(CacheError::InvalidRequest)?;
    let request = UpstreamRequest::new(method, url, body).with_headers(forwardable(&headers));
    let served = state.cache.handle(request).await?;

    into_http_response(served)
}

/// Handler for POST /messages
///
/// Answers `GET_CACHE_STATS` with a `CACHE_STATS` snapshot.
pub async fn messages_handler(
    State(state): State<AppState>,
    Json(message): Json<ClientMessage>,
) -> Json<WorkerMessage> {
    match message {
        ClientMessage::GetCacheStats => Json(WorkerMessage::CacheStats {
            stats: state.cache.stats().into(),
        }),
    }
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

fn into_http_response(served: Served) -> Result<Response> {
    let Served { response, status } = served;

    let code = StatusCode::from_u16(response.status).map_err(|err| {
        CacheError::Internal(format!("upstream returned invalid status: {}", err))
    })?;

    let mut http = (code, response.body).into_response();
    let headers = http.headers_mut();
    headers.extend(response.headers);
    match response
        .content_type
        .as_deref()
        .and_then(|value| HeaderValue::from_str(value).ok())
    {
        Some(content_type) => {
            headers.insert(header::CONTENT_TYPE, content_type);
        }
        None => {
            headers.remove(header::CONTENT_TYPE);
        }
    }
    headers.insert(X_CACHE, HeaderValue::from_static(status.as_str()));

    Ok(http)
}
