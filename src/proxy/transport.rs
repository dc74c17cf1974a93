//! Upstream transport.
//!
//! The cache layer only ever sees fully materialized responses; redirects,
//! timeouts and connection handling stay with the transport.

use std::time::Duration;

use async_trait::async_trait;
use axum::http::{header::CONTENT_TYPE, HeaderMap, Method};
use bytes::Bytes;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::cache::MediaResponse;
use crate::error::FetchError;
use crate::proxy::headers::forwardable;

/// A request to forward upstream.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: Url,
    /// End-to-end headers sent with the request
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl UpstreamRequest {
    pub fn new(method: Method, url: Url, body: Bytes) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body,
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Body-less GET, the only request the cache itself issues.
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url, Bytes::new())
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` and reads the whole response body.
    async fn send(&self, request: UpstreamRequest) -> Result<MediaResponse, FetchError>;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    pub fn user_agent() -> &'static str {
        concat!("media-cache/", env!("CARGO_PKG_VERSION"))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: UpstreamRequest) -> Result<MediaResponse, FetchError> {
        let requested = request.url.to_string();
        debug!(method = %request.method, url = %requested, "sending upstream request");

        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if !request.body.is_empty() {
            builder = builder.body(request.body);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| FetchError::request(&requested, err))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let mut headers = forwardable(response.headers());
        headers.remove(CONTENT_TYPE);

        let body = response
            .bytes()
            .await
            .map_err(|err| FetchError::request(&requested, err))?;

        Ok(MediaResponse::new(final_url, status, content_type, body).with_headers(headers))
    }
}
