//! reqwest-backed HTTP client
//!
//! Resolves relative paths against a fixed base URL, attaches the bearer
//! token when one is configured and decodes every body as JSON when possible.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use std::time::{Duration, Instant};

use super::traits::{ApiResponse, HttpClient, HttpError};

/// Default per-request timeout
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

pub struct ApiHelper {
    /// Base URL without trailing slash (e.g. "https://api.tvmaze.com")
    base_url: String,
    /// Bearer token sent as `Authorization` header
    token: Option<String>,
    client: reqwest::Client,
}

impl ApiHelper {
    /// Create a client for `base_url` with the given request timeout
    pub fn new(base_url: &str, token: Option<String>, timeout_ms: u64) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
            client,
        })
    }

    /// Join a relative path onto the base URL
    pub fn url_for(&self, path: &str) -> Result<reqwest::Url, HttpError> {
        let raw = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        reqwest::Url::parse(&raw).map_err(|e| HttpError::InvalidUrl {
            url: raw,
            reason: e.to_string(),
        })
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<ApiResponse, HttpError> {
        let url = self.url_for(path)?;
        log::debug!("{} {} query={:?}", method, url, query);

        let mut req = self.client.request(method, url);
        if !query.is_empty() {
            req = req.query(query);
        }
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let started = Instant::now();
        let response = req.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let duration_ms = started.elapsed().as_millis() as u64;

        let data = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        log::debug!("-> {} in {}ms", status, duration_ms);

        Ok(ApiResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            data,
            duration_ms,
        })
    }
}

#[async_trait]
impl HttpClient for ApiHelper {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_request(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<ApiResponse, HttpError> {
        self.send(Method::GET, path, query, None).await
    }

    async fn post_request(
        &self,
        path: &str,
        query: &[(String, String)],
        body: &Value,
    ) -> Result<ApiResponse, HttpError> {
        self.send(Method::POST, path, query, Some(body)).await
    }

    async fn put_request(
        &self,
        path: &str,
        query: &[(String, String)],
        body: &Value,
    ) -> Result<ApiResponse, HttpError> {
        self.send(Method::PUT, path, query, Some(body)).await
    }
}
