use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// Query parameters appended to a request URL, in order
pub type Query = Vec<(String, String)>;

/// Errors raised by an HTTP client implementation
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Invalid URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Unexpected status {status} {status_text}: {body}")]
    UnexpectedStatus {
        status: u16,
        status_text: String,
        body: String,
    },
}

/// Response envelope returned by every request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub status: u16,
    pub status_text: String,
    /// Parsed JSON body; `Null` for an empty body, a JSON string for non-JSON text
    pub data: Value,
    pub duration_ms: u64,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into an error
    pub fn error_for_status(self) -> Result<Self, HttpError> {
        if self.is_success() {
            return Ok(self);
        }
        let body = match &self.data {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };
        Err(HttpError::UnexpectedStatus {
            status: self.status,
            status_text: self.status_text,
            body,
        })
    }
}

/// HTTP client collaborator
///
/// Paths are relative to the client's base URL. Implementations return the
/// response for every status code; callers decide what counts as failure.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Base URL the relative paths are resolved against
    fn base_url(&self) -> &str;

    async fn get_request(&self, path: &str, query: &[(String, String)])
        -> Result<ApiResponse, HttpError>;

    async fn post_request(
        &self,
        path: &str,
        query: &[(String, String)],
        body: &Value,
    ) -> Result<ApiResponse, HttpError>;

    async fn put_request(
        &self,
        path: &str,
        query: &[(String, String)],
        body: &Value,
    ) -> Result<ApiResponse, HttpError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, data: Value) -> ApiResponse {
        ApiResponse {
            status,
            status_text: String::new(),
            data,
            duration_ms: 0,
        }
    }

    #[test]
    fn test_error_for_status_passes_success() {
        let resp = response(201, serde_json::json!({"id": 1}));
        assert!(resp.error_for_status().is_ok());
    }

    #[test]
    fn test_error_for_status_carries_body() {
        let resp = response(422, serde_json::json!({"message": "steps do not match"}));
        let err = resp.error_for_status().unwrap_err();
        match err {
            HttpError::UnexpectedStatus { status, body, .. } => {
                assert_eq!(status, 422);
                assert!(body.contains("steps do not match"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
