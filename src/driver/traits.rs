use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// HTTP methods a test case may use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    /// Whether a JSON body is sent with this method
    pub fn carries_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A fully resolved request, ready to be sent
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

/// Raw response as seen by the runner
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub text: String,
}

/// Transport-level failures. These never abort a run; the executor turns
/// them into failed test results.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("{0}")]
    Transport(String),
}

/// Sends requests on behalf of the test executor
#[async_trait]
pub trait ApiDriver: Send + Sync {
    /// Send the request and return the status and body text
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, RequestError>;
}
