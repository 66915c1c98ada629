//! reqwest-backed driver for the chat REST API.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

use super::traits::{ApiDriver, ApiRequest, ApiResponse, RequestError};

/// HTTP client with a fixed per-request timeout
pub struct HttpDriver {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpDriver {
    /// Create a driver whose requests time out after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, timeout })
    }

    fn classify(&self, err: reqwest::Error) -> RequestError {
        if err.is_timeout() {
            RequestError::Timeout(self.timeout)
        } else if err.is_connect() {
            RequestError::Connect(err.to_string())
        } else {
            RequestError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl ApiDriver for HttpDriver {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, RequestError> {
        let mut req = self
            .client
            .request(request.method.into(), &request.url)
            .headers(request.headers);

        if request.method.carries_body() {
            if let Some(body) = &request.body {
                req = req.json(body);
            }
        }

        let res = req.send().await.map_err(|e| self.classify(e))?;
        let status = res.status().as_u16();
        let text = res.text().await.map_err(|e| self.classify(e))?;

        log::debug!("{} {} -> {}", request.method, request.url, status);

        Ok(ApiResponse { status, text })
    }
}
