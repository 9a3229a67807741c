//! HTTP transport backed by reqwest.

use async_trait::async_trait;

use crate::config::RemoteConfig;
use crate::error::{RemoteError, Result};
use crate::transport::{Method, RemoteRequest, RemoteResponse, Transport};

/// Sends requests to `base_url` with JSON bodies.
///
/// The underlying client carries the configured timeout, so a stalled
/// server surfaces as [`RemoteError::Timeout`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RemoteError::InvalidRequest(format!("failed to build client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: RemoteRequest) -> Result<RemoteResponse> {
        let url = self.url(&request.path);
        let mut builder = self.client.request(to_reqwest(request.method), &url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        tracing::debug!(method = %request.method, %url, "sending request");

        let response = builder.send().await.map_err(map_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_error)?;

        tracing::debug!(method = %request.method, %url, status, "received response");
        Ok(RemoteResponse { status, body })
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn map_error(e: reqwest::Error) -> RemoteError {
    if e.is_timeout() {
        RemoteError::Timeout(e.to_string())
    } else if e.is_builder() {
        RemoteError::InvalidRequest(e.to_string())
    } else {
        RemoteError::Network(e.to_string())
    }
}
