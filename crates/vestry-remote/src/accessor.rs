//! The remote-first dispatcher.
//!
//! One call, one remote attempt. If the attempt fails (transport error,
//! timeout, non-2xx status) and a fallback was supplied, the fallback runs
//! and its value is returned tagged [`Origin::Local`]. Without a fallback
//! the failure propagates. Nothing is ever retried.
//!
//! Once the server answers 2xx the fallback never runs. A success body that
//! does not decode is [`RemoteError::Decode`], since the remote side has
//! already applied the request.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use vestry_store::StoreError;

use crate::error::{RemoteError, Result};
use crate::transport::{Method, RemoteRequest, RemoteResponse, Transport};

/// Where a value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// The remote API answered.
    Remote,
    /// The remote attempt failed and the local fallback answered.
    Local {
        /// Why the remote attempt was abandoned.
        reason: String,
    },
}

/// A value together with its [`Origin`].
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub value: T,
    pub origin: Origin,
}

impl<T> Fetched<T> {
    pub fn remote(value: T) -> Self {
        Self {
            value,
            origin: Origin::Remote,
        }
    }

    pub fn local(value: T, reason: impl Into<String>) -> Self {
        Self {
            value,
            origin: Origin::Local {
                reason: reason.into(),
            },
        }
    }

    /// Whether the value came from the local fallback.
    pub fn is_degraded(&self) -> bool {
        matches!(self.origin, Origin::Local { .. })
    }

    pub fn into_inner(self) -> T {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        Fetched {
            value: f(self.value),
            origin: self.origin,
        }
    }
}

/// Dispatches calls to a [`Transport`], falling back to local execution.
pub struct RemoteFirstAccessor<T: Transport> {
    transport: T,
    timeout: Duration,
}

impl<T: Transport> RemoteFirstAccessor<T> {
    /// `timeout` bounds each remote attempt regardless of what the
    /// transport itself enforces.
    pub fn new(transport: T, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Make one remote attempt; on failure run `fallback` if there is one.
    pub async fn call<R, F>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
        fallback: Option<F>,
    ) -> Result<Fetched<R>>
    where
        R: DeserializeOwned,
        F: FnOnce() -> std::result::Result<R, StoreError>,
    {
        let request = RemoteRequest {
            method,
            path: endpoint.to_string(),
            body,
        };

        let error = match self.attempt(request).await {
            Ok(response) => {
                // A 2xx answer never falls back.
                let value = response.json().map_err(|e| {
                    tracing::warn!(%method, endpoint, error = %e, "undecodable success body");
                    e
                })?;
                return Ok(Fetched::remote(value));
            }
            Err(e) => e,
        };

        match fallback {
            Some(fallback) => {
                tracing::warn!(
                    %method,
                    endpoint,
                    error = %error,
                    "remote call failed, using local fallback"
                );
                let value = fallback()?;
                Ok(Fetched::local(value, error.to_string()))
            }
            None => {
                tracing::debug!(%method, endpoint, error = %error, "remote call failed");
                Err(error)
            }
        }
    }

    /// Remote call with a fallback.
    pub async fn with_fallback<R, F>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
        fallback: F,
    ) -> Result<Fetched<R>>
    where
        R: DeserializeOwned,
        F: FnOnce() -> std::result::Result<R, StoreError>,
    {
        self.call(method, endpoint, body, Some(fallback)).await
    }

    /// Remote call with no fallback; every failure propagates.
    pub async fn remote<R>(&self, method: Method, endpoint: &str, body: Option<Value>) -> Result<R>
    where
        R: DeserializeOwned,
    {
        self.call::<R, fn() -> std::result::Result<R, StoreError>>(method, endpoint, body, None)
            .await
            .map(Fetched::into_inner)
    }

    /// Send once; a non-2xx status is an error.
    async fn attempt(&self, request: RemoteRequest) -> Result<RemoteResponse> {
        let response = match tokio::time::timeout(self.timeout, self.transport.send(request)).await
        {
            Ok(response) => response?,
            Err(_) => {
                return Err(RemoteError::Timeout(format!(
                    "no response within {:?}",
                    self.timeout
                )))
            }
        };

        if !response.is_success() {
            return Err(RemoteError::Server {
                status: response.status,
                message: response.error_message(),
            });
        }

        Ok(response)
    }
}
