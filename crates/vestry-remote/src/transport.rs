//! Transport abstraction for remote calls.
//!
//! A transport sends one JSON request and hands back the raw status and body.
//! Interpreting the status (success, server error) is the accessor's job.

use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

use crate::error::{RemoteError, Result};

/// HTTP verbs used by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub const fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteRequest {
    pub method: Method,
    /// Endpoint path relative to the base URL, e.g. `/members/42`.
    pub path: String,
    pub body: Option<Value>,
}

/// Raw response.
#[derive(Debug, Clone)]
pub struct RemoteResponse {
    pub status: u16,
    pub body: Bytes,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl RemoteResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON. An empty body decodes as `null`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        let raw: &[u8] = if self.body.iter().all(u8::is_ascii_whitespace) {
            b"null"
        } else {
            &self.body
        };
        serde_json::from_slice(raw).map_err(|e| RemoteError::Decode(e.to_string()))
    }

    /// The server's `{"error": ...}` message, or a generic one.
    pub fn error_message(&self) -> String {
        serde_json::from_slice::<ErrorBody>(&self.body)
            .map(|b| b.error)
            .unwrap_or_else(|_| format!("request failed with status {}", self.status))
    }
}

/// Transport trait for sending requests to the remote API.
///
/// Implementations must be thread-safe (Send + Sync) and must not retry.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a single request.
    ///
    /// Returns `Err` only when no response was obtained (connection failure,
    /// timeout). Any HTTP status, including errors, is an `Ok` response.
    async fn send(&self, request: RemoteRequest) -> Result<RemoteResponse>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn send(&self, request: RemoteRequest) -> Result<RemoteResponse> {
        (**self).send(request).await
    }
}

/// A scripted in-memory transport for testing.
///
/// Responses are queued up front and consumed in order. Once the queue is
/// empty every request fails as if the server were unreachable. All
/// requests are recorded.
pub mod memory {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Mutex, MutexGuard};

    /// What the transport does for one request.
    #[derive(Debug, Clone)]
    pub enum Scripted {
        /// Respond with this status and JSON body.
        Respond { status: u16, body: Value },
        /// Fail at the connection level.
        Fail(String),
        /// Never respond.
        Hang,
    }

    #[derive(Debug, Default)]
    pub struct ScriptedTransport {
        script: Mutex<VecDeque<Scripted>>,
        requests: Mutex<Vec<RemoteRequest>>,
    }

    impl ScriptedTransport {
        /// A transport with an empty script: every request fails.
        pub fn new() -> Self {
            Self::default()
        }

        /// Alias for [`ScriptedTransport::new`] that reads better in tests.
        pub fn offline() -> Self {
            Self::default()
        }

        /// Queue a JSON response.
        pub fn respond(&self, status: u16, body: Value) -> &Self {
            lock(&self.script).push_back(Scripted::Respond { status, body });
            self
        }

        /// Queue a connection failure.
        pub fn fail(&self, reason: &str) -> &Self {
            lock(&self.script).push_back(Scripted::Fail(reason.to_string()));
            self
        }

        /// Queue a request that never completes.
        pub fn hang(&self) -> &Self {
            lock(&self.script).push_back(Scripted::Hang);
            self
        }

        /// Requests received so far.
        pub fn requests(&self) -> Vec<RemoteRequest> {
            lock(&self.requests).clone()
        }

        pub fn call_count(&self) -> usize {
            lock(&self.requests).len()
        }

        /// Scripted steps not consumed yet.
        pub fn remaining(&self) -> usize {
            lock(&self.script).len()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: RemoteRequest) -> Result<RemoteResponse> {
            lock(&self.requests).push(request);
            let step = lock(&self.script).pop_front();

            match step {
                Some(Scripted::Respond { status, body }) => Ok(RemoteResponse {
                    status,
                    body: Bytes::from(serde_json::to_vec(&body).unwrap_or_default()),
                }),
                Some(Scripted::Fail(reason)) => Err(RemoteError::Network(reason)),
                Some(Scripted::Hang) => {
                    std::future::pending::<()>().await;
                    Err(RemoteError::Timeout("hung request completed".into()))
                }
                None => Err(RemoteError::Network("connection refused".into())),
            }
        }
    }

    fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
