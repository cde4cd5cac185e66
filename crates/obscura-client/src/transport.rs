//! HTTP transport to the relay.
//!
//! Thin reqwest wrapper speaking the shared wire types. Transient
//! failures - connection errors, 5xx, and 429 - are retried with
//! exponential backoff; any other 4xx is terminal and surfaced as
//! [`ClientError::Rejected`].

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use obscura_protocol::wire::{
    ErrorResponse, MessagesResponse, SendRequest, SendResponse, StatusResponse, TokenRequest,
};
use obscura_protocol::{Envelope, RoutingToken};

use crate::error::{ClientError, Result};

/// Maximum attempts per logical request (1 initial + 4 retries).
const MAX_ATTEMPTS: u32 = 5;

/// First backoff delay; doubles per retry.
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// Backoff ceiling.
const MAX_BACKOFF: Duration = Duration::from_secs(8);

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for one relay server.
#[derive(Debug, Clone)]
pub struct RelayTransport {
    http: reqwest::Client,
    base_url: String,
}

impl RelayTransport {
    /// Create a transport for the relay at `base_url`
    /// (e.g. `http://localhost:8000`).
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");

        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Post a sealed envelope.
    pub async fn send(&self, envelope: &Envelope) -> Result<SendResponse> {
        self.post("/api/v1/send", &SendRequest::from(envelope)).await
    }

    /// Fetch messages for a token without removing them.
    pub async fn poll(
        &self,
        token: &RoutingToken,
        since: Option<u64>,
    ) -> Result<MessagesResponse> {
        let request = TokenRequest {
            token: token.to_hex(),
            since,
        };
        self.post("/api/v1/poll", &request).await
    }

    /// Fetch and atomically remove messages for a token.
    pub async fn consume(&self, token: &RoutingToken) -> Result<MessagesResponse> {
        let request = TokenRequest {
            token: token.to_hex(),
            since: None,
        };
        self.post("/api/v1/consume", &request).await
    }

    /// Relay counters.
    pub async fn status(&self) -> Result<StatusResponse> {
        let url = format!("{}/api/v1/status", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::Unreachable {
                attempts: 1,
                last_error: e.to_string(),
            })?;
        Ok(response.json().await.map_err(|e| ClientError::Unreachable {
            attempts: 1,
            last_error: e.to_string(),
        })?)
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut backoff = INITIAL_BACKOFF;
        let mut last_error = String::new();

        for attempt in 1..=MAX_ATTEMPTS {
            match self.http.post(&url).json(body).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return Ok(response.json().await.map_err(|e| {
                            ClientError::Unreachable {
                                attempts: attempt,
                                last_error: e.to_string(),
                            }
                        })?);
                    }

                    let message = response
                        .json::<ErrorResponse>()
                        .await
                        .map(|e| e.error)
                        .unwrap_or_else(|_| status.to_string());

                    // 5xx and 429 are transient; everything else 4xx is
                    // a terminal contract violation.
                    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                        last_error = format!("{status}: {message}");
                        warn!(path, attempt, %status, "relay busy, backing off");
                    } else {
                        return Err(ClientError::Rejected {
                            status: status.as_u16(),
                            message,
                        });
                    }
                }
                Err(e) => {
                    last_error = e.to_string();
                    debug!(path, attempt, error = %last_error, "request failed");
                }
            }

            if attempt < MAX_ATTEMPTS {
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
        }

        Err(ClientError::Unreachable {
            attempts: MAX_ATTEMPTS,
            last_error,
        })
    }
}
