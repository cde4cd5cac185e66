//! HTTP surface of the relay.
//!
//! Every endpoint speaks JSON. Requests are validated into typed protocol
//! values before the store is touched; handlers never see raw field
//! strings. Errors map to a stable `{error, field}` shape.
//!
//! ## Privacy invariants
//!
//! - Log lines carry only the endpoint, a token *prefix* (8 hex chars),
//!   and the status. Ciphertext, nonces, sender keys, and full tokens are
//!   never logged.
//! - Polling an unknown token answers exactly like polling an empty one.
//!   The relay never reveals which tokens are live.
//! - The status endpoint exposes counts only.

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use tower_http::timeout::TimeoutLayer;
use tracing::{info, warn};

use obscura_protocol::wire::{
    ErrorResponse, HealthResponse, MessagesResponse, SendRequest, SendResponse, ServerInfo,
    StatusResponse, TokenRequest,
};
use obscura_protocol::ProtocolError;

use crate::error::RelayError;
use crate::rate_limit::{NoLimit, RateLimit};
use crate::store::{MessageStore, StoreConfig};

/// Default server-side request deadline.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared server state injected into every handler.
///
/// The store is the single shared mutable resource; everything else here
/// is immutable after startup.
pub struct RelayState {
    store: Mutex<MessageStore>,
    rate_limit: Arc<dyn RateLimit>,
    started_at: Instant,
}

impl RelayState {
    /// Create state with the given store capacity and rate-limit hook.
    pub fn new(config: StoreConfig, rate_limit: Arc<dyn RateLimit>) -> Self {
        Self {
            store: Mutex::new(MessageStore::new(config)),
            rate_limit,
            started_at: Instant::now(),
        }
    }

    /// State with default capacity and no rate limiting.
    pub fn with_defaults() -> Self {
        Self::new(StoreConfig::default(), Arc::new(NoLimit))
    }

    /// Access the store (used by the janitor).
    pub(crate) fn store(&self) -> &Mutex<MessageStore> {
        &self.store
    }

    /// Wall-clock time in epoch seconds.
    pub(crate) fn now_epoch_secs() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before UNIX epoch")
            .as_secs()
    }

    fn check_rate_limit(&self) -> Result<(), ApiError> {
        if self.rate_limit.allow() {
            Ok(())
        } else {
            Err(ApiError(RelayError::RateLimited))
        }
    }
}

/// Build the relay router.
pub fn router(state: Arc<RelayState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/v1/health", get(health))
        .route("/api/v1/status", get(status))
        .route("/api/v1/send", post(send))
        .route("/api/v1/poll", post(poll))
        .route("/api/v1/consume", post(consume))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .with_state(state)
}

// ── Error mapping ───────────────────────────────────────────────────────────

/// Response-side wrapper turning [`RelayError`] into a status + JSON body.
#[derive(Debug)]
pub struct ApiError(pub RelayError);

impl From<ProtocolError> for ApiError {
    fn from(err: ProtocolError) -> Self {
        Self(RelayError::Validation(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self.0 {
            RelayError::Validation(err) => {
                let field = match &err {
                    ProtocolError::InvalidField { field, .. } => Some((*field).to_string()),
                    _ => None,
                };
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: err.to_string(),
                        field,
                    },
                )
            }
            RelayError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                ErrorResponse {
                    error: "too many requests".to_string(),
                    field: None,
                },
            ),
            RelayError::Overloaded => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorResponse {
                    error: "relay storage is at capacity".to_string(),
                    field: None,
                },
            ),
            RelayError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error: "internal".to_string(),
                    field: None,
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}

/// JSON extractor whose rejection keeps the stable error shape.
///
/// A body that is not valid JSON for the target record is a validation
/// error like any other, not a bare axum rejection.
pub struct AppJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(ApiError(RelayError::Validation(
                ProtocolError::InvalidField {
                    field: "body",
                    reason: rejection.body_text(),
                },
            ))),
        }
    }
}

// ── Handlers ────────────────────────────────────────────────────────────────

async fn root() -> Json<ServerInfo> {
    Json(ServerInfo {
        name: "obscura-relay".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        description: "Zero-knowledge relay for end-to-end encrypted messaging".to_string(),
    })
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn status(State(state): State<Arc<RelayState>>) -> Json<StatusResponse> {
    let stats = state.store().lock().stats();
    Json(StatusResponse {
        active_tokens: stats.active_tokens,
        total_messages: stats.total_messages,
        uptime_seconds: state.started_at.elapsed().as_secs(),
    })
}

async fn send(
    State(state): State<Arc<RelayState>>,
    AppJson(request): AppJson<SendRequest>,
) -> Result<Json<SendResponse>, ApiError> {
    state.check_rate_limit()?;

    let envelope = request.validate()?;
    envelope.validate()?;

    let token_prefix = envelope.token.prefix();
    let now = RelayState::now_epoch_secs();

    let message_id = match state.store().lock().put(envelope, now) {
        Ok(id) => id,
        Err(err) => {
            warn!(endpoint = "send", token = %token_prefix, status = 503, "store at capacity");
            return Err(ApiError(err));
        }
    };

    info!(endpoint = "send", token = %token_prefix, status = 200, "accepted");
    Ok(Json(SendResponse {
        message_id: message_id.to_hex(),
        accepted_at: now,
    }))
}

async fn poll(
    State(state): State<Arc<RelayState>>,
    AppJson(request): AppJson<TokenRequest>,
) -> Result<Json<MessagesResponse>, ApiError> {
    state.check_rate_limit()?;

    let token = request.validate()?;
    let now = RelayState::now_epoch_secs();

    let messages: Vec<_> = state
        .store()
        .lock()
        .poll(&token, request.since, now)
        .iter()
        .map(|msg| msg.to_view())
        .collect();

    info!(endpoint = "poll", token = %token.prefix(), status = 200, count = messages.len(), "polled");
    let count = messages.len();
    Ok(Json(MessagesResponse { messages, count }))
}

async fn consume(
    State(state): State<Arc<RelayState>>,
    AppJson(request): AppJson<TokenRequest>,
) -> Result<Json<MessagesResponse>, ApiError> {
    state.check_rate_limit()?;

    let token = request.validate()?;
    let now = RelayState::now_epoch_secs();

    let messages: Vec<_> = state
        .store()
        .lock()
        .consume(&token, now)
        .iter()
        .map(|msg| msg.to_view())
        .collect();

    info!(endpoint = "consume", token = %token.prefix(), status = 200, count = messages.len(), "consumed");
    let count = messages.len();
    Ok(Json(MessagesResponse { messages, count }))
}
