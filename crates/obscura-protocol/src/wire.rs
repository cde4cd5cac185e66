//! API request/response types shared between clients and the relay.
//!
//! These map directly to JSON bodies on the wire. Binary fields are
//! lowercase hex. Requests are validated into typed values
//! ([`crate::Envelope`], [`RoutingToken`]) before any handler logic runs;
//! handlers never operate on raw strings.

use serde::{Deserialize, Serialize};

use obscura_crypto::{Nonce, PublicKey};

use crate::envelope::Envelope;
use crate::error::{ProtocolError, Result};
use crate::limits::TTL_DEFAULT_SECS;
use crate::token::{is_identity_hex, RoutingToken};

// ── Send ────────────────────────────────────────────────────────────────────

/// Body of `POST /api/v1/send`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendRequest {
    /// Routing token (64 lowercase hex chars).
    pub token: String,
    /// Sealed payload, hex-encoded.
    pub ciphertext: String,
    /// 24-byte nonce, hex-encoded.
    pub nonce: String,
    /// Ephemeral sender public key (64 lowercase hex chars).
    pub sender_public_key: String,
    /// Advisory TTL in seconds; omitted means one hour. Out-of-range
    /// values are clamped by the relay, negative ones are rejected.
    #[serde(default)]
    pub ttl: Option<i64>,
}

impl SendRequest {
    /// Validate every field and produce a typed envelope.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::InvalidField` naming the first field that
    /// failed validation.
    pub fn validate(&self) -> Result<Envelope> {
        let token = RoutingToken::from_hex(&self.token)?;

        let ciphertext =
            hex::decode(&self.ciphertext).map_err(|e| ProtocolError::InvalidField {
                field: "ciphertext",
                reason: e.to_string(),
            })?;
        if ciphertext.is_empty() {
            return Err(ProtocolError::InvalidField {
                field: "ciphertext",
                reason: "must be non-empty".to_string(),
            });
        }

        let nonce = Nonce::from_hex(&self.nonce).map_err(|_| ProtocolError::InvalidField {
            field: "nonce",
            reason: "must decode to exactly 24 bytes".to_string(),
        })?;

        if !is_identity_hex(&self.sender_public_key) {
            return Err(ProtocolError::InvalidField {
                field: "sender_public_key",
                reason: "must be 64 lowercase hex characters".to_string(),
            });
        }
        let sender_public_key = PublicKey::from_hex(&self.sender_public_key)
            .map_err(|e| ProtocolError::InvalidField {
                field: "sender_public_key",
                reason: e.to_string(),
            })?;

        let ttl = match self.ttl {
            None => TTL_DEFAULT_SECS,
            Some(ttl) if ttl < 0 => {
                return Err(ProtocolError::InvalidField {
                    field: "ttl",
                    reason: "must be non-negative".to_string(),
                })
            }
            Some(ttl) => ttl as u64,
        };

        Ok(Envelope {
            token,
            ciphertext,
            nonce,
            sender_public_key,
            ttl,
        })
    }
}

impl From<&Envelope> for SendRequest {
    fn from(envelope: &Envelope) -> Self {
        Self {
            token: envelope.token.to_hex(),
            ciphertext: hex::encode(&envelope.ciphertext),
            nonce: envelope.nonce.to_hex(),
            sender_public_key: envelope.sender_public_key.to_hex(),
            ttl: Some(envelope.ttl as i64),
        }
    }
}

/// Response to a successful send.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendResponse {
    /// Server-assigned opaque message ID.
    pub message_id: String,
    /// Epoch seconds at which the relay accepted the message.
    pub accepted_at: u64,
}

// ── Poll / consume ──────────────────────────────────────────────────────────

/// Body of `POST /api/v1/poll` and `POST /api/v1/consume`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRequest {
    /// Routing token to fetch messages for.
    pub token: String,
    /// Poll only: return messages received strictly after this epoch
    /// timestamp. Ignored by consume.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<u64>,
}

impl TokenRequest {
    /// Validate the token field.
    pub fn validate(&self) -> Result<RoutingToken> {
        RoutingToken::from_hex(&self.token)
    }
}

/// One stored message as returned to a polling recipient.
///
/// Exactly the envelope the sender posted, plus server bookkeeping. Never
/// includes anything the relay could not already see.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessageView {
    /// Server-assigned opaque message ID.
    pub message_id: String,
    /// Sealed payload, hex-encoded.
    pub ciphertext: String,
    /// 24-byte nonce, hex-encoded.
    pub nonce: String,
    /// Ephemeral sender public key, hex-encoded.
    pub sender_public_key: String,
    /// Epoch seconds when the relay accepted the message.
    pub received_at: u64,
    /// Effective (clamped) TTL in seconds.
    pub ttl: u64,
}

impl StoredMessageView {
    /// Decode back into a typed envelope for opening.
    ///
    /// The token is supplied by the caller (it is the one they polled
    /// with; views do not repeat it).
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::InvalidField` if the relay returned a view
    /// with undecodable fields.
    pub fn to_envelope(&self, token: RoutingToken) -> Result<Envelope> {
        let ciphertext =
            hex::decode(&self.ciphertext).map_err(|e| ProtocolError::InvalidField {
                field: "ciphertext",
                reason: e.to_string(),
            })?;

        let nonce = Nonce::from_hex(&self.nonce).map_err(|_| ProtocolError::InvalidField {
            field: "nonce",
            reason: "must decode to exactly 24 bytes".to_string(),
        })?;

        let sender_public_key = PublicKey::from_hex(&self.sender_public_key)
            .map_err(|e| ProtocolError::InvalidField {
                field: "sender_public_key",
                reason: e.to_string(),
            })?;

        Ok(Envelope {
            token,
            ciphertext,
            nonce,
            sender_public_key,
            ttl: self.ttl,
        })
    }
}

/// Response to poll and consume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesResponse {
    /// Live messages in arrival order.
    pub messages: Vec<StoredMessageView>,
    /// Convenience count, always `messages.len()`.
    pub count: usize,
}

// ── Status / health / info ──────────────────────────────────────────────────

/// Response of `GET /api/v1/status`. Counts only, never content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Number of tokens with at least one queued message.
    pub active_tokens: usize,
    /// Total queued messages across all tokens.
    pub total_messages: usize,
    /// Seconds since the relay started.
    pub uptime_seconds: u64,
}

/// Response of `GET /api/v1/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the relay can answer at all.
    pub status: String,
}

/// Response of `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
    /// One-line description.
    pub description: String,
}

/// Stable JSON error shape for every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable reason.
    pub error: String,
    /// The offending request field, when one can be named.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}
