//! In-memory message store.
//!
//! Maps each routing token to an arrival-ordered queue of stored messages.
//! The store is deliberately volatile: a relay restart drops everything,
//! which is part of the zero-knowledge stance rather than a limitation.
//!
//! All methods take `now` explicitly so expiry behavior is a pure function
//! of the clock the caller supplies; the HTTP layer passes wall time and
//! tests pass whatever instant they need.
//!
//! ## Ordering
//!
//! Within one token, messages keep the order in which `put` calls acquired
//! the store lock. Across tokens nothing is implied.

use std::collections::{HashMap, VecDeque};

use rand::rngs::OsRng;
use rand::RngCore;

use obscura_crypto::{Nonce, PublicKey};
use obscura_protocol::limits::{clamp_ttl, MAX_STORED_MESSAGES, MESSAGE_ID_SIZE, PER_TOKEN_CAP};
use obscura_protocol::wire::StoredMessageView;
use obscura_protocol::{Envelope, RoutingToken};

use crate::error::{RelayError, Result};

/// Server-assigned opaque message identifier (128-bit random).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct MessageId([u8; MESSAGE_ID_SIZE]);

impl MessageId {
    /// Generate a new random message ID using OS randomness.
    pub fn generate() -> Self {
        let mut bytes = [0u8; MESSAGE_ID_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Format as a 32-character hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Debug for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MessageId({}..)", &self.to_hex()[..8])
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// One accepted envelope plus server bookkeeping.
#[derive(Clone, Debug)]
pub struct StoredMessage {
    /// Server-assigned identifier.
    pub message_id: MessageId,
    /// Opaque sealed payload.
    pub ciphertext: Vec<u8>,
    /// Nonce the payload was sealed under.
    pub nonce: Nonce,
    /// Ephemeral sender key from the envelope.
    pub sender_public_key: PublicKey,
    /// Epoch seconds when the relay accepted the message.
    pub received_at: u64,
    /// Effective (clamped) TTL in seconds.
    pub ttl: u64,
}

impl StoredMessage {
    /// A message is live while `now < received_at + ttl`.
    fn is_expired(&self, now: u64) -> bool {
        now >= self.received_at.saturating_add(self.ttl)
    }

    /// Re-encode for the poll/consume response.
    pub fn to_view(&self) -> StoredMessageView {
        StoredMessageView {
            message_id: self.message_id.to_hex(),
            ciphertext: hex::encode(&self.ciphertext),
            nonce: self.nonce.to_hex(),
            sender_public_key: self.sender_public_key.to_hex(),
            received_at: self.received_at,
            ttl: self.ttl,
        }
    }
}

/// Store capacity configuration.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Soft cap per token; oldest messages are evicted first when exceeded.
    pub per_token_cap: usize,
    /// Hard cap across all tokens; `put` fails once reached.
    pub max_messages: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            per_token_cap: PER_TOKEN_CAP,
            max_messages: MAX_STORED_MESSAGES,
        }
    }
}

/// Counters exposed by the status endpoint. Counts only, never content.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Tokens with at least one queued message.
    pub active_tokens: usize,
    /// Messages currently queued across all tokens.
    pub total_messages: usize,
    /// Lifetime count of messages dropped by expiry.
    pub expired_swept_total: u64,
}

/// The relay's single shared mutable resource.
///
/// Not thread-safe on its own; the server wraps it in a `Mutex`. Every
/// operation is bounded work, so holding the lock across one call never
/// starves other requests.
pub struct MessageStore {
    config: StoreConfig,
    queues: HashMap<RoutingToken, VecDeque<StoredMessage>>,
    total_messages: usize,
    expired_swept_total: u64,
}

impl MessageStore {
    /// Create an empty store.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            queues: HashMap::new(),
            total_messages: 0,
            expired_swept_total: 0,
        }
    }

    /// Create an empty store with default capacity limits.
    pub fn with_defaults() -> Self {
        Self::new(StoreConfig::default())
    }

    /// Accept an envelope, returning the assigned message ID.
    ///
    /// The caller-supplied TTL is clamped into the retention window. When
    /// the token's queue is at its soft cap the oldest message is evicted
    /// first (FIFO).
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Overloaded` when the global message cap is
    /// reached.
    pub fn put(&mut self, envelope: Envelope, now: u64) -> Result<MessageId> {
        if self.total_messages >= self.config.max_messages {
            return Err(RelayError::Overloaded);
        }

        let message_id = MessageId::generate();
        let message = StoredMessage {
            message_id: message_id.clone(),
            ciphertext: envelope.ciphertext,
            nonce: envelope.nonce,
            sender_public_key: envelope.sender_public_key,
            received_at: now,
            ttl: clamp_ttl(envelope.ttl),
        };

        let queue = self.queues.entry(envelope.token).or_default();
        queue.push_back(message);
        self.total_messages += 1;

        if queue.len() > self.config.per_token_cap {
            queue.pop_front();
            self.total_messages -= 1;
        }

        Ok(message_id)
    }

    /// Snapshot the live messages for a token, in arrival order.
    ///
    /// Non-destructive. Expired messages encountered along the way are
    /// lazily removed and counted as swept. With `since`, only messages
    /// received strictly after that timestamp are returned.
    pub fn poll(
        &mut self,
        token: &RoutingToken,
        since: Option<u64>,
        now: u64,
    ) -> Vec<StoredMessage> {
        self.drop_expired(token, now);

        let Some(queue) = self.queues.get(token) else {
            return Vec::new();
        };

        queue
            .iter()
            .filter(|msg| since.map_or(true, |since| msg.received_at > since))
            .cloned()
            .collect()
    }

    /// Atomically take every live message for a token.
    ///
    /// The returned set is exactly the set removed: after this call the
    /// token's queue is gone. Expired messages are dropped and counted,
    /// never returned.
    pub fn consume(&mut self, token: &RoutingToken, now: u64) -> Vec<StoredMessage> {
        let Some(queue) = self.queues.remove(token) else {
            return Vec::new();
        };

        self.total_messages -= queue.len();

        let (live, expired): (Vec<_>, Vec<_>) =
            queue.into_iter().partition(|msg| !msg.is_expired(now));
        self.expired_swept_total += expired.len() as u64;

        live
    }

    /// Drop expired messages for one token, removing the key if emptied.
    ///
    /// Returns the number of messages dropped. This is the janitor's
    /// per-token step; it is also applied lazily on poll.
    pub fn sweep_token(&mut self, token: &RoutingToken, now: u64) -> usize {
        self.drop_expired(token, now)
    }

    /// Snapshot of every token currently holding a queue.
    ///
    /// The janitor walks this snapshot so the store lock can be released
    /// between per-token sweep steps.
    pub fn token_keys(&self) -> Vec<RoutingToken> {
        self.queues.keys().cloned().collect()
    }

    /// Current counters.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            active_tokens: self.queues.len(),
            total_messages: self.total_messages,
            expired_swept_total: self.expired_swept_total,
        }
    }

    fn drop_expired(&mut self, token: &RoutingToken, now: u64) -> usize {
        let Some(queue) = self.queues.get_mut(token) else {
            return 0;
        };

        let before = queue.len();
        queue.retain(|msg| !msg.is_expired(now));
        let dropped = before - queue.len();

        self.total_messages -= dropped;
        self.expired_swept_total += dropped as u64;

        if queue.is_empty() {
            self.queues.remove(token);
        }

        dropped
    }
}

impl std::fmt::Debug for MessageStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageStore")
            .field("active_tokens", &self.queues.len())
            .field("total_messages", &self.total_messages)
            .field("expired_swept_total", &self.expired_swept_total)
            .finish()
    }
}
