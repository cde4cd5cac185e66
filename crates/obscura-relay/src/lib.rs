//! # obscura-relay
//!
//! Zero-knowledge relay server for the Obscura messenger.
//!
//! The relay accepts opaque sealed envelopes, indexes them by an anonymous
//! routing token, holds them until consumed or expired, and answers poll
//! and consume requests. It cannot read payloads, identify true senders
//! (envelope sender keys are single-use ephemerals), or link tokens to
//! identities.
//!
//! Storage is in-memory only; a restart drops every queued message. That
//! volatility is a design choice reinforcing the transient, zero-knowledge
//! stance.
//!
//! # Components
//!
//! - [`MessageStore`]: token-keyed queues with TTL expiry and FIFO caps
//! - [`Janitor`]: background sweeper with a graceful-shutdown handle
//! - [`router`] / [`RelayState`]: the axum HTTP surface
//! - [`RateLimit`]: pluggable admission hook (no-op by default)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod error;
pub mod janitor;
pub mod rate_limit;
pub mod store;

pub use api::{router, RelayState, REQUEST_TIMEOUT};
pub use error::{RelayError, Result};
pub use janitor::Janitor;
pub use rate_limit::{NoLimit, RateLimit, TokenBucket};
pub use store::{MessageId, MessageStore, StoreConfig, StoreStats, StoredMessage};
