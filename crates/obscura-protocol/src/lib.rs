//! # obscura-protocol
//!
//! Wire protocol and message sealing for the Obscura messenger.
//!
//! This crate provides:
//! - **RoutingToken**: SHA-256 of the recipient public key, the relay's
//!   only index
//! - **Envelope**: the opaque record a relay stores and forwards
//! - **seal / open**: per-message ephemeral-key encryption with the true
//!   sender embedded inside the ciphertext
//! - **wire**: JSON request/response types shared by relay and clients
//!
//! ## Privacy Design
//!
//! The relay sees a token (unlinkable to an identity without the public
//! key), a single-use ephemeral key, a nonce, and ciphertext. Sender
//! identity lives inside the sealed payload, so conversation routing works
//! on the recipient without the relay ever learning who is talking.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod envelope;
pub mod error;
pub mod inner;
pub mod limits;
pub mod seal;
pub mod token;
pub mod wire;

pub use envelope::Envelope;
pub use error::{ProtocolError, Result};
pub use inner::Sender;
pub use seal::{open, seal, OpenedMessage};
pub use token::RoutingToken;

#[cfg(test)]
mod proptests;
