//! # obscura-client
//!
//! Client side of the Obscura messenger: identity persistence, the HTTP
//! transport to a relay, local conversation history, and the
//! [`Messenger`] facade tying them together.
//!
//! The client does all the cryptography; the relay only ever sees sealed
//! envelopes. Inbound messages are sorted into conversations by the
//! sender key recovered from *inside* each decrypted payload.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod conversation;
pub mod error;
pub mod keystore;
pub mod transport;

pub use client::{IncomingMessage, Messenger};
pub use conversation::{ConversationEntry, ConversationStore, Direction};
pub use error::{ClientError, Result};
pub use keystore::Keystore;
pub use transport::RelayTransport;
