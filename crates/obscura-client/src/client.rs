//! High-level messenger facade.
//!
//! Ties together the identity keystore, the relay transport, and the
//! conversation log: seal-and-send on the way out, consume-and-open on
//! the way in, with every decrypted message dispatched to the
//! conversation named by the sender key found *inside* the ciphertext.

use chrono::Utc;
use tracing::{info, warn};

use obscura_crypto::{IdentityKeyPair, PublicKey};
use obscura_protocol::{open, seal, RoutingToken, Sender};

use crate::conversation::{ConversationEntry, ConversationStore, Direction, UNKNOWN_PEER};
use crate::error::Result;
use crate::transport::RelayTransport;

/// One message fetched and decrypted from the relay.
#[derive(Debug)]
pub struct IncomingMessage {
    /// Server-assigned message ID.
    pub message_id: String,
    /// The true sender recovered from the inner payload.
    pub sender: Sender,
    /// Message text (lossy UTF-8 if the payload was not valid UTF-8).
    pub text: String,
    /// Epoch seconds when the relay accepted the message.
    pub received_at: u64,
}

/// A complete messenger endpoint: one identity talking through one relay.
pub struct Messenger {
    identity: IdentityKeyPair,
    transport: RelayTransport,
    conversations: ConversationStore,
}

impl Messenger {
    /// Assemble a messenger from its parts.
    pub fn new(
        identity: IdentityKeyPair,
        transport: RelayTransport,
        conversations: ConversationStore,
    ) -> Self {
        Self {
            identity,
            transport,
            conversations,
        }
    }

    /// Our public identity, shared with peers out of band.
    pub fn public_key(&self) -> PublicKey {
        self.identity.public_key()
    }

    /// The routing token peers' messages to us arrive under.
    pub fn token(&self) -> RoutingToken {
        RoutingToken::derive(&self.identity.public_key())
    }

    /// Seal `text` for `recipient` and post it to the relay.
    ///
    /// Records the outbound message in the recipient's conversation and
    /// returns the relay-assigned message ID.
    pub async fn send_text(&self, recipient: &PublicKey, text: &str, ttl: u64) -> Result<String> {
        let envelope = seal(recipient, &self.identity.public_key(), text.as_bytes(), ttl)?;
        let response = self.transport.send(&envelope).await?;

        self.conversations.append(
            &recipient.to_hex(),
            ConversationEntry {
                direction: Direction::Outbound,
                timestamp: Utc::now(),
                text: text.to_string(),
            },
        )?;

        info!(message_id = %response.message_id, "message sent");
        Ok(response.message_id)
    }

    /// Consume our token, open everything, and file each message into its
    /// conversation.
    ///
    /// Envelopes that fail authentication are dropped (logged as
    /// undeliverable, identified only by the ephemeral key prefix - all
    /// we have). Messages with a malformed sender prefix are kept under
    /// the `unknown` conversation.
    pub async fn fetch_messages(&self) -> Result<Vec<IncomingMessage>> {
        let token = self.token();
        let response = self.transport.consume(&token).await?;

        let mut incoming = Vec::with_capacity(response.messages.len());
        for view in response.messages {
            let envelope = match view.to_envelope(token.clone()) {
                Ok(envelope) => envelope,
                Err(e) => {
                    warn!(message_id = %view.message_id, error = %e, "skipping undecodable view");
                    continue;
                }
            };

            let opened = match open(self.identity.private_key(), &envelope) {
                Ok(opened) => opened,
                Err(_) => {
                    warn!(
                        sender_prefix = %&envelope.sender_public_key.to_hex()[..8],
                        "undeliverable message discarded"
                    );
                    continue;
                }
            };

            let text = String::from_utf8_lossy(&opened.plaintext).into_owned();
            let peer = match &opened.sender {
                Sender::Known(key) => key.to_hex(),
                Sender::Unknown => UNKNOWN_PEER.to_string(),
            };

            self.conversations.append(
                &peer,
                ConversationEntry {
                    direction: Direction::Inbound,
                    timestamp: Utc::now(),
                    text: text.clone(),
                },
            )?;

            incoming.push(IncomingMessage {
                message_id: view.message_id,
                sender: opened.sender,
                text,
                received_at: view.received_at,
            });
        }

        Ok(incoming)
    }

    /// Conversation history with a peer.
    pub fn history(&self, peer: &PublicKey) -> Result<Vec<ConversationEntry>> {
        self.conversations.history(&peer.to_hex())
    }
}

impl std::fmt::Debug for Messenger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Messenger")
            .field("public_key", &self.identity.public_key())
            .finish()
    }
}
