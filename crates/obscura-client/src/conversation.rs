//! Local conversation history.
//!
//! A conversation is identified by the pair (own identity, peer identity);
//! since one data directory belongs to one identity, history is stored per
//! peer as `chat_data/<peer_pub>.json` - an array of
//! `{direction, timestamp, text}` entries. Messages whose inner sender
//! prefix was malformed land in the reserved `unknown` conversation.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use obscura_protocol::token::is_identity_hex;

use crate::error::{ClientError, Result};

/// Conversation name for messages with an unrecoverable sender prefix.
pub const UNKNOWN_PEER: &str = "unknown";

/// Which way a message travelled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Received from the peer.
    Inbound,
    /// Sent by us.
    Outbound,
}

/// One decrypted message in a conversation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConversationEntry {
    /// Message direction.
    pub direction: Direction,
    /// Local time the entry was recorded.
    pub timestamp: DateTime<Utc>,
    /// Decrypted message text.
    pub text: String,
}

/// Per-peer conversation files under a `chat_data/` directory.
#[derive(Debug, Clone)]
pub struct ConversationStore {
    dir: PathBuf,
}

impl ConversationStore {
    /// Create a store rooted at `dir` (typically `chat_data/`).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn peer_path(&self, peer: &str) -> Result<PathBuf> {
        // Peer names become file names; only the two valid shapes pass.
        if peer != UNKNOWN_PEER && !is_identity_hex(peer) {
            return Err(ClientError::Storage(format!(
                "invalid conversation peer '{peer}'"
            )));
        }
        Ok(self.dir.join(format!("{peer}.json")))
    }

    /// Load the history for a peer, oldest first. Missing file means no
    /// history yet.
    pub fn history(&self, peer: &str) -> Result<Vec<ConversationEntry>> {
        let path = self.peer_path(peer)?;
        if !path.exists() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Append one entry to a peer's history.
    pub fn append(&self, peer: &str, entry: ConversationEntry) -> Result<()> {
        let path = self.peer_path(peer)?;
        fs::create_dir_all(&self.dir)?;

        let mut history = self.history(peer)?;
        history.push(entry);
        fs::write(path, serde_json::to_string_pretty(&history)?)?;
        Ok(())
    }

    /// Public keys of every peer with recorded history.
    pub fn peers(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut peers = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let name = entry?.file_name();
            if let Some(peer) = name.to_str().and_then(|n| n.strip_suffix(".json")) {
                peers.push(peer.to_string());
            }
        }
        peers.sort();
        Ok(peers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use obscura_crypto::IdentityKeyPair;
    use tempfile::TempDir;

    fn entry(direction: Direction, text: &str) -> ConversationEntry {
        ConversationEntry {
            direction,
            timestamp: Utc::now(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_history_starts_empty() {
        let dir = TempDir::new().unwrap();
        let store = ConversationStore::new(dir.path().join("chat_data"));
        let peer = IdentityKeyPair::generate().public_key().to_hex();

        assert!(store.history(&peer).unwrap().is_empty());
    }

    #[test]
    fn test_append_preserves_order() {
        let dir = TempDir::new().unwrap();
        let store = ConversationStore::new(dir.path().join("chat_data"));
        let peer = IdentityKeyPair::generate().public_key().to_hex();

        store.append(&peer, entry(Direction::Outbound, "hi")).unwrap();
        store.append(&peer, entry(Direction::Inbound, "hey")).unwrap();
        store.append(&peer, entry(Direction::Outbound, "how?")).unwrap();

        let history = store.history(&peer).unwrap();
        let texts: Vec<_> = history.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, ["hi", "hey", "how?"]);
        assert_eq!(history[0].direction, Direction::Outbound);
        assert_eq!(history[1].direction, Direction::Inbound);
    }

    #[test]
    fn test_peers_are_isolated() {
        let dir = TempDir::new().unwrap();
        let store = ConversationStore::new(dir.path().join("chat_data"));
        let peer_a = IdentityKeyPair::generate().public_key().to_hex();
        let peer_b = IdentityKeyPair::generate().public_key().to_hex();

        store.append(&peer_a, entry(Direction::Inbound, "a")).unwrap();
        store.append(&peer_b, entry(Direction::Inbound, "b")).unwrap();

        assert_eq!(store.history(&peer_a).unwrap().len(), 1);
        assert_eq!(store.history(&peer_b).unwrap().len(), 1);

        let mut expected = vec![peer_a, peer_b];
        expected.sort();
        assert_eq!(store.peers().unwrap(), expected);
    }

    #[test]
    fn test_unknown_peer_allowed() {
        let dir = TempDir::new().unwrap();
        let store = ConversationStore::new(dir.path().join("chat_data"));

        store
            .append(UNKNOWN_PEER, entry(Direction::Inbound, "mystery"))
            .unwrap();
        assert_eq!(store.history(UNKNOWN_PEER).unwrap().len(), 1);
    }

    #[test]
    fn test_path_traversal_rejected() {
        let dir = TempDir::new().unwrap();
        let store = ConversationStore::new(dir.path().join("chat_data"));

        assert!(store
            .append("../escape", entry(Direction::Inbound, "nope"))
            .is_err());
    }
}
