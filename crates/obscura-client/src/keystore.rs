//! Long-term identity key persistence.
//!
//! Keys live in a `keys/` directory as a JSON file:
//!
//! ```json
//! {
//!   "private_key": "<64 hex chars>",
//!   "public_key": "<64 hex chars>",
//!   "created_at": "2026-01-15T09:30:00Z"
//! }
//! ```
//!
//! The public key string is the canonical identity shared with peers. On
//! load, the stored public key is cross-checked against the one derived
//! from the private key; a mismatch means the file was edited or corrupted
//! and is rejected rather than silently trusted.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use obscura_crypto::{IdentityKeyPair, PublicKey, StaticPrivateKey};
use obscura_protocol::token::is_identity_hex;

use crate::error::{ClientError, Result};

/// File name of the identity record inside the keys directory.
const KEYS_FILE: &str = "keys.json";

/// Serialized identity record.
#[derive(Serialize, Deserialize)]
struct StoredIdentity {
    private_key: String,
    public_key: String,
    created_at: DateTime<Utc>,
}

/// Identity storage rooted at a `keys/` directory.
#[derive(Debug, Clone)]
pub struct Keystore {
    dir: PathBuf,
}

impl Keystore {
    /// Create a keystore rooted at `dir` (typically `keys/` next to the
    /// executable). The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn keys_path(&self) -> PathBuf {
        self.dir.join(KEYS_FILE)
    }

    /// Load the stored identity, if one exists.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but is unreadable, malformed, or
    /// internally inconsistent.
    pub fn load(&self) -> Result<Option<IdentityKeyPair>> {
        let path = self.keys_path();
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path)?;
        let stored: StoredIdentity = serde_json::from_str(&contents)?;

        let private = StaticPrivateKey::from_hex(&stored.private_key)?;
        let keypair = IdentityKeyPair::from_private(private);

        if keypair.public_key().to_hex() != stored.public_key {
            return Err(ClientError::Storage(format!(
                "key file {} is inconsistent: stored public key does not match private key",
                path.display()
            )));
        }

        Ok(Some(keypair))
    }

    /// Persist an identity, creating the directory as needed.
    ///
    /// On unix the file is written with `0o600` permissions.
    pub fn save(&self, keypair: &IdentityKeyPair) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let stored = StoredIdentity {
            private_key: keypair.private_key().to_hex(),
            public_key: keypair.public_key().to_hex(),
            created_at: Utc::now(),
        };

        let path = self.keys_path();
        fs::write(&path, serde_json::to_string_pretty(&stored)?)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    /// Load the identity, generating and saving a fresh one if absent.
    pub fn load_or_generate(&self) -> Result<IdentityKeyPair> {
        if let Some(keypair) = self.load()? {
            return Ok(keypair);
        }

        let keypair = IdentityKeyPair::generate();
        self.save(&keypair)?;
        info!(public_key = %keypair.public_key().to_hex(), "generated new identity");
        Ok(keypair)
    }

    /// Export the public key to a text file for sharing.
    pub fn export_public_key(&self, keypair: &IdentityKeyPair, path: &Path) -> Result<()> {
        fs::write(path, keypair.public_key().to_hex())?;
        Ok(())
    }

    /// Import a peer's public key from a text file.
    ///
    /// # Errors
    ///
    /// Fails unless the file contains exactly 64 lowercase hex characters
    /// (surrounding whitespace ignored).
    pub fn import_public_key(path: &Path) -> Result<PublicKey> {
        let contents = fs::read_to_string(path)?;
        let trimmed = contents.trim();

        if !is_identity_hex(trimmed) {
            return Err(ClientError::Storage(format!(
                "{} does not contain a valid public key",
                path.display()
            )));
        }

        Ok(PublicKey::from_hex(trimmed)?)
    }
}
