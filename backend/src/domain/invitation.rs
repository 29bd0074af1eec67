//! Activation invitations for newly registered users.
//!
//! The plaintext token is handed to the delivery collaborator once; the store
//! only ever sees its SHA-256 digest.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::Error;

/// Plaintext activation token.
#[derive(Clone, PartialEq, Eq)]
pub struct InvitationToken(String);

impl InvitationToken {
    /// Generate a fresh random token.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Accept a token presented by a caller.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::invalid_request("activation token must not be empty"));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// SHA-256 digest used to look the invitation up.
    #[must_use]
    pub fn digest(&self) -> TokenDigest {
        TokenDigest(hex::encode(Sha256::digest(self.0.as_bytes())))
    }

    /// Plaintext value, for delivery to the invitee.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for InvitationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("InvitationToken(<redacted>)")
    }
}

/// Hex-encoded SHA-256 digest of an [`InvitationToken`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenDigest(String);

impl TokenDigest {
    /// Hex string as stored.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Invitation persisted alongside a new user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invitation {
    pub digest: TokenDigest,
    pub expires_at: DateTime<Utc>,
}
