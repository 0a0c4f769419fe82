//! Token Hash Value Object
//!
//! One-way SHA-256 digest (lowercase hex) of a raw bearer credential. Refresh
//! tokens, invite tokens and reset tokens are persisted only in this form.

use platform::crypto::sha256_hex;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenHash(String);

impl TokenHash {
    /// Deterministic: the same raw token always maps to the same hash
    pub fn of(raw_token: &str) -> Self {
        Self(sha256_hex(raw_token.as_bytes()))
    }

    pub fn from_db(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TokenHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // A prefix is enough to correlate log lines
        let prefix: String = self.0.chars().take(8).collect();
        write!(f, "TokenHash({}..)", prefix)
    }
}
