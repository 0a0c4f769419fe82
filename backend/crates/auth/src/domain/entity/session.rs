//! Session Entry
//!
//! One live refresh-token handle. Only the token hash is kept; the raw token
//! exists solely in the client's cookie.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_object::token_hash::TokenHash;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEntry {
    pub token_hash: TokenHash,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionEntry {
    pub fn new(raw_token: &str, created_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token_hash: TokenHash::of(raw_token),
            created_at,
            expires_at,
        }
    }

    #[inline]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Outward view of a session (no hash material)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// True for the session the caller is presenting
    pub current: bool,
}
