//! Session Registry
//!
//! Bounded per-user list of live refresh-token handles, stored as hashes.
//! Every function here is pure over the session list; the caller persists
//! the result through a version-checked write so that two concurrent
//! rotations of the same token cannot both succeed.

use chrono::{DateTime, Utc};

use crate::domain::entity::session::{SessionEntry, SessionInfo};
use crate::domain::value_object::token_hash::TokenHash;

/// One slot per device or browser
pub const MAX_SESSIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationOutcome {
    /// Presented handle removed, replacement registered
    Rotated,
    /// Presented handle was unknown; every session was revoked
    ReuseDetected { revoked: usize },
}

pub fn prune_expired(sessions: &mut Vec<SessionEntry>, now: DateTime<Utc>) {
    sessions.retain(|s| !s.is_expired(now));
}

/// Prune expired entries, append, then evict oldest-first down to the cap
pub fn register(
    sessions: &mut Vec<SessionEntry>,
    raw_token: &str,
    now: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) {
    prune_expired(sessions, now);
    sessions.push(SessionEntry::new(raw_token, now, expires_at));

    if sessions.len() > MAX_SESSIONS {
        let overflow = sessions.len() - MAX_SESSIONS;
        sessions.drain(..overflow);
    }
}

fn position(sessions: &[SessionEntry], hash: &TokenHash) -> Option<usize> {
    sessions.iter().position(|s| &s.token_hash == hash)
}

pub fn contains(sessions: &[SessionEntry], raw_token: &str) -> bool {
    position(sessions, &TokenHash::of(raw_token)).is_some()
}

/// Logout from one device. Returns whether a handle was removed.
pub fn revoke_one(sessions: &mut Vec<SessionEntry>, raw_token: &str) -> bool {
    match position(sessions, &TokenHash::of(raw_token)) {
        Some(index) => {
            sessions.remove(index);
            true
        }
        None => false,
    }
}

/// Returns the number of handles revoked
pub fn revoke_all(sessions: &mut Vec<SessionEntry>) -> usize {
    let count = sessions.len();
    sessions.clear();
    count
}

/// Swap the presented handle for `replacement_raw`.
///
/// The presented token must already have passed signature and claim
/// checks. An unknown handle means it was rotated away earlier and is being
/// replayed, so the whole list is cleared.
pub fn rotate(
    sessions: &mut Vec<SessionEntry>,
    presented_raw: &str,
    replacement_raw: &str,
    now: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> RotationOutcome {
    match position(sessions, &TokenHash::of(presented_raw)) {
        Some(index) => {
            sessions.remove(index);
            register(sessions, replacement_raw, now, expires_at);
            RotationOutcome::Rotated
        }
        None => RotationOutcome::ReuseDetected {
            revoked: revoke_all(sessions),
        },
    }
}

/// Live sessions, oldest first. `current_raw` marks the caller's own session.
pub fn list(
    sessions: &[SessionEntry],
    current_raw: Option<&str>,
    now: DateTime<Utc>,
) -> Vec<SessionInfo> {
    let current = current_raw.map(TokenHash::of);
    sessions
        .iter()
        .filter(|s| !s.is_expired(now))
        .map(|s| SessionInfo {
            created_at: s.created_at,
            expires_at: s.expires_at,
            current: current.as_ref() == Some(&s.token_hash),
        })
        .collect()
}
