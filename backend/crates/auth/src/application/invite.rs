//! One-time link tokens.
//!
//! Invites and password resets share the same mechanics: 256 random bits,
//! hex-encoded, handed out once; only the SHA-256 hash and an expiry are
//! stored. Wrong and expired tokens fail with the same error.

use chrono::{DateTime, Duration, Utc};
use platform::crypto::random_token_hex;

use crate::application::config::AuthConfig;
use crate::domain::entity::user::{PendingToken, User};
use crate::domain::repository::UserStore;
use crate::domain::value_object::{token_hash::TokenHash, user_password::UserPassword};
use crate::error::{AuthError, AuthResult};

/// Raw token size in bytes
pub const LINK_TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkPurpose {
    Invite,
    PasswordReset,
}

impl LinkPurpose {
    fn slot(self, user: &User) -> Option<&PendingToken> {
        match self {
            LinkPurpose::Invite => user.invite.as_ref(),
            LinkPurpose::PasswordReset => user.password_reset.as_ref(),
        }
    }

    fn slot_mut(self, user: &mut User) -> &mut Option<PendingToken> {
        match self {
            LinkPurpose::Invite => &mut user.invite,
            LinkPurpose::PasswordReset => &mut user.password_reset,
        }
    }

    fn rejection(self) -> AuthError {
        match self {
            LinkPurpose::Invite => AuthError::InviteInvalidOrExpired,
            LinkPurpose::PasswordReset => AuthError::ResetTokenInvalidOrExpired,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InviteTokenService {
    invite_ttl: Duration,
    reset_ttl: Duration,
}

impl InviteTokenService {
    pub fn new(config: &AuthConfig) -> AuthResult<Self> {
        let convert = |ttl: std::time::Duration| {
            Duration::from_std(ttl)
                .map_err(|e| AuthError::Internal(format!("Link lifetime out of range: {e}")))
        };

        Ok(Self {
            invite_ttl: convert(config.invite_ttl)?,
            reset_ttl: convert(config.reset_ttl)?,
        })
    }

    fn ttl(&self, purpose: LinkPurpose) -> Duration {
        match purpose {
            LinkPurpose::Invite => self.invite_ttl,
            LinkPurpose::PasswordReset => self.reset_ttl,
        }
    }

    /// Put a fresh token on `user`, replacing any outstanding one, and return
    /// the raw value. The caller persists the record and delivers the token.
    pub fn issue(&self, user: &mut User, purpose: LinkPurpose, now: DateTime<Utc>) -> String {
        let raw = random_token_hex(LINK_TOKEN_BYTES);
        *purpose.slot_mut(user) = Some(PendingToken::new(&raw, now + self.ttl(purpose)));
        user.updated_at = now;
        raw
    }

    /// Look up the holder of a live token
    pub async fn find_holder<S: UserStore>(
        &self,
        store: &S,
        purpose: LinkPurpose,
        raw: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<User> {
        let hash = TokenHash::of(raw);
        let holder = match purpose {
            LinkPurpose::Invite => store.find_by_invite_hash(&hash, now).await?,
            LinkPurpose::PasswordReset => store.find_by_reset_hash(&hash, now).await?,
        };
        holder.ok_or_else(|| purpose.rejection())
    }

    /// Consume the token on `user` and set the password.
    ///
    /// Re-checks hash and expiry against the record in hand, so a token
    /// consumed by a concurrent request is rejected on retry.
    pub fn redeem(
        &self,
        user: &mut User,
        purpose: LinkPurpose,
        raw: &str,
        password: UserPassword,
        now: DateTime<Utc>,
    ) -> AuthResult<()> {
        let hash = TokenHash::of(raw);
        let valid = purpose
            .slot(user)
            .is_some_and(|pending| pending.token_hash == hash && pending.is_live(now));

        if !valid {
            return Err(purpose.rejection());
        }

        user.set_password(password, now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::user::NewUserProfile;
    use crate::domain::value_object::{
        user_id::UserId, user_password::RawPassword, user_role::UserRole,
    };
    use platform::password::{HashCost, PasswordHasher};

    fn pending_user(now: DateTime<Utc>) -> User {
        let profile = NewUserProfile::new("Alan", "Turing", "alan@x.com").unwrap();
        User::invited(profile, UserRole::Employee, UserId::new(), now)
    }

    fn digest() -> UserPassword {
        let hasher = PasswordHasher::new(HashCost::minimal(), None).unwrap();
        UserPassword::hash(&hasher, &RawPassword::new("Quiet-Harbor-42".into()).unwrap()).unwrap()
    }

    #[test]
    fn test_issue_stores_hash_only() {
        let service = InviteTokenService::new(&AuthConfig::development()).unwrap();
        let now = Utc::now();
        let mut user = pending_user(now);

        let raw = service.issue(&mut user, LinkPurpose::Invite, now);

        assert_eq!(raw.len(), LINK_TOKEN_BYTES * 2);
        let pending = user.invite.as_ref().unwrap();
        assert_ne!(pending.token_hash.as_str(), raw);
        assert_eq!(pending.token_hash, TokenHash::of(&raw));
        assert_eq!(pending.expires_at, now + Duration::hours(48));
    }

    #[test]
    fn test_redeem_is_one_time() {
        let service = InviteTokenService::new(&AuthConfig::development()).unwrap();
        let now = Utc::now();
        let mut user = pending_user(now);
        let raw = service.issue(&mut user, LinkPurpose::Invite, now);

        service
            .redeem(&mut user, LinkPurpose::Invite, &raw, digest(), now)
            .unwrap();
        assert!(user.has_set_password);
        assert!(user.invite.is_none());

        let again = service.redeem(&mut user, LinkPurpose::Invite, &raw, digest(), now);
        assert!(matches!(again, Err(AuthError::InviteInvalidOrExpired)));
    }

    #[test]
    fn test_wrong_and_expired_fail_identically() {
        let service = InviteTokenService::new(&AuthConfig::development()).unwrap();
        let now = Utc::now();
        let mut user = pending_user(now);
        let raw = service.issue(&mut user, LinkPurpose::Invite, now);

        let wrong = service.redeem(&mut user, LinkPurpose::Invite, "deadbeef", digest(), now);
        let expired = service.redeem(
            &mut user,
            LinkPurpose::Invite,
            &raw,
            digest(),
            now + Duration::hours(49),
        );

        assert_eq!(
            wrong.unwrap_err().to_string(),
            expired.unwrap_err().to_string()
        );
        assert!(!user.has_set_password);
    }

    #[test]
    fn test_purposes_do_not_cross() {
        let service = InviteTokenService::new(&AuthConfig::development()).unwrap();
        let now = Utc::now();
        let mut user = pending_user(now);
        let raw = service.issue(&mut user, LinkPurpose::PasswordReset, now);

        let as_invite = service.redeem(&mut user, LinkPurpose::Invite, &raw, digest(), now);
        assert!(matches!(as_invite, Err(AuthError::InviteInvalidOrExpired)));

        service
            .redeem(&mut user, LinkPurpose::PasswordReset, &raw, digest(), now)
            .unwrap();
        assert!(user.password_reset.is_none());
    }
}
