//! User Entity
//!
//! Account record owned by the user store. All credential material is held
//! in hashed form: the password as an Argon2id digest, refresh tokens and
//! one-time links as SHA-256 hashes.

use chrono::{DateTime, Utc};
use kernel::error::app_error::AppResult;
use serde::Serialize;

use crate::domain::entity::session::SessionEntry;
use crate::domain::lockout::LockoutState;
use crate::domain::value_object::{
    email::Email, person_name::PersonName, token_hash::TokenHash, user_id::UserId,
    user_password::UserPassword, user_role::UserRole,
};

/// Outstanding one-time link (invite or password reset).
///
/// Hash and expiry travel together, so they are present or absent as a pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingToken {
    pub token_hash: TokenHash,
    pub expires_at: DateTime<Utc>,
}

impl PendingToken {
    pub fn new(raw_token: &str, expires_at: DateTime<Utc>) -> Self {
        Self {
            token_hash: TokenHash::of(raw_token),
            expires_at,
        }
    }

    /// Usable while the expiry is strictly in the future
    #[inline]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Validated profile for a new account
#[derive(Debug, Clone)]
pub struct NewUserProfile {
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub email: Email,
}

impl NewUserProfile {
    pub fn new(first_name: &str, last_name: &str, email: &str) -> AppResult<Self> {
        Ok(Self {
            first_name: PersonName::new(first_name, "First name")?,
            last_name: PersonName::new(last_name, "Last name")?,
            email: Email::new(email)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub email: Email,
    /// Absent until the password is set; never serialized outward
    pub password: Option<UserPassword>,
    pub role: UserRole,
    pub is_active: bool,
    pub has_set_password: bool,
    pub invite: Option<PendingToken>,
    pub password_reset: Option<PendingToken>,
    /// Live refresh-token handles, oldest first
    pub sessions: Vec<SessionEntry>,
    pub lockout: LockoutState,
    pub password_changed_at: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    /// Admin who created the record; `None` for the bootstrap admin
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency token, bumped by the store on every write
    pub version: i64,
}

impl User {
    /// First admin, created with a password already set
    pub fn bootstrap_admin(profile: NewUserProfile, password: UserPassword, now: DateTime<Utc>) -> Self {
        let mut user = Self::blank(profile, UserRole::Admin, None, now);
        user.password = Some(password);
        user.has_set_password = true;
        user.password_changed_at = Some(now);
        user
    }

    /// Account created by an admin, password unset. The caller attaches the
    /// invite before persisting.
    pub fn invited(
        profile: NewUserProfile,
        role: UserRole,
        created_by: UserId,
        now: DateTime<Utc>,
    ) -> Self {
        Self::blank(profile, role, Some(created_by), now)
    }

    fn blank(
        profile: NewUserProfile,
        role: UserRole,
        created_by: Option<UserId>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: UserId::new(),
            first_name: profile.first_name,
            last_name: profile.last_name,
            email: profile.email,
            password: None,
            role,
            is_active: true,
            has_set_password: false,
            invite: None,
            password_reset: None,
            sessions: Vec::new(),
            lockout: LockoutState::default(),
            password_changed_at: None,
            last_login_at: None,
            created_by,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.lockout.is_locked(now)
    }

    pub fn is_bootstrap_admin(&self) -> bool {
        self.role.is_admin() && self.created_by.is_none()
    }

    /// Store a new password digest and close any outstanding one-time links
    pub fn set_password(&mut self, password: UserPassword, now: DateTime<Utc>) {
        self.password = Some(password);
        self.has_set_password = true;
        self.password_changed_at = Some(now);
        self.invite = None;
        self.password_reset = None;
        self.updated_at = now;
    }

    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            first_name: self.first_name.as_str().to_string(),
            last_name: self.last_name.as_str().to_string(),
            full_name: self.full_name(),
            email: self.email.as_str().to_string(),
            role: self.role,
            is_active: self.is_active,
            has_set_password: self.has_set_password,
            last_login_at: self.last_login_at,
        }
    }
}

/// Outward projection of a user. Carries no password or token material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub email: String,
    pub role: UserRole,
    pub is_active: bool,
    pub has_set_password: bool,
    pub last_login_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::user_password::RawPassword;
    use chrono::Duration;
    use platform::password::{HashCost, PasswordHasher};

    fn profile(email: &str) -> NewUserProfile {
        NewUserProfile::new("Grace", "Hopper", email).unwrap()
    }

    #[test]
    fn test_invited_user_is_pending() {
        let now = Utc::now();
        let user = User::invited(profile("g@x.com"), UserRole::Admin, UserId::new(), now);

        assert!(user.password.is_none());
        assert!(!user.has_set_password);
        assert!(user.is_active);
        assert_eq!(user.version, 0);
        // Admins created by another admin are not bootstrap admins
        assert!(!user.is_bootstrap_admin());
        assert_eq!(user.full_name(), "Grace Hopper");
    }

    #[test]
    fn test_set_password_clears_links() {
        let now = Utc::now();
        let mut user = User::invited(profile("g@x.com"), UserRole::Employee, UserId::new(), now);
        user.invite = Some(PendingToken::new("raw", now + Duration::hours(48)));
        user.password_reset = Some(PendingToken::new("reset", now + Duration::hours(1)));

        let hasher = PasswordHasher::new(HashCost::minimal(), None).unwrap();
        let raw = RawPassword::new("Quiet-Harbor-42".to_string()).unwrap();
        let digest = UserPassword::hash(&hasher, &raw).unwrap();
        user.set_password(digest, now);

        assert!(user.has_set_password);
        assert!(user.invite.is_none());
        assert!(user.password_reset.is_none());
        assert_eq!(user.password_changed_at, Some(now));
    }

    #[test]
    fn test_pending_token_expiry_is_exclusive() {
        let now = Utc::now();
        let token = PendingToken::new("raw", now);
        assert!(!token.is_live(now));
        assert!(token.is_live(now - Duration::seconds(1)));
    }

    #[test]
    fn test_public_projection() {
        let now = Utc::now();
        let user = User::invited(profile("g@x.com"), UserRole::HrManager, UserId::new(), now);
        let json = serde_json::to_value(user.public()).unwrap();
        assert_eq!(json["role"], "hr_manager");
        assert_eq!(json["fullName"], "Grace Hopper");
        assert!(json.get("password").is_none());
        assert!(json.get("sessions").is_none());
    }
}
