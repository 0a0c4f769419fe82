//! Repository Traits
//!
//! Persistence interface for user records. Implementations live in the
//! infrastructure layer (`PgUserStore`, `InMemoryUserStore`).

use chrono::{DateTime, Utc};

use crate::domain::entity::user::User;
use crate::domain::value_object::{email::Email, token_hash::TokenHash, user_id::UserId};
use crate::error::AuthResult;

#[trait_variant::make(UserStore: Send)]
pub trait LocalUserStore {
    /// Insert a new record.
    ///
    /// Fails with `EmailTaken` on a duplicate email and with `AdminExists`
    /// when a second bootstrap admin is inserted. Both checks are atomic
    /// with the insert.
    async fn create(&self, user: &User) -> AuthResult<()>;

    async fn find_by_id(&self, id: &UserId) -> AuthResult<Option<User>>;

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    /// User whose outstanding invite matches `hash` and expires after `now`
    async fn find_by_invite_hash(
        &self,
        hash: &TokenHash,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<User>>;

    /// User whose outstanding reset link matches `hash` and expires after `now`
    async fn find_by_reset_hash(
        &self,
        hash: &TokenHash,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<User>>;

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool>;

    /// Whether any user holds the admin role
    async fn admin_exists(&self) -> AuthResult<bool>;

    /// Write every mutable field of `user` if the stored version still equals
    /// `user.version`, bumping it by one.
    ///
    /// Returns `false` when another writer got there first; nothing is
    /// written in that case.
    async fn compare_and_swap(&self, user: &User) -> AuthResult<bool>;
}
