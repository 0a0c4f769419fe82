//! Auth Service
//!
//! Orchestrates the password hasher, token codec, lockout policy, session
//! registry and one-time links against an injected [`UserStore`]. Each use
//! case lives in its own module as an `impl` block on [`AuthService`].

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use platform::password::PasswordHasher;
use serde::Serialize;

use crate::application::config::AuthConfig;
use crate::application::invite::InviteTokenService;
use crate::application::token_codec::{IssuedToken, TokenCodec};
use crate::domain::entity::user::User;
use crate::domain::repository::UserStore;
use crate::domain::value_object::{
    user_id::UserId,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

/// Access token for the response body, refresh token for the cookie
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    #[serde(skip)]
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    #[serde(skip)]
    pub refresh_expires_at: DateTime<Utc>,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &self.access_token)
            .field("refresh_token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .field("refresh_expires_at", &self.refresh_expires_at)
            .finish()
    }
}

pub struct AuthService<S> {
    pub(crate) store: Arc<S>,
    pub(crate) config: Arc<AuthConfig>,
    pub(crate) hasher: Arc<PasswordHasher>,
    pub(crate) codec: TokenCodec,
    pub(crate) invites: InviteTokenService,
}

// Manual impl: derive would require `S: Clone`
impl<S> Clone for AuthService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: Arc::clone(&self.config),
            hasher: Arc::clone(&self.hasher),
            codec: self.codec.clone(),
            invites: self.invites.clone(),
        }
    }
}

impl<S> AuthService<S>
where
    S: UserStore,
{
    pub fn new(store: Arc<S>, config: Arc<AuthConfig>) -> AuthResult<Self> {
        let hasher = PasswordHasher::new(config.hash_cost, config.pepper().map(<[u8]>::to_vec))
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok(Self {
            codec: TokenCodec::new(&config)?,
            invites: InviteTokenService::new(&config)?,
            hasher: Arc::new(hasher),
            store,
            config,
        })
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub(crate) async fn load(&self, user_id: &UserId) -> AuthResult<User> {
        self.store
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// The acting user must exist, be active and hold the admin role
    pub(crate) async fn require_active_admin(&self, admin_id: &UserId) -> AuthResult<User> {
        match self.store.find_by_id(admin_id).await? {
            Some(admin) if admin.is_active && admin.role.is_admin() => Ok(admin),
            _ => Err(AuthError::InsufficientRole),
        }
    }

    /// Argon2 on the blocking pool
    pub(crate) async fn hash_password(&self, raw: RawPassword) -> AuthResult<UserPassword> {
        let hasher = Arc::clone(&self.hasher);
        let digest = tokio::task::spawn_blocking(move || UserPassword::hash(&hasher, &raw)).await??;
        Ok(digest)
    }

    /// Argon2 on the blocking pool. An absent digest never verifies.
    pub(crate) async fn verify_password(
        &self,
        digest: Option<UserPassword>,
        raw: RawPassword,
    ) -> AuthResult<bool> {
        let Some(digest) = digest else {
            return Ok(false);
        };
        let hasher = Arc::clone(&self.hasher);
        let matches = tokio::task::spawn_blocking(move || digest.verify(&hasher, &raw)).await?;
        Ok(matches)
    }

    /// Verify on the blocking pool and, on a match against a digest made
    /// under an outdated cost, hash the same input again with the current one
    pub(crate) async fn verify_and_upgrade(
        &self,
        digest: Option<UserPassword>,
        raw: RawPassword,
    ) -> AuthResult<(bool, Option<UserPassword>)> {
        let Some(digest) = digest else {
            return Ok((false, None));
        };
        let hasher = Arc::clone(&self.hasher);
        let outcome = tokio::task::spawn_blocking(move || {
            if !digest.verify(&hasher, &raw) {
                return Ok((false, None));
            }
            if !digest.needs_rehash(&hasher) {
                return Ok((true, None));
            }
            UserPassword::hash(&hasher, &raw).map(|upgraded| (true, Some(upgraded)))
        })
        .await??;
        Ok(outcome)
    }

    /// Sign a fresh access/refresh pair for `user`
    pub(crate) fn issue_pair(&self, user: &User) -> AuthResult<TokenPair> {
        let access = self.codec.issue_access(user.id, user.role, &user.email)?;
        let IssuedToken {
            token: refresh_token,
            expires_at: refresh_expires_at,
        } = self.codec.issue_refresh(user.id)?;

        Ok(TokenPair {
            access_token: access.token,
            refresh_token,
            expires_in: self.codec.access_ttl().num_seconds(),
            refresh_expires_at,
        })
    }
}
