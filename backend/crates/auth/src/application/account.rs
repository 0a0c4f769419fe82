//! Account Use Cases
//!
//! Profile lookup, session listing, deactivation and access-token checks.

use chrono::Utc;

use crate::application::atomic::{Change, update_user};
use crate::application::service::AuthService;
use crate::application::token_codec::AccessClaims;
use crate::domain::entity::{session::SessionInfo, user::PublicUser};
use crate::domain::repository::UserStore;
use crate::domain::session_registry;
use crate::domain::value_object::{user_id::UserId, user_role::UserRole};
use crate::error::{AuthError, AuthResult};

impl<S> AuthService<S>
where
    S: UserStore,
{
    pub async fn current_user(&self, user_id: &UserId) -> AuthResult<PublicUser> {
        Ok(self.load(user_id).await?.public())
    }

    /// Live sessions, oldest first. `current_refresh` marks the caller's own.
    pub async fn list_sessions(
        &self,
        user_id: &UserId,
        current_refresh: Option<&str>,
    ) -> AuthResult<Vec<SessionInfo>> {
        let user = self.load(user_id).await?;
        Ok(session_registry::list(&user.sessions, current_refresh, Utc::now()))
    }

    /// Disable sign-in for `user_id` and revoke every session it holds
    pub async fn deactivate_user(
        &self,
        admin_id: &UserId,
        user_id: &UserId,
    ) -> AuthResult<PublicUser> {
        if admin_id == user_id {
            return Err(AuthError::SelfDeactivation);
        }

        let admin = self.require_active_admin(admin_id).await?;
        let target = self.load(user_id).await?;

        let (user, revoked) = update_user(&*self.store, target, |u| {
            if !u.is_active && u.sessions.is_empty() {
                return Ok(Change::Keep(0));
            }
            u.is_active = false;
            Ok(Change::Write(session_registry::revoke_all(&mut u.sessions)))
        })
        .await?;

        tracing::info!(
            user_id = %user.id,
            deactivated_by = %admin.id,
            revoked,
            "User deactivated"
        );

        Ok(user.public())
    }

    /// Verify a bearer access token. Stateless: no store lookup.
    pub fn authenticate(&self, access_token: &str) -> AuthResult<AccessClaims> {
        if access_token.is_empty() {
            return Err(AuthError::TokenMissing);
        }
        self.codec.verify_access(access_token)
    }

    pub fn require_role(&self, claims: &AccessClaims, allowed: &[UserRole]) -> AuthResult<()> {
        if allowed.contains(&claims.role) {
            Ok(())
        } else {
            tracing::debug!(user_id = %claims.sub, role = %claims.role, "Role check failed");
            Err(AuthError::InsufficientRole)
        }
    }
}
