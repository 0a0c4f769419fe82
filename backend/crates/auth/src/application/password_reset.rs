//! Password Reset Use Cases
//!
//! Token generation and consumption only. Delivering the link is up to the
//! caller.

use chrono::Utc;

use crate::application::atomic::{Change, update_user};
use crate::application::create_user::IssuedLink;
use crate::application::invite::LinkPurpose;
use crate::application::service::AuthService;
use crate::domain::repository::UserStore;
use crate::domain::session_registry;
use crate::domain::value_object::{email::Email, user_password::RawPassword};
use crate::error::{AuthError, AuthResult};

impl<S> AuthService<S>
where
    S: UserStore,
{
    /// `None` when there is no active account with a password behind
    /// `email`. Callers must answer both cases the same way.
    pub async fn request_password_reset(&self, email: &str) -> AuthResult<Option<IssuedLink>> {
        let email = Email::new(email)?;

        let user = match self.store.find_by_email(&email).await? {
            Some(user) if user.is_active && user.has_set_password => user,
            _ => {
                tracing::debug!("Password reset requested for unknown or ineligible account");
                return Ok(None);
            }
        };

        let (user, token) = update_user(&*self.store, user, |u| {
            Ok(Change::Write(self.invites.issue(
                u,
                LinkPurpose::PasswordReset,
                Utc::now(),
            )))
        })
        .await?;

        tracing::info!(user_id = %user.id, "Password reset token issued");

        Ok(Some(self.link_for(&user, LinkPurpose::PasswordReset, token)))
    }

    /// Consume a reset token. Clears the lockout and revokes every session.
    pub async fn reset_password(&self, raw_token: &str, new_password: String) -> AuthResult<()> {
        let new_password = RawPassword::new(new_password)?;
        let holder = self
            .invites
            .find_holder(&*self.store, LinkPurpose::PasswordReset, raw_token, Utc::now())
            .await?;

        let digest = self.hash_password(new_password).await?;

        let (user, revoked) = update_user(&*self.store, holder, |u| {
            if !u.is_active {
                return Err(AuthError::ResetTokenInvalidOrExpired);
            }
            self.invites.redeem(
                u,
                LinkPurpose::PasswordReset,
                raw_token,
                digest.clone(),
                Utc::now(),
            )?;
            u.lockout = u.lockout.record_success();
            Ok(Change::Write(session_registry::revoke_all(&mut u.sessions)))
        })
        .await
        .map_err(|e| match e {
            AuthError::UserNotFound => AuthError::ResetTokenInvalidOrExpired,
            other => other,
        })?;

        tracing::info!(user_id = %user.id, revoked, "Password reset, sessions revoked");

        Ok(())
    }
}
