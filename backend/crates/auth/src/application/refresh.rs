//! Refresh Use Case
//!
//! Rotates a refresh token. Every token is good for exactly one rotation;
//! presenting one that was already rotated away revokes every session of
//! the user before failing.

use chrono::Utc;

use crate::application::atomic::{Change, update_user};
use crate::application::service::{AuthService, TokenPair};
use crate::domain::repository::UserStore;
use crate::domain::session_registry::{self, RotationOutcome};
use crate::error::{AuthError, AuthResult};

impl<S> AuthService<S>
where
    S: UserStore,
{
    pub async fn refresh_access_token(&self, raw_refresh: Option<&str>) -> AuthResult<TokenPair> {
        let raw_refresh = raw_refresh
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::TokenMissing)?;

        let claims = self.codec.verify_refresh(raw_refresh)?;

        let user = self
            .store
            .find_by_id(&claims.sub)
            .await?
            .ok_or(AuthError::UnknownSubject)?;

        if !user.is_active {
            return Err(AuthError::AccountDisabled);
        }

        let tokens = self.issue_pair(&user)?;

        let (user, outcome) = update_user(&*self.store, user, |u| {
            let outcome = session_registry::rotate(
                &mut u.sessions,
                raw_refresh,
                &tokens.refresh_token,
                Utc::now(),
                tokens.refresh_expires_at,
            );
            Ok(Change::Write(outcome))
        })
        .await
        .map_err(|e| match e {
            AuthError::UserNotFound => AuthError::UnknownSubject,
            other => other,
        })?;

        match outcome {
            RotationOutcome::Rotated => {
                tracing::debug!(user_id = %user.id, "Refresh token rotated");
                Ok(tokens)
            }
            RotationOutcome::ReuseDetected { revoked } => {
                tracing::warn!(
                    user_id = %user.id,
                    revoked,
                    "Refresh token reuse detected, all sessions revoked"
                );
                Err(AuthError::SessionInvalid)
            }
        }
    }
}
