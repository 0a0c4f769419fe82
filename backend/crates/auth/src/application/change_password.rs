//! Change Password Use Case
//!
//! Requires the current password. Every session is revoked afterwards, so
//! all devices must sign in again.

use chrono::Utc;

use crate::application::atomic::{Change, update_user};
use crate::application::service::AuthService;
use crate::domain::repository::UserStore;
use crate::domain::session_registry;
use crate::domain::value_object::{user_id::UserId, user_password::RawPassword};
use crate::error::{AuthError, AuthResult};

impl<S> AuthService<S>
where
    S: UserStore,
{
    pub async fn change_password(
        &self,
        user_id: &UserId,
        current_password: String,
        new_password: String,
    ) -> AuthResult<()> {
        let new_password = RawPassword::new(new_password)?;
        let current_password = RawPassword::candidate(current_password);

        let user = self.load(user_id).await?;

        let verified_digest = user.password.clone();
        if !self
            .verify_password(verified_digest.clone(), current_password)
            .await?
        {
            return Err(AuthError::WrongPassword);
        }

        let digest = self.hash_password(new_password).await?;

        let (user, revoked) = update_user(&*self.store, user, |u| {
            if u.password != verified_digest {
                return Err(AuthError::WrongPassword);
            }
            u.set_password(digest.clone(), Utc::now());
            Ok(Change::Write(session_registry::revoke_all(&mut u.sessions)))
        })
        .await?;

        tracing::info!(user_id = %user.id, revoked, "Password changed, sessions revoked");

        Ok(())
    }
}
