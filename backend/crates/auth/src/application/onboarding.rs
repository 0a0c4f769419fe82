//! Onboarding Use Cases
//!
//! Redeeming an invite to set the first password, and re-issuing an invite
//! that was lost or expired.

use chrono::Utc;

use crate::application::atomic::{Change, update_user};
use crate::application::create_user::IssuedLink;
use crate::application::invite::LinkPurpose;
use crate::application::service::AuthService;
use crate::domain::entity::user::PublicUser;
use crate::domain::repository::UserStore;
use crate::domain::value_object::{user_id::UserId, user_password::RawPassword};
use crate::error::{AuthError, AuthResult};

impl<S> AuthService<S>
where
    S: UserStore,
{
    pub async fn set_password(&self, raw_token: &str, password: String) -> AuthResult<PublicUser> {
        let password = RawPassword::new(password)?;
        let holder = self
            .invites
            .find_holder(&*self.store, LinkPurpose::Invite, raw_token, Utc::now())
            .await?;

        let digest = self.hash_password(password).await?;

        let (user, ()) = update_user(&*self.store, holder, |u| {
            self.invites
                .redeem(u, LinkPurpose::Invite, raw_token, digest.clone(), Utc::now())?;
            Ok(Change::Write(()))
        })
        .await
        .map_err(|e| match e {
            AuthError::UserNotFound => AuthError::InviteInvalidOrExpired,
            other => other,
        })?;

        tracing::info!(user_id = %user.id, "Invite redeemed, password set");

        Ok(user.public())
    }

    /// Replace the invite of a user who has not set a password yet
    pub async fn reissue_invite(&self, admin_id: &UserId, user_id: &UserId) -> AuthResult<IssuedLink> {
        let admin = self.require_active_admin(admin_id).await?;
        let target = self.load(user_id).await?;

        let (user, token) = update_user(&*self.store, target, |u| {
            if u.has_set_password {
                return Err(AuthError::InvitationNotPending);
            }
            let token = self.invites.issue(u, LinkPurpose::Invite, Utc::now());
            Ok(Change::Write(token))
        })
        .await?;

        tracing::info!(user_id = %user.id, reissued_by = %admin.id, "Invite reissued");

        Ok(self.link_for(&user, LinkPurpose::Invite, token))
    }
}
