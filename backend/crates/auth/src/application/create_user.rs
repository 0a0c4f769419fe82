//! Create User Use Case
//!
//! An admin creates a pending account and receives a one-time invite link
//! to deliver out of band.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::application::invite::LinkPurpose;
use crate::application::service::AuthService;
use crate::domain::entity::user::{NewUserProfile, PublicUser, User};
use crate::domain::repository::UserStore;
use crate::domain::value_object::{user_id::UserId, user_role::UserRole};
use crate::error::{AuthError, AuthResult};

pub struct CreateUserInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Defaults to `employee`
    pub role: Option<UserRole>,
}

/// Raw one-time link token, returned exactly once
#[derive(Clone)]
pub struct IssuedLink {
    pub token: String,
    pub link: String,
    pub expires_at: DateTime<Utc>,
}

// The link embeds the raw token, so neither is printed
impl fmt::Debug for IssuedLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedLink")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct CreateUserOutput {
    pub user: PublicUser,
    pub invite: IssuedLink,
}

impl<S> AuthService<S>
where
    S: UserStore,
{
    pub async fn create_user(
        &self,
        admin_id: &UserId,
        input: CreateUserInput,
    ) -> AuthResult<CreateUserOutput> {
        let admin = self.require_active_admin(admin_id).await?;
        let profile = NewUserProfile::new(&input.first_name, &input.last_name, &input.email)?;

        if self.store.exists_by_email(&profile.email).await? {
            return Err(AuthError::EmailTaken);
        }

        let now = Utc::now();
        let mut user = User::invited(profile, input.role.unwrap_or_default(), admin.id, now);
        let token = self.invites.issue(&mut user, LinkPurpose::Invite, now);

        self.store.create(&user).await?;

        tracing::info!(
            user_id = %user.id,
            created_by = %admin.id,
            role = %user.role,
            "User created with pending invite"
        );

        let invite = self.link_for(&user, LinkPurpose::Invite, token);
        Ok(CreateUserOutput {
            user: user.public(),
            invite,
        })
    }

    pub(crate) fn link_for(&self, user: &User, purpose: LinkPurpose, token: String) -> IssuedLink {
        let (path, pending) = match purpose {
            LinkPurpose::Invite => ("set-password", user.invite.as_ref()),
            LinkPurpose::PasswordReset => ("reset-password", user.password_reset.as_ref()),
        };

        IssuedLink {
            link: format!("{}/{}?token={}", self.config.frontend_url, path, token),
            expires_at: pending.map_or(user.updated_at, |p| p.expires_at),
            token,
        }
    }
}
