//! Register Admin Use Case
//!
//! One-time bootstrap of the first administrator, gated by a shared secret.

use chrono::Utc;
use platform::crypto::secret_eq;

use crate::application::service::AuthService;
use crate::domain::entity::user::{NewUserProfile, PublicUser, User};
use crate::domain::repository::UserStore;
use crate::domain::value_object::user_password::RawPassword;
use crate::error::{AuthError, AuthResult};

pub struct RegisterAdminInput {
    pub secret: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl<S> AuthService<S>
where
    S: UserStore,
{
    pub async fn register_admin(&self, input: RegisterAdminInput) -> AuthResult<PublicUser> {
        if !secret_eq(
            input.secret.as_bytes(),
            self.config.bootstrap_secret.as_bytes(),
        ) {
            return Err(AuthError::BootstrapSecretMismatch);
        }

        let profile = NewUserProfile::new(&input.first_name, &input.last_name, &input.email)?;
        let password = RawPassword::new(input.password)?;

        if self.store.admin_exists().await? {
            return Err(AuthError::AdminExists);
        }

        if self.store.exists_by_email(&profile.email).await? {
            return Err(AuthError::EmailTaken);
        }

        let digest = self.hash_password(password).await?;
        let user = User::bootstrap_admin(profile, digest, Utc::now());

        // Racing bootstraps are settled by the store's uniqueness checks
        self.store.create(&user).await?;

        tracing::info!(user_id = %user.id, "Bootstrap admin registered");

        Ok(user.public())
    }
}
