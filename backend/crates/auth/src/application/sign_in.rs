//! Sign In Use Case
//!
//! Password login with brute-force lockout. Unknown email and wrong
//! password are indistinguishable to the caller.

use chrono::Utc;

use crate::application::atomic::{Change, update_user};
use crate::application::service::{AuthService, TokenPair};
use crate::domain::entity::user::PublicUser;
use crate::domain::lockout::Admission;
use crate::domain::repository::UserStore;
use crate::domain::session_registry;
use crate::domain::value_object::{email::Email, user_password::RawPassword};
use crate::error::{AuthError, AuthResult};

#[derive(Debug)]
pub struct SignInOutput {
    pub tokens: TokenPair,
    pub user: PublicUser,
}

impl<S> AuthService<S>
where
    S: UserStore,
{
    pub async fn login(&self, email: &str, password: String) -> AuthResult<SignInOutput> {
        let unknown = || AuthError::InvalidCredentials {
            attempts_left: None,
        };

        // Never policy-checked: every presented password counts as an attempt
        let candidate = RawPassword::candidate(password);

        let email = Email::new(email).map_err(|_| unknown())?;
        let user = self
            .store
            .find_by_email(&email)
            .await?
            .ok_or_else(unknown)?;

        if !user.is_active {
            return Err(AuthError::AccountDisabled);
        }

        if !user.has_set_password {
            return Err(AuthError::PasswordNotSet);
        }

        if let Admission::Locked {
            minutes_remaining, ..
        } = user.lockout.check_admission(Utc::now())
        {
            return Err(AuthError::AccountLocked { minutes_remaining });
        }

        let verified_digest = user.password.clone();
        let (matches, upgraded) = self
            .verify_and_upgrade(verified_digest.clone(), candidate)
            .await?;

        if !matches {
            let (user, attempts_left) = update_user(&*self.store, user, |u| {
                let now = Utc::now();
                // Locked by a concurrent attempt meanwhile: leave the counter alone
                if let Admission::Locked {
                    minutes_remaining, ..
                } = u.lockout.check_admission(now)
                {
                    return Err(AuthError::AccountLocked { minutes_remaining });
                }
                u.lockout = u.lockout.record_failure(now);
                Ok(Change::Write(u.lockout.attempts_remaining()))
            })
            .await?;

            if attempts_left == 0 {
                tracing::warn!(user_id = %user.id, "Account locked after repeated failed logins");
            } else {
                tracing::warn!(user_id = %user.id, attempts_left, "Failed login attempt");
            }

            return Err(AuthError::InvalidCredentials {
                attempts_left: Some(attempts_left),
            });
        }

        let tokens = self.issue_pair(&user)?;

        let (user, ()) = update_user(&*self.store, user, |u| {
            // The password or account state moved under us
            if u.password != verified_digest {
                return Err(unknown());
            }
            if !u.is_active {
                return Err(AuthError::AccountDisabled);
            }

            let now = Utc::now();
            // Locked by concurrent failures since the first read
            if let Admission::Locked {
                minutes_remaining, ..
            } = u.lockout.check_admission(now)
            {
                return Err(AuthError::AccountLocked { minutes_remaining });
            }

            if let Some(upgraded) = &upgraded {
                u.password = Some(upgraded.clone());
            }
            u.lockout = u.lockout.record_success();
            u.last_login_at = Some(now);
            session_registry::register(
                &mut u.sessions,
                &tokens.refresh_token,
                now,
                tokens.refresh_expires_at,
            );
            Ok(Change::Write(()))
        })
        .await?;

        if upgraded.is_some() {
            tracing::info!(user_id = %user.id, "Password digest upgraded to current hash cost");
        }
        tracing::info!(user_id = %user.id, sessions = user.sessions.len(), "User signed in");

        Ok(SignInOutput {
            user: user.public(),
            tokens,
        })
    }
}
