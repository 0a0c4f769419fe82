//! In-Memory User Store
//!
//! Map-backed [`UserStore`] for tests and local runs. The lock is held only
//! for the duration of a single map operation; compare-and-swap is atomic
//! because the version check and the write happen under one write guard.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::entity::user::User;
use crate::domain::repository::UserStore;
use crate::domain::value_object::{email::Email, token_hash::TokenHash, user_id::UserId};
use crate::error::{AuthError, AuthResult};

#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }

    /// Overwrite a record without any version check. Test setup only.
    pub async fn put(&self, user: User) {
        self.users.write().await.insert(user.id, user);
    }

    async fn find_where<P>(&self, predicate: P) -> Option<User>
    where
        P: Fn(&User) -> bool,
    {
        self.users
            .read()
            .await
            .values()
            .find(|user| predicate(user))
            .cloned()
    }
}

impl UserStore for InMemoryUserStore {
    async fn create(&self, user: &User) -> AuthResult<()> {
        let mut users = self.users.write().await;

        if users.values().any(|u| u.email == user.email) {
            return Err(AuthError::EmailTaken);
        }

        if user.is_bootstrap_admin() && users.values().any(User::is_bootstrap_admin) {
            return Err(AuthError::AdminExists);
        }

        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> AuthResult<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        Ok(self.find_where(|u| &u.email == email).await)
    }

    async fn find_by_invite_hash(
        &self,
        hash: &TokenHash,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<User>> {
        Ok(self
            .find_where(|u| {
                u.invite
                    .as_ref()
                    .is_some_and(|p| &p.token_hash == hash && p.is_live(now))
            })
            .await)
    }

    async fn find_by_reset_hash(
        &self,
        hash: &TokenHash,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<User>> {
        Ok(self
            .find_where(|u| {
                u.password_reset
                    .as_ref()
                    .is_some_and(|p| &p.token_hash == hash && p.is_live(now))
            })
            .await)
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        Ok(self.find_where(|u| &u.email == email).await.is_some())
    }

    async fn admin_exists(&self) -> AuthResult<bool> {
        Ok(self.find_where(|u| u.role.is_admin()).await.is_some())
    }

    async fn compare_and_swap(&self, user: &User) -> AuthResult<bool> {
        let mut users = self.users.write().await;

        match users.get_mut(&user.id) {
            Some(stored) if stored.version == user.version => {
                let mut next = user.clone();
                next.version += 1;
                *stored = next;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
