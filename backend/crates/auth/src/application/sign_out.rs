//! Sign Out Use Case

use crate::application::atomic::{Change, update_user};
use crate::application::service::AuthService;
use crate::domain::repository::UserStore;
use crate::domain::session_registry;
use crate::domain::value_object::user_id::UserId;
use crate::error::AuthResult;

impl<S> AuthService<S>
where
    S: UserStore,
{
    /// Revoke the session behind `raw_refresh`. Absent token, unknown
    /// session and vanished user are all no-ops.
    pub async fn logout(&self, user_id: &UserId, raw_refresh: Option<&str>) -> AuthResult<()> {
        let Some(raw_refresh) = raw_refresh.filter(|token| !token.is_empty()) else {
            return Ok(());
        };

        let Some(user) = self.store.find_by_id(user_id).await? else {
            return Ok(());
        };

        let (user, revoked) = update_user(&*self.store, user, |u| {
            Ok(if session_registry::revoke_one(&mut u.sessions, raw_refresh) {
                Change::Write(true)
            } else {
                Change::Keep(false)
            })
        })
        .await?;

        tracing::info!(user_id = %user.id, revoked, "User signed out");

        Ok(())
    }
}
