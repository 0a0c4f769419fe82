//! Version-checked read-modify-write on a single user record.
//!
//! The decision closure runs against the freshest copy of the record. When
//! the write loses a race the record is re-read and the closure runs again,
//! so a decision is never applied to state it did not see.

use chrono::Utc;

use crate::domain::entity::user::User;
use crate::domain::repository::UserStore;
use crate::error::{AuthError, AuthResult};

pub const MAX_CAS_RETRIES: usize = 8;

/// Outcome of a decision over a user record
pub enum Change<T> {
    /// Persist the mutated record, then yield `T`
    Write(T),
    /// Nothing to persist
    Keep(T),
}

/// Apply `decide` to `user` and persist it with compare-and-swap.
///
/// Returns the record as persisted (version already bumped) with the
/// decision's output. A record deleted mid-loop gives `UserNotFound`.
pub async fn update_user<S, T, F>(store: &S, mut user: User, mut decide: F) -> AuthResult<(User, T)>
where
    S: UserStore,
    F: FnMut(&mut User) -> AuthResult<Change<T>>,
{
    for attempt in 1..=MAX_CAS_RETRIES {
        let output = match decide(&mut user)? {
            Change::Keep(output) => return Ok((user, output)),
            Change::Write(output) => output,
        };

        user.updated_at = Utc::now();
        if store.compare_and_swap(&user).await? {
            user.version += 1;
            return Ok((user, output));
        }

        tracing::debug!(user_id = %user.id, attempt, "Concurrent update detected, retrying");

        user = store
            .find_by_id(&user.id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
    }

    tracing::warn!(user_id = %user.id, "Gave up after repeated concurrent updates");
    Err(AuthError::ConcurrentModification)
}
