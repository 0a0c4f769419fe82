//! PostgreSQL User Store
//!
//! One row per user. The session list is a JSONB array; every write goes
//! through a `version` check so that read-modify-write on a user is atomic.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::domain::entity::session::SessionEntry;
use crate::domain::entity::user::{PendingToken, User};
use crate::domain::lockout::LockoutState;
use crate::domain::repository::UserStore;
use crate::domain::value_object::{
    email::Email, person_name::PersonName, token_hash::TokenHash, user_id::UserId,
    user_password::UserPassword, user_role::UserRole,
};
use crate::error::{AuthError, AuthResult};

const EMAIL_UNIQUE_CONSTRAINT: &str = "users_email_key";
const BOOTSTRAP_ADMIN_CONSTRAINT: &str = "users_single_bootstrap_admin";

const USER_COLUMNS: &str = r#"
    id,
    first_name,
    last_name,
    email,
    password_hash,
    role,
    is_active,
    has_set_password,
    invite_token_hash,
    invite_token_expires_at,
    reset_token_hash,
    reset_token_expires_at,
    sessions,
    login_attempts,
    lock_until,
    password_changed_at,
    last_login_at,
    created_by,
    created_at,
    updated_at,
    version
"#;

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map unique violations onto the domain conflicts they stand for
fn map_insert_error(err: sqlx::Error) -> AuthError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.constraint() {
            Some(EMAIL_UNIQUE_CONSTRAINT) => return AuthError::EmailTaken,
            Some(BOOTSTRAP_ADMIN_CONSTRAINT) => return AuthError::AdminExists,
            _ => {}
        }
    }
    AuthError::Database(err)
}

fn split_pending(pending: Option<&PendingToken>) -> (Option<&str>, Option<DateTime<Utc>>) {
    match pending {
        Some(p) => (Some(p.token_hash.as_str()), Some(p.expires_at)),
        None => (None, None),
    }
}

impl UserStore for PgUserStore {
    async fn create(&self, user: &User) -> AuthResult<()> {
        let (invite_hash, invite_expiry) = split_pending(user.invite.as_ref());
        let (reset_hash, reset_expiry) = split_pending(user.password_reset.as_ref());

        sqlx::query(
            r#"
            INSERT INTO users (
                id,
                first_name,
                last_name,
                email,
                password_hash,
                role,
                is_active,
                has_set_password,
                invite_token_hash,
                invite_token_expires_at,
                reset_token_hash,
                reset_token_expires_at,
                sessions,
                login_attempts,
                lock_until,
                password_changed_at,
                last_login_at,
                created_by,
                created_at,
                updated_at,
                version
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                $12, $13, $14, $15, $16, $17, $18, $19, $20, $21
            )
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(user.first_name.as_str())
        .bind(user.last_name.as_str())
        .bind(user.email.as_str())
        .bind(user.password.as_ref().map(UserPassword::as_phc_string))
        .bind(user.role.code())
        .bind(user.is_active)
        .bind(user.has_set_password)
        .bind(invite_hash)
        .bind(invite_expiry)
        .bind(reset_hash)
        .bind(reset_expiry)
        .bind(Json(&user.sessions))
        .bind(user.lockout.attempts as i32)
        .bind(user.lockout.lock_until)
        .bind(user.password_changed_at)
        .bind(user.last_login_at)
        .bind(user.created_by.map(UserId::into_uuid))
        .bind(user.created_at)
        .bind(user.updated_at)
        .bind(user.version)
        .execute(&self.pool)
        .await
        .map_err(map_insert_error)?;

        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> AuthResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn find_by_invite_hash(
        &self,
        hash: &TokenHash,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE invite_token_hash = $1 AND invite_token_expires_at > $2"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(hash.as_str())
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn find_by_reset_hash(
        &self,
        hash: &TokenHash,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE reset_token_hash = $1 AND reset_token_expires_at > $2"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(hash.as_str())
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn admin_exists(&self) -> AuthResult<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE role = $1)")
                .bind(UserRole::Admin.code())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn compare_and_swap(&self, user: &User) -> AuthResult<bool> {
        let (invite_hash, invite_expiry) = split_pending(user.invite.as_ref());
        let (reset_hash, reset_expiry) = split_pending(user.password_reset.as_ref());

        let updated = sqlx::query(
            r#"
            UPDATE users SET
                first_name = $3,
                last_name = $4,
                password_hash = $5,
                role = $6,
                is_active = $7,
                has_set_password = $8,
                invite_token_hash = $9,
                invite_token_expires_at = $10,
                reset_token_hash = $11,
                reset_token_expires_at = $12,
                sessions = $13,
                login_attempts = $14,
                lock_until = $15,
                password_changed_at = $16,
                last_login_at = $17,
                updated_at = $18,
                version = version + 1
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(user.version)
        .bind(user.first_name.as_str())
        .bind(user.last_name.as_str())
        .bind(user.password.as_ref().map(UserPassword::as_phc_string))
        .bind(user.role.code())
        .bind(user.is_active)
        .bind(user.has_set_password)
        .bind(invite_hash)
        .bind(invite_expiry)
        .bind(reset_hash)
        .bind(reset_expiry)
        .bind(Json(&user.sessions))
        .bind(user.lockout.attempts as i32)
        .bind(user.lockout.lock_until)
        .bind(user.password_changed_at)
        .bind(user.last_login_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated == 1)
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    password_hash: Option<String>,
    role: String,
    is_active: bool,
    has_set_password: bool,
    invite_token_hash: Option<String>,
    invite_token_expires_at: Option<DateTime<Utc>>,
    reset_token_hash: Option<String>,
    reset_token_expires_at: Option<DateTime<Utc>>,
    sessions: Json<Vec<SessionEntry>>,
    login_attempts: i32,
    lock_until: Option<DateTime<Utc>>,
    password_changed_at: Option<DateTime<Utc>>,
    last_login_at: Option<DateTime<Utc>>,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
}

fn join_pending(
    field: &str,
    hash: Option<String>,
    expires_at: Option<DateTime<Utc>>,
) -> AuthResult<Option<PendingToken>> {
    match (hash, expires_at) {
        (Some(hash), Some(expires_at)) => Ok(Some(PendingToken {
            token_hash: TokenHash::from_db(hash),
            expires_at,
        })),
        (None, None) => Ok(None),
        _ => Err(AuthError::Internal(format!(
            "Half-present {} token in database",
            field
        ))),
    }
}

impl UserRow {
    fn into_user(self) -> AuthResult<User> {
        let role = UserRole::from_code(&self.role)
            .ok_or_else(|| AuthError::Internal(format!("Invalid role: {}", self.role)))?;

        let password = self
            .password_hash
            .map(UserPassword::from_phc_string)
            .transpose()
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok(User {
            id: UserId::from_uuid(self.id),
            first_name: PersonName::from_db(self.first_name),
            last_name: PersonName::from_db(self.last_name),
            email: Email::from_db(self.email),
            password,
            role,
            is_active: self.is_active,
            has_set_password: self.has_set_password,
            invite: join_pending("invite", self.invite_token_hash, self.invite_token_expires_at)?,
            password_reset: join_pending(
                "reset",
                self.reset_token_hash,
                self.reset_token_expires_at,
            )?,
            sessions: self.sessions.0,
            lockout: LockoutState {
                attempts: self.login_attempts.max(0) as u32,
                lock_until: self.lock_until,
            },
            password_changed_at: self.password_changed_at,
            last_login_at: self.last_login_at,
            created_by: self.created_by.map(UserId::from_uuid),
            created_at: self.created_at,
            updated_at: self.updated_at,
            version: self.version,
        })
    }
}
