//! User Password Value Objects
//!
//! Domain wrappers around `platform::password`:
//! - [`RawPassword`]: user input, zeroized on drop, never `Clone`
//! - [`UserPassword`]: Argon2id PHC digest, the only form ever persisted
//!
//! ```rust,ignore
//! let hasher = PasswordHasher::new(HashCost::default(), None)?;
//! let raw = RawPassword::new("Quiet-Harbor-42".to_string())?;
//! let stored = UserPassword::hash(&hasher, &raw)?;
//! assert!(stored.verify(&hasher, &raw));
//! ```

use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};
use platform::password::{
    ClearTextPassword, HashedPassword, PasswordHashError, PasswordHasher, PasswordPolicyError,
};
use std::fmt;

// ============================================================================
// Raw Password (User Input)
// ============================================================================

pub struct RawPassword(ClearTextPassword);

impl RawPassword {
    /// A password about to be stored. The password policy applies:
    /// 8 to 128 characters after NFKC, no control characters, not a
    /// trivially common pattern.
    pub fn new(raw: String) -> AppResult<Self> {
        let clear_text = ClearTextPassword::new(raw).map_err(|e| match e {
            PasswordPolicyError::TooShort { min, actual } => AppError::bad_request(format!(
                "Password must be at least {} characters (got {})",
                min, actual
            ))
            .with_action("Please choose a longer password"),

            PasswordPolicyError::TooLong { max, actual } => AppError::bad_request(format!(
                "Password must be at most {} characters (got {})",
                max, actual
            ))
            .with_action("Please choose a shorter password"),

            PasswordPolicyError::EmptyOrWhitespace => {
                AppError::bad_request("Password cannot be empty")
                    .with_action("Please enter a password")
            }

            PasswordPolicyError::InvalidCharacter => {
                AppError::bad_request("Password contains invalid characters")
                    .with_action("Please remove any special control characters")
            }

            PasswordPolicyError::CommonPattern => {
                AppError::bad_request("Password is too common or follows a predictable pattern")
                    .with_action("Please choose a more unique password")
            }
        })?;

        Ok(Self(clear_text))
    }

    /// A password presented for checking (login, current password).
    /// Never rejected up front: it must reach the hash comparison.
    pub fn candidate(raw: String) -> Self {
        Self(ClearTextPassword::candidate(raw))
    }

    pub(crate) fn inner(&self) -> &ClearTextPassword {
        &self.0
    }
}

impl fmt::Debug for RawPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawPassword").field(&"[REDACTED]").finish()
    }
}

// ============================================================================
// User Password (Hashed, for storage)
// ============================================================================

#[derive(Clone, PartialEq, Eq)]
pub struct UserPassword(HashedPassword);

impl UserPassword {
    /// Salted one-way hash. CPU-bound: call from a blocking thread.
    pub fn hash(hasher: &PasswordHasher, raw: &RawPassword) -> AppResult<Self> {
        let hashed = hasher.hash(raw.inner()).map_err(|e| match e {
            PasswordHashError::HashingFailed(msg) => {
                AppError::internal(format!("Password hashing failed: {}", msg))
            }
            _ => AppError::internal("Unexpected error during password hashing"),
        })?;

        Ok(Self(hashed))
    }

    pub fn from_phc_string(phc_string: impl Into<String>) -> AppResult<Self> {
        let hashed = HashedPassword::from_phc_string(phc_string).map_err(|_| {
            AppError::new(
                ErrorKind::InternalServerError,
                "Invalid password hash in database",
            )
        })?;

        Ok(Self(hashed))
    }

    pub fn as_phc_string(&self) -> &str {
        self.0.as_phc_string()
    }

    /// Constant-time verification. CPU-bound: call from a blocking thread.
    pub fn verify(&self, hasher: &PasswordHasher, raw: &RawPassword) -> bool {
        hasher.verify(raw.inner(), self.0.as_phc_string())
    }

    pub fn needs_rehash(&self, hasher: &PasswordHasher) -> bool {
        hasher.needs_rehash(&self.0)
    }
}

impl fmt::Debug for UserPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::password::{HashCost, MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(HashCost::minimal(), None).unwrap()
    }

    #[test]
    fn test_raw_password_policy() {
        assert!(RawPassword::new("Quiet-Harbor-42".to_string()).is_ok());
        assert!(RawPassword::new("a1".repeat(MIN_PASSWORD_LENGTH / 2 - 1) + "!").is_err());
        assert!(RawPassword::new("xY3!".repeat(MAX_PASSWORD_LENGTH / 4 + 1)).is_err());
        assert!(RawPassword::new("password123".to_string()).is_err());
        assert!(RawPassword::new("".to_string()).is_err());
    }

    #[test]
    fn test_candidate_skips_policy() {
        let hasher = hasher();
        let stored = UserPassword::hash(&hasher, &RawPassword::new("Quiet-Harbor-42".into()).unwrap())
            .unwrap();

        // Short candidates are still verified, and simply fail
        assert!(!stored.verify(&hasher, &RawPassword::candidate("Wrong1!".into())));
        assert!(stored.verify(&hasher, &RawPassword::candidate("Quiet-Harbor-42".into())));
    }

    #[test]
    fn test_hash_is_salted() {
        let hasher = hasher();
        let raw = RawPassword::new("Quiet-Harbor-42".to_string()).unwrap();
        let a = UserPassword::hash(&hasher, &raw).unwrap();
        let b = UserPassword::hash(&hasher, &raw).unwrap();
        assert_ne!(a, b);
        assert!(a.verify(&hasher, &raw));
        assert!(b.verify(&hasher, &raw));
    }

    #[test]
    fn test_phc_string_round_trip() {
        let hasher = hasher();
        let raw = RawPassword::new("Quiet-Harbor-42".to_string()).unwrap();
        let stored = UserPassword::hash(&hasher, &raw).unwrap();

        let restored = UserPassword::from_phc_string(stored.as_phc_string()).unwrap();
        assert!(restored.verify(&hasher, &raw));
        assert!(!restored.needs_rehash(&hasher));
        assert!(UserPassword::from_phc_string("not-a-hash").is_err());
    }

    #[test]
    fn test_debug_redaction() {
        let raw = RawPassword::new("Secret-Harbor-42".to_string()).unwrap();
        let debug = format!("{:?}", raw);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("Secret"));
    }
}
