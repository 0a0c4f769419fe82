//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, lockout policy, session registry, store trait
//! - `application/` - `AuthService` use cases, token codec, one-time links, config
//! - `infra/` - In-memory and PostgreSQL `UserStore` implementations
//! - `presentation/` - HTTP handlers, DTOs, router, bearer middleware
//!
//! ## Features
//! - One-time bootstrap of the first admin behind a shared secret
//! - Admin-created accounts onboarded through one-time invite links
//! - Email + password login with brute-force lockout
//! - Short-lived access tokens, rotating refresh tokens with reuse detection
//! - Password change and token-based password reset
//!
//! ## Security Model
//! - Passwords hashed with Argon2id (NIST SP 800-63B compliant)
//! - Refresh, invite and reset tokens stored only as SHA-256 digests
//! - At most 5 concurrent sessions per user, oldest evicted first
//! - Presenting a rotated refresh token revokes every session of the user
//! - Account locked for 30 minutes after 5 consecutive failed logins

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;


// Re-exports for convenience
pub use application::{AccessClaims, AuthConfig, AuthService, TokenPair};
pub use domain::repository::UserStore;
pub use error::{AuthError, AuthResult};
pub use infra::{InMemoryUserStore, PgUserStore};
pub use presentation::router::auth_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}
