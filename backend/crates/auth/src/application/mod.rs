//! Application Layer
//!
//! `AuthService` and its use cases, the token codec, one-time links and
//! configuration.

pub mod account;
pub mod atomic;
pub mod change_password;
pub mod config;
pub mod create_user;
pub mod invite;
pub mod onboarding;
pub mod password_reset;
pub mod refresh;
pub mod register_admin;
pub mod service;
pub mod sign_in;
pub mod sign_out;
pub mod token_codec;

// Re-exports
pub use config::AuthConfig;
pub use create_user::{CreateUserInput, CreateUserOutput, IssuedLink};
pub use invite::{InviteTokenService, LinkPurpose};
pub use register_admin::RegisterAdminInput;
pub use service::{AuthService, TokenPair};
pub use sign_in::SignInOutput;
pub use token_codec::{AccessClaims, RefreshClaims, TokenCodec};
