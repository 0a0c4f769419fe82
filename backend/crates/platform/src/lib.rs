//! Platform Crate - Technical Infrastructure
//!
//! Shared technical foundations with no business meaning:
//! - Cryptographic utilities (SHA-256, secure random tokens, constant-time compare)
//! - Password hashing (Argon2id) and password policy
//! - Cookie management

pub mod cookie;
pub mod crypto;
pub mod password;
