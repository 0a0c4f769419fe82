//! Shared Kernel - Domain-crossing minimal core
//!
//! - Error classification ([`error::kind::ErrorKind`]) and the unified
//!   [`error::app_error::AppError`] rendered at the HTTP boundary
//! - Typed ID wrappers
//!
//! Only things with the same meaning in every crate belong here.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
