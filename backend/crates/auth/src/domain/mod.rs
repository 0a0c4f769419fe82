//! Domain Layer
//!
//! Entities, value objects, the lockout and session state machines, and the
//! user store trait.

pub mod entity;
pub mod lockout;
pub mod repository;
pub mod session_registry;
pub mod value_object;

// Re-exports
pub use entity::{
    session::{SessionEntry, SessionInfo},
    user::{NewUserProfile, PendingToken, PublicUser, User},
};
pub use lockout::{Admission, LockoutState};
pub use repository::UserStore;
