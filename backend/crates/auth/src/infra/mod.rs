//! Infrastructure Layer
//!
//! `UserStore` implementations.

pub mod memory;
pub mod postgres;

pub use memory::InMemoryUserStore;
pub use postgres::PgUserStore;
