//! Database models.

pub mod user;

pub use user::{UserCounts, UserDirectory, UserRow};
