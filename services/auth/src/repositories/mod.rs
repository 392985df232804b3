//! Repositories for database operations

pub mod user;

pub use user::{UserRepository, hash_password, is_unique_violation};
