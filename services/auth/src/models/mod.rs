//! Authentication service models

pub mod user;

// Re-export for convenience
pub use user::{GoogleLoginRequest, LoginCredentials, NewUser, ResetPasswordRequest, User};
