//! User model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// User entity
///
/// `photo` is either a stored profile picture name or, for accounts created
/// through Google sign-in, an absolute URL.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub photo: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub subscribers: i64,
    pub subscribed_to: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// New user creation payload
///
/// `password` is the plain-text password; it is hashed by the repository.
/// Federated accounts are created without one.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub photo: String,
    pub password: Option<String>,
}

/// User login credentials
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginCredentials {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Google sign-in payload
///
/// `credential` is the Google ID token; it is required when a Google client
/// id is configured, in which case the profile fields are taken from it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoogleLoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub credential: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub new_password: Option<String>,
}
