//! Account management for the NewTube backend
//!
//! Local accounts sign in with an argon2-hashed password, federated accounts
//! through Google. Both receive an HS256 JWT that [`middleware::auth_middleware`]
//! checks on protected routes.

pub mod jwt;
pub mod middleware;
pub mod models;
pub mod oauth;
pub mod repositories;
pub mod routes;
pub mod validation;

use media::MediaStore;

pub use jwt::{JwtConfig, JwtService};
pub use middleware::{AuthUser, auth_middleware};
pub use oauth::{GoogleConfig, GoogleVerifier};
pub use repositories::UserRepository;
pub use routes::create_router;

/// State shared by the authentication handlers
#[derive(Clone)]
pub struct AuthState {
    pub users: UserRepository,
    pub jwt_service: JwtService,
    pub google: GoogleVerifier,
    pub media: MediaStore,
    /// Base URL used when building public links to stored pictures
    pub public_url: String,
}
