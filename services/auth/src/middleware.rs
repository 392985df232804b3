//! Middleware for JWT token validation and authentication

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use common::ApiError;
use tracing::debug;
use uuid::Uuid;

use crate::jwt::JwtService;

/// Authenticated caller, available to handlers behind [`auth_middleware`]
/// as an `Extension<AuthUser>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
}

/// Extract and validate the bearer token from the Authorization header.
///
/// A missing header is `401`; a header that is not a valid bearer token is
/// `400 Invalid token`.
pub async fn auth_middleware(
    State(jwt_service): State<JwtService>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let header = req
        .headers()
        .typed_try_get::<Authorization<Bearer>>()
        .map_err(|_| ApiError::InvalidToken)?
        .ok_or(ApiError::Unauthorized)?;

    let claims = jwt_service.validate_token(header.token()).map_err(|e| {
        debug!("Failed to validate token: {}", e);
        ApiError::InvalidToken
    })?;

    // Add user ID to request extensions for use in handlers
    req.extensions_mut().insert(AuthUser { id: claims.sub });

    Ok(next.run(req).await)
}
