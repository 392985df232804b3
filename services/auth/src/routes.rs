//! Authentication routes

use axum::{
    Extension, Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, post},
};
use common::{ApiError, ApiJson, ApiResult};
use media::{MediaKind, MediaStore, StoredFile, UploadError, storage::DEFAULT_PROFILE_PICTURE};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    AuthState,
    middleware::{AuthUser, auth_middleware},
    models::{GoogleLoginRequest, LoginCredentials, NewUser, ResetPasswordRequest, User},
    repositories::is_unique_violation,
    validation::{normalize_email, validate_email, validate_name, validate_password},
};

/// Body limit for signup requests, which may carry a profile picture
const SIGNUP_BODY_LIMIT: usize = 10 * 1024 * 1024;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub message: String,
    pub profile_pic: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user_id: Uuid,
    pub profile_pic: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleLoginResponse {
    pub message: String,
    pub token: String,
    pub user_id: Uuid,
}

/// Create the router for the authentication endpoints
pub fn create_router(state: AuthState) -> Router {
    Router::new()
        .route("/api/user", get(current_user))
        .route("/api/reset-password", post(reset_password))
        .route_layer(from_fn_with_state(
            state.jwt_service.clone(),
            auth_middleware,
        ))
        .route(
            "/api/signup",
            post(signup).layer(DefaultBodyLimit::max(SIGNUP_BODY_LIMIT)),
        )
        .route("/api/login", post(login))
        .route("/api/google-login", post(google_login))
        .with_state(state)
}

/// Fields collected from the signup form
#[derive(Default)]
struct SignupForm {
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
    picture: Option<StoredFile>,
}

impl SignupForm {
    async fn read(&mut self, media: &MediaStore, multipart: &mut Multipart) -> Result<(), UploadError> {
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "name" => self.name = Some(field.text().await?),
                "email" => self.email = Some(field.text().await?),
                "password" => self.password = Some(field.text().await?),
                // Browsers send an empty part when no file was chosen
                "profilePic" if self.picture.is_none() && field.file_name().is_some_and(|f| !f.is_empty()) => {
                    self.picture = Some(media.persist_field(MediaKind::ProfilePicture, field).await?);
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Drop a picture that will not be attached to an account
    async fn discard_picture(&self, media: &MediaStore) {
        if let Some(picture) = &self.picture {
            if let Err(e) = media.remove(picture.kind, &picture.file_name).await {
                error!("Failed to remove unused profile picture {}: {}", picture.file_name, e);
            }
        }
    }
}

/// Register a new account from a multipart form
pub async fn signup(
    State(state): State<AuthState>,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let mut form = SignupForm::default();
    let result = match form.read(&state.media, &mut multipart).await {
        Ok(()) => register(&state, &form).await,
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(response) => Ok((StatusCode::CREATED, Json(response))),
        Err(e) => {
            form.discard_picture(&state.media).await;
            Err(e)
        }
    }
}

async fn register(state: &AuthState, form: &SignupForm) -> ApiResult<SignupResponse> {
    let (Some(name), Some(email), Some(password)) = (
        form.name.as_deref(),
        form.email.as_deref(),
        form.password.as_deref(),
    ) else {
        return Err(ApiError::bad_request("All fields are required"));
    };

    let name = name.trim();
    let email = normalize_email(email);
    validate_name(name).map_err(ApiError::BadRequest)?;
    validate_email(&email).map_err(ApiError::BadRequest)?;
    validate_password(password).map_err(ApiError::BadRequest)?;

    if state.users.find_by_email(&email).await?.is_some() {
        return Err(ApiError::bad_request("User already exists"));
    }

    let photo = form
        .picture
        .as_ref()
        .map(|p| p.file_name.clone())
        .unwrap_or_else(|| DEFAULT_PROFILE_PICTURE.to_string());

    let new_user = NewUser {
        email,
        name: name.to_string(),
        photo,
        password: Some(password.to_string()),
    };

    let user = match state.users.create(&new_user).await {
        Ok(user) => user,
        Err(e) if is_unique_violation(&e) => {
            return Err(ApiError::bad_request("User already exists"));
        }
        Err(e) => return Err(e.into()),
    };

    info!("User registered: {}", user.id);
    Ok(SignupResponse {
        message: "User registered successfully".to_string(),
        profile_pic: MediaStore::photo_url(&state.public_url, &user.photo),
    })
}

/// Password login
pub async fn login(
    State(state): State<AuthState>,
    ApiJson(credentials): ApiJson<LoginCredentials>,
) -> ApiResult<Json<LoginResponse>> {
    let (Some(email), Some(password)) = (credentials.email, credentials.password) else {
        return Err(ApiError::bad_request("All fields are required"));
    };
    if email.trim().is_empty() || password.is_empty() {
        return Err(ApiError::bad_request("All fields are required"));
    }

    let email = normalize_email(&email);
    info!("Login attempt for user: {}", email);

    let Some(user) = state.users.find_by_email(&email).await? else {
        return Err(ApiError::bad_request("Invalid credentials"));
    };

    if !state.users.verify_password(&user, &password)? {
        warn!("Rejected login for user: {}", user.id);
        return Err(ApiError::bad_request("Invalid credentials"));
    }

    let token = state.jwt_service.generate_token(&user)?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
        user_id: user.id,
        profile_pic: MediaStore::photo_url(&state.public_url, &user.photo),
    }))
}

/// Sign in with a Google account, creating the account on first use
pub async fn google_login(
    State(state): State<AuthState>,
    ApiJson(payload): ApiJson<GoogleLoginRequest>,
) -> ApiResult<Json<GoogleLoginResponse>> {
    let (email, name, photo) = if state.google.is_enforced() {
        let credential = payload
            .credential
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ApiError::bad_request("Google credential is required"))?;

        let identity = state
            .google
            .verify_id_token(&credential)
            .await
            .map_err(|e| {
                warn!("Google credential rejected: {}", e);
                ApiError::bad_request("Invalid Google credential")
            })?;
        (identity.email, identity.name, identity.picture)
    } else {
        let email = payload
            .email
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| ApiError::bad_request("Email is required"))?;
        (email, payload.name, payload.photo)
    };

    let email = normalize_email(&email);
    validate_email(&email).map_err(ApiError::BadRequest)?;

    let name = name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());
    let photo = photo
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| DEFAULT_PROFILE_PICTURE.to_string());

    let user = state
        .users
        .find_or_create_federated(&email, &name, &photo)
        .await?;
    let token = state.jwt_service.generate_token(&user)?;

    info!("Google sign-in for user: {}", user.id);
    Ok(Json(GoogleLoginResponse {
        message: "Google sign-in successful".to_string(),
        token,
        user_id: user.id,
    }))
}

/// Profile of the authenticated user
pub async fn current_user(
    State(state): State<AuthState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<User>> {
    let user = state
        .users
        .find_by_id(auth.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(user))
}

/// Replace the authenticated user's password
pub async fn reset_password(
    State(state): State<AuthState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(payload): ApiJson<ResetPasswordRequest>,
) -> ApiResult<impl IntoResponse> {
    let new_password = payload
        .new_password
        .ok_or_else(|| ApiError::bad_request("New password is required"))?;
    validate_password(&new_password).map_err(ApiError::BadRequest)?;

    if !state.users.update_password(auth.id, &new_password).await? {
        return Err(ApiError::not_found("User not found"));
    }

    info!("Password reset for user: {}", auth.id);
    Ok(Json(serde_json::json!({
        "message": "Password updated successfully"
    })))
}
