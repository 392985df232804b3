//! Application state shared across handlers

use auth::{AuthState, GoogleVerifier, JwtService, UserRepository};
use common::{ApiError, ApiResult};
use media::{MediaStore, MetadataExtractor};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    repositories::{SubscriptionRepository, VideoRepository},
    settings::Settings,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub users: UserRepository,
    pub videos: VideoRepository,
    pub subscriptions: SubscriptionRepository,
    pub jwt_service: JwtService,
    pub google: GoogleVerifier,
    pub media: MediaStore,
    pub probe: MetadataExtractor,
    pub public_url: String,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        db_pool: PgPool,
        settings: &Settings,
        jwt_service: JwtService,
        google: GoogleVerifier,
    ) -> Self {
        Self {
            users: UserRepository::new(db_pool.clone()),
            videos: VideoRepository::new(db_pool.clone()),
            subscriptions: SubscriptionRepository::new(db_pool),
            jwt_service,
            google,
            media: MediaStore::new(settings.upload_dir.clone()),
            probe: MetadataExtractor::new(settings.ffprobe_path.clone()),
            public_url: settings.public_url(),
            max_upload_bytes: settings.max_upload_bytes,
        }
    }

    /// Resolve a token subject to an existing account before acting on its behalf.
    ///
    /// Accounts are never deleted, so a positive answer stays valid for the
    /// rest of the request.
    pub async fn require_account(&self, id: Uuid) -> ApiResult<()> {
        if self.users.exists(id).await? {
            Ok(())
        } else {
            Err(ApiError::not_found("User not found"))
        }
    }

    /// State for the authentication router
    pub fn auth_state(&self) -> AuthState {
        AuthState {
            users: self.users.clone(),
            jwt_service: self.jwt_service.clone(),
            google: self.google.clone(),
            media: self.media.clone(),
            public_url: self.public_url.clone(),
        }
    }
}
