//! Channel subscriptions and public profiles

use auth::{AuthUser, models::User};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use common::{ApiError, ApiResult};
use media::MediaStore;

use crate::{
    models::{
        parse_id,
        subscription::{ChannelSummary, SubscribeResponse, SubscriptionStatus},
    },
    state::AppState,
};

/// Subscribe the authenticated user to channel `id`, or unsubscribe
pub async fn subscribe(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<SubscribeResponse>> {
    let channel = parse_id(&id, "Invalid user ID")?;
    if channel == user.id {
        return Err(ApiError::bad_request(
            "You cannot subscribe to your own channel.",
        ));
    }

    let change = state
        .subscriptions
        .toggle(user.id, channel)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(change.into()))
}

pub async fn is_subscribed(
    State(state): State<AppState>,
    Path((user_id, uploader_id)): Path<(String, String)>,
) -> ApiResult<Json<SubscriptionStatus>> {
    let user = parse_id(&user_id, "Invalid user ID")?;
    let channel = parse_id(&uploader_id, "Invalid user ID")?;

    let is_subscribed = state
        .subscriptions
        .is_subscribed(user, channel)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(SubscriptionStatus { is_subscribed }))
}

/// Channels a user follows, with absolute photo URLs
pub async fn subscriptions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<ChannelSummary>>> {
    let id = parse_id(&id, "Invalid user ID")?;

    let channels = state
        .subscriptions
        .subscriptions(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?
        .into_iter()
        .map(|channel| ChannelSummary {
            photo: MediaStore::photo_url(&state.public_url, &channel.photo),
            ..channel
        })
        .collect();

    Ok(Json(channels))
}

pub async fn profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<User>> {
    let id = parse_id(&id, "Invalid user ID")?;

    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(user))
}
