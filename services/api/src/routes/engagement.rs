//! Likes, dislikes, comments and views

use auth::AuthUser;
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use common::{ApiError, ApiJson, ApiResult};

use crate::{
    models::{
        parse_id,
        video::{CommentRequest, CommentsResponse, Reaction, ReactionResponse, ViewResponse},
    },
    state::AppState,
};

async fn react(state: &AppState, id: &str, user: AuthUser, reaction: Reaction) -> ApiResult<ReactionResponse> {
    let id = parse_id(id, "Invalid video ID")?;
    state.require_account(user.id).await?;

    let reactions = state
        .videos
        .toggle_reaction(id, user.id, reaction)
        .await?
        .ok_or_else(|| ApiError::not_found("Video not found"))?;

    let message = match reaction {
        Reaction::Like => "Like updated",
        Reaction::Dislike => "Dislike updated",
    };

    Ok(ReactionResponse {
        message: message.to_string(),
        likes: reactions.likes,
        dislikes: reactions.dislikes,
    })
}

pub async fn like(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<ReactionResponse>> {
    Ok(Json(react(&state, &id, user, Reaction::Like).await?))
}

pub async fn dislike(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<ReactionResponse>> {
    Ok(Json(react(&state, &id, user, Reaction::Dislike).await?))
}

/// Append a comment by the authenticated user
pub async fn comment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<CommentRequest>,
) -> ApiResult<Json<CommentsResponse>> {
    let id = parse_id(&id, "Invalid video ID")?;

    let text = payload
        .text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::bad_request("Comment cannot be empty"))?;
    state.require_account(user.id).await?;

    let comments = state
        .videos
        .add_comment(id, user.id, text)
        .await?
        .ok_or_else(|| ApiError::not_found("Video not found"))?;

    Ok(Json(CommentsResponse {
        message: "Comment added".to_string(),
        comments,
    }))
}

/// Count a view; every call counts
pub async fn view(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ViewResponse>> {
    let id = parse_id(&id, "Invalid video ID")?;

    let views = state
        .videos
        .increment_views(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Video not found"))?;

    Ok(Json(ViewResponse {
        message: "View count updated".to_string(),
        views,
    }))
}
