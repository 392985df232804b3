//! Video browsing and upload handlers

use auth::AuthUser;
use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State, multipart::Field},
    http::StatusCode,
    response::IntoResponse,
};
use common::{ApiError, ApiResult};
use media::{MediaKind, MediaStore, StoredFile, UploadError};
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    models::{
        parse_id,
        video::{
            Category, NewVideo, SearchQuery, UploadResponse, VideoCountResponse, VideoDetail,
            VideoListItem, VideoQuery, VideoSummaryRow, ViewerQuery,
        },
    },
    repositories::video::VideoFilter,
    state::AppState,
};

/// Videos shown on a channel's overview
const RECENT_LIMIT: i64 = 3;

/// Attach probed durations to listing rows; probes run concurrently
async fn with_durations(state: &AppState, rows: Vec<VideoSummaryRow>) -> Vec<VideoListItem> {
    let paths: Vec<_> = rows
        .iter()
        .map(|row| state.media.path_for(MediaKind::Video, &row.filename))
        .collect();
    let durations = state.probe.duration_labels(&paths).await;

    rows.into_iter()
        .zip(durations)
        .map(|(row, duration)| VideoListItem::new(row, duration))
        .collect()
}

/// Browse videos by category and full-text search
pub async fn list_videos(
    State(state): State<AppState>,
    Query(query): Query<VideoQuery>,
) -> ApiResult<Json<Vec<VideoListItem>>> {
    let filter = VideoFilter::from_params(
        query.category.as_deref(),
        query.search.as_deref(),
        query.sort.as_deref(),
    );
    let rows = state.videos.list(&filter).await?;

    Ok(Json(with_durations(&state, rows).await))
}

/// Substring search over title, description and category
pub async fn search_videos(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<VideoListItem>>> {
    let term = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::bad_request("Search query is required"))?;

    let rows = state.videos.search(term).await?;
    if rows.is_empty() {
        return Err(ApiError::not_found("No videos found"));
    }

    Ok(Json(with_durations(&state, rows).await))
}

/// Single video with uploader, comments and the viewer's reaction
pub async fn get_video(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(viewer): Query<ViewerQuery>,
) -> ApiResult<Json<VideoDetail>> {
    let id = parse_id(&id, "Invalid video ID")?;

    let row = state
        .videos
        .find_with_uploader(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Video not found"))?;
    let comments = state.videos.comments_with_authors(id).await?;

    Ok(Json(VideoDetail::new(row, comments, viewer.viewer())))
}

fn has_file(field: &Field<'_>) -> bool {
    field.file_name().is_some_and(|name| !name.is_empty())
}

/// Fields collected from the upload form
#[derive(Default)]
struct UploadForm {
    title: Option<String>,
    description: Option<String>,
    category: Option<String>,
    video: Option<StoredFile>,
    thumbnail: Option<StoredFile>,
}

impl UploadForm {
    async fn read(&mut self, media: &MediaStore, multipart: &mut Multipart) -> Result<(), UploadError> {
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "title" => self.title = Some(field.text().await?),
                "description" => self.description = Some(field.text().await?),
                "category" => self.category = Some(field.text().await?),
                // Browsers send an empty part when no file was chosen
                "video" if self.video.is_none() && has_file(&field) => {
                    self.video = Some(media.persist_field(MediaKind::Video, field).await?);
                }
                "thumbnail" if self.thumbnail.is_none() && has_file(&field) => {
                    self.thumbnail = Some(media.persist_field(MediaKind::Thumbnail, field).await?);
                }
                // The uploader comes from the bearer token; a `uploaderId` field is ignored
                _ => {}
            }
        }

        Ok(())
    }

    /// Remove stored files after a failed upload
    async fn discard(&self, media: &MediaStore) {
        for file in self.video.iter().chain(self.thumbnail.iter()) {
            if let Err(e) = media.remove(file.kind, &file.file_name).await {
                error!("Failed to remove orphaned upload {}: {}", file.file_name, e);
            }
        }
    }
}

/// Upload a video with an optional thumbnail
pub async fn upload(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let mut form = UploadForm::default();
    let result = match form.read(&state.media, &mut multipart).await {
        Ok(()) => publish(&state, auth.id, &form).await,
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(response) => Ok((StatusCode::CREATED, Json(response))),
        Err(e) => {
            form.discard(&state.media).await;
            Err(e)
        }
    }
}

async fn publish(state: &AppState, uploader_id: Uuid, form: &UploadForm) -> ApiResult<UploadResponse> {
    let title = form.title.as_deref().map(str::trim).unwrap_or_default();
    let description = form.description.as_deref().map(str::trim).unwrap_or_default();

    let video = match &form.video {
        Some(video) if !title.is_empty() && !description.is_empty() => video,
        _ => {
            return Err(ApiError::bad_request(
                "Title, description and video file are required",
            ));
        }
    };

    state.require_account(uploader_id).await?;

    let new_video = NewVideo {
        title: title.to_string(),
        description: description.to_string(),
        filename: video.file_name.clone(),
        thumbnail: form.thumbnail.as_ref().map(|t| t.file_name.clone()),
        category: Category::for_upload(form.category.as_deref()),
        uploader_id,
    };

    let video = state.videos.create(&new_video).await?;
    info!("Video {} uploaded by {}", video.id, uploader_id);

    Ok(UploadResponse {
        message: "Video uploaded successfully".to_string(),
        video,
    })
}

/// Number of videos uploaded by a user
pub async fn user_video_count(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<VideoCountResponse>> {
    let id = parse_id(&id, "Invalid user ID")?;
    let total_videos = state.videos.count_by_uploader(id).await?;

    Ok(Json(VideoCountResponse { total_videos }))
}

/// The three most recent videos of a user
pub async fn recent_user_videos(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<VideoListItem>>> {
    let id = parse_id(&id, "Invalid user ID")?;
    let rows = state.videos.by_uploader(id, Some(RECENT_LIMIT)).await?;

    Ok(Json(with_durations(&state, rows).await))
}

/// All videos of a user, newest first
pub async fn user_videos(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<VideoListItem>>> {
    let id = parse_id(&id, "Invalid user ID")?;
    let rows = state.videos.by_uploader(id, None).await?;

    Ok(Json(with_durations(&state, rows).await))
}
