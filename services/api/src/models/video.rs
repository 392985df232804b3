//! Video models for the API service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Video category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    All,
    Music,
    Gaming,
    News,
    Live,
    Comedy,
    Sports,
    Technology,
    Entertainment,
    Education,
    Science,
    Travel,
    Food,
    Fashion,
    Beauty,
    Other,
}

impl Category {
    pub const ALL: [Category; 16] = [
        Category::All,
        Category::Music,
        Category::Gaming,
        Category::News,
        Category::Live,
        Category::Comedy,
        Category::Sports,
        Category::Technology,
        Category::Entertainment,
        Category::Education,
        Category::Science,
        Category::Travel,
        Category::Food,
        Category::Fashion,
        Category::Beauty,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::All => "All",
            Category::Music => "Music",
            Category::Gaming => "Gaming",
            Category::News => "News",
            Category::Live => "Live",
            Category::Comedy => "Comedy",
            Category::Sports => "Sports",
            Category::Technology => "Technology",
            Category::Entertainment => "Entertainment",
            Category::Education => "Education",
            Category::Science => "Science",
            Category::Travel => "Travel",
            Category::Food => "Food",
            Category::Fashion => "Fashion",
            Category::Beauty => "Beauty",
            Category::Other => "Other",
        }
    }

    /// Exact, case-sensitive lookup by name
    pub fn from_name(name: &str) -> Option<Category> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }

    /// Category stored for an upload: blank means `All`, anything unknown `Other`
    pub fn for_upload(requested: Option<&str>) -> Category {
        match requested.map(str::trim) {
            None | Some("") => Category::All,
            Some(name) => Self::from_name(name).unwrap_or(Category::Other),
        }
    }
}

/// Ordering of the video listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Newest,
    Popular,
}

impl SortOrder {
    pub fn from_param(param: Option<&str>) -> SortOrder {
        match param {
            Some("popular") => SortOrder::Popular,
            _ => SortOrder::Newest,
        }
    }
}

/// Stored video
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub filename: String,
    pub thumbnail: Option<String>,
    pub category: String,
    pub views: i64,
    pub likes: Vec<Uuid>,
    pub dislikes: Vec<Uuid>,
    pub uploader_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Video creation payload
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub title: String,
    pub description: String,
    pub filename: String,
    pub thumbnail: Option<String>,
    pub category: Category,
    pub uploader_id: Uuid,
}

/// Listing row: a video joined with its uploader and engagement counts
#[derive(Debug, Clone, FromRow)]
pub struct VideoSummaryRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub filename: String,
    pub thumbnail: Option<String>,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub uploader_id: Uuid,
    pub uploader_name: String,
    pub uploader_photo: String,
    pub like_count: i64,
    pub dislike_count: i64,
    pub comment_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploaderSummary {
    pub name: String,
    pub photo: String,
}

/// Video as returned by listings, with its probed duration
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoListItem {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub filename: String,
    pub thumbnail: Option<String>,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub uploader_id: Uuid,
    pub uploader: UploaderSummary,
    pub like_count: i64,
    pub dislike_count: i64,
    pub comment_count: i64,
    pub duration: String,
}

impl VideoListItem {
    pub fn new(row: VideoSummaryRow, duration: String) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            category: row.category,
            filename: row.filename,
            thumbnail: row.thumbnail,
            views: row.views,
            created_at: row.created_at,
            uploader_id: row.uploader_id,
            uploader: UploaderSummary {
                name: row.uploader_name,
                photo: row.uploader_photo,
            },
            like_count: row.like_count,
            dislike_count: row.dislike_count,
            comment_count: row.comment_count,
            duration,
        }
    }
}

/// Detail row: a video joined with its uploader
#[derive(Debug, Clone, FromRow)]
pub struct VideoWithUploaderRow {
    #[sqlx(flatten)]
    pub video: Video,
    pub uploader_name: String,
    pub uploader_photo: String,
    pub uploader_subscribers: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploaderDetail {
    pub name: String,
    pub photo: String,
    pub subscribers: i64,
}

/// Stored comment
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Comment joined with its author
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub user_id: Uuid,
    pub user_name: Option<String>,
    pub user_pic: Option<String>,
}

/// Single video page, relative to an optional viewer
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetail {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub filename: String,
    pub thumbnail: Option<String>,
    pub category: String,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub like_count: usize,
    pub dislike_count: usize,
    pub is_liked: bool,
    pub is_disliked: bool,
    pub uploader_id: Uuid,
    pub uploader: UploaderDetail,
    pub comments: Vec<CommentView>,
}

impl VideoDetail {
    pub fn new(row: VideoWithUploaderRow, comments: Vec<CommentView>, viewer: Option<Uuid>) -> Self {
        let video = row.video;
        let is_liked = viewer.is_some_and(|v| video.likes.contains(&v));
        let is_disliked = viewer.is_some_and(|v| video.dislikes.contains(&v));

        Self {
            id: video.id,
            title: video.title,
            description: video.description,
            filename: video.filename,
            thumbnail: video.thumbnail,
            category: video.category,
            views: video.views,
            created_at: video.created_at,
            like_count: video.likes.len(),
            dislike_count: video.dislikes.len(),
            is_liked,
            is_disliked,
            uploader_id: video.uploader_id,
            uploader: UploaderDetail {
                name: row.uploader_name,
                photo: row.uploader_photo,
                subscribers: row.uploader_subscribers,
            },
            comments,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    Like,
    Dislike,
}

/// Like and dislike sets of one video.
///
/// A user is never in both sets: reacting one way always clears the other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reactions {
    pub likes: Vec<Uuid>,
    pub dislikes: Vec<Uuid>,
}

impl Reactions {
    /// Toggle `user` in the set for `reaction` and remove them from the opposite one
    pub fn toggle(&mut self, reaction: Reaction, user: Uuid) {
        let (target, opposite) = match reaction {
            Reaction::Like => (&mut self.likes, &mut self.dislikes),
            Reaction::Dislike => (&mut self.dislikes, &mut self.likes),
        };

        opposite.retain(|id| *id != user);
        if target.contains(&user) {
            target.retain(|id| *id != user);
        } else {
            target.push(user);
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerQuery {
    pub user_id: Option<String>,
}

impl ViewerQuery {
    /// The viewer, when a well-formed id was supplied
    pub fn viewer(&self) -> Option<Uuid> {
        self.user_id.as_deref().and_then(|id| id.parse().ok())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub video: Video,
}

#[derive(Debug, Serialize)]
pub struct ReactionResponse {
    pub message: String,
    pub likes: Vec<Uuid>,
    pub dislikes: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct CommentsResponse {
    pub message: String,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Serialize)]
pub struct ViewResponse {
    pub message: String,
    pub views: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoCountResponse {
    pub total_videos: i64,
}
