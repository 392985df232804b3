//! Video repository for database operations

use anyhow::Result;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use crate::models::video::{
    Category, Comment, CommentView, NewVideo, Reaction, Reactions, SortOrder, Video,
    VideoSummaryRow, VideoWithUploaderRow,
};

const VIDEO_COLUMNS: &str = "v.id, v.title, v.description, v.filename, v.thumbnail, v.category, \
     v.views, v.likes, v.dislikes, v.uploader_id, v.created_at";

const SUMMARY_SELECT: &str = r#"
    SELECT v.id, v.title, v.description, v.category, v.filename, v.thumbnail, v.views,
           v.created_at, v.uploader_id,
           u.name AS uploader_name, u.photo AS uploader_photo,
           cardinality(v.likes)::BIGINT AS like_count,
           cardinality(v.dislikes)::BIGINT AS dislike_count,
           (SELECT COUNT(*) FROM video_comments c WHERE c.video_id = v.id) AS comment_count
    FROM videos v
    JOIN users u ON u.id = v.uploader_id
"#;

/// Listing filters
#[derive(Debug, Clone, Default)]
pub struct VideoFilter {
    /// Exact category; `None` lists every category
    pub category: Option<String>,
    /// Full-text query over title and description
    pub search: Option<String>,
    pub sort: SortOrder,
}

/// `ILIKE` pattern matching `term` anywhere, with wildcards in `term` taken literally
pub fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Video repository
#[derive(Clone)]
pub struct VideoRepository {
    pool: PgPool,
}

impl VideoRepository {
    /// Create a new video repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List videos matching `filter`
    pub async fn list(&self, filter: &VideoFilter) -> Result<Vec<VideoSummaryRow>> {
        let mut query = QueryBuilder::<Postgres>::new(SUMMARY_SELECT);
        query.push(" WHERE TRUE");

        if let Some(category) = &filter.category {
            query.push(" AND v.category = ").push_bind(category.clone());
        }
        if let Some(search) = &filter.search {
            query
                .push(" AND to_tsvector('english', v.title || ' ' || v.description) @@ plainto_tsquery('english', ")
                .push_bind(search.clone())
                .push(")");
        }

        query.push(match filter.sort {
            SortOrder::Newest => " ORDER BY v.created_at DESC",
            SortOrder::Popular => " ORDER BY v.views DESC, v.created_at DESC",
        });

        let videos = query
            .build_query_as::<VideoSummaryRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(videos)
    }

    /// Case-insensitive substring search over title, description and category
    pub async fn search(&self, term: &str) -> Result<Vec<VideoSummaryRow>> {
        info!("Searching videos for: {}", term);

        let videos = sqlx::query_as::<_, VideoSummaryRow>(&format!(
            r#"
            {SUMMARY_SELECT}
            WHERE v.title ILIKE $1 ESCAPE '\'
               OR v.description ILIKE $1 ESCAPE '\'
               OR v.category ILIKE $1 ESCAPE '\'
            ORDER BY v.created_at DESC
            "#
        ))
        .bind(contains_pattern(term))
        .fetch_all(&self.pool)
        .await?;

        Ok(videos)
    }

    /// Find a video with its uploader
    pub async fn find_with_uploader(&self, id: Uuid) -> Result<Option<VideoWithUploaderRow>> {
        let row = sqlx::query_as::<_, VideoWithUploaderRow>(&format!(
            r#"
            SELECT {VIDEO_COLUMNS},
                   u.name AS uploader_name, u.photo AS uploader_photo,
                   u.subscribers AS uploader_subscribers
            FROM videos v
            JOIN users u ON u.id = v.uploader_id
            WHERE v.id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Comments of a video with their authors, oldest first
    pub async fn comments_with_authors(&self, video_id: Uuid) -> Result<Vec<CommentView>> {
        let comments = sqlx::query_as::<_, CommentView>(
            r#"
            SELECT c.id, c.text, c.created_at, c.user_id,
                   u.name AS user_name, u.photo AS user_pic
            FROM video_comments c
            LEFT JOIN users u ON u.id = c.user_id
            WHERE c.video_id = $1
            ORDER BY c.created_at, c.id
            "#,
        )
        .bind(video_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    /// Store a new video
    pub async fn create(&self, new_video: &NewVideo) -> Result<Video> {
        info!("Creating video '{}' for user {}", new_video.title, new_video.uploader_id);

        let video = sqlx::query_as::<_, Video>(
            r#"
            INSERT INTO videos (id, title, description, filename, thumbnail, category, uploader_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, title, description, filename, thumbnail, category,
                      views, likes, dislikes, uploader_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_video.title)
        .bind(&new_video.description)
        .bind(&new_video.filename)
        .bind(&new_video.thumbnail)
        .bind(new_video.category.as_str())
        .bind(new_video.uploader_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(video)
    }

    /// Toggle a reaction of `user` on a video; `None` when the video does not exist.
    ///
    /// The video row is locked for the read-modify-write so concurrent
    /// reactions cannot lose updates.
    pub async fn toggle_reaction(
        &self,
        video_id: Uuid,
        user: Uuid,
        reaction: Reaction,
    ) -> Result<Option<Reactions>> {
        let mut tx = self.pool.begin().await?;

        let current: Option<(Vec<Uuid>, Vec<Uuid>)> =
            sqlx::query_as("SELECT likes, dislikes FROM videos WHERE id = $1 FOR UPDATE")
                .bind(video_id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some((likes, dislikes)) = current else {
            return Ok(None);
        };

        let mut reactions = Reactions { likes, dislikes };
        reactions.toggle(reaction, user);

        sqlx::query("UPDATE videos SET likes = $1, dislikes = $2 WHERE id = $3")
            .bind(&reactions.likes)
            .bind(&reactions.dislikes)
            .bind(video_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!("{:?} toggled by {} on video {}", reaction, user, video_id);
        Ok(Some(reactions))
    }

    /// Append a comment and return all comments of the video, oldest first;
    /// `None` when the video does not exist
    pub async fn add_comment(
        &self,
        video_id: Uuid,
        user: Uuid,
        text: &str,
    ) -> Result<Option<Vec<Comment>>> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<Uuid> = sqlx::query_scalar("SELECT id FROM videos WHERE id = $1 FOR SHARE")
            .bind(video_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Ok(None);
        }

        sqlx::query(
            "INSERT INTO video_comments (id, video_id, user_id, text) VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::new_v4())
        .bind(video_id)
        .bind(user)
        .bind(text)
        .execute(&mut *tx)
        .await?;

        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, user_id, text, created_at
            FROM video_comments
            WHERE video_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(video_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        info!("Comment added by {} on video {}", user, video_id);
        Ok(Some(comments))
    }

    /// Count a view; returns the new total or `None` when the video does not exist
    pub async fn increment_views(&self, video_id: Uuid) -> Result<Option<i64>> {
        let views: Option<i64> = sqlx::query_scalar("UPDATE videos SET views = views + 1 WHERE id = $1 RETURNING views")
            .bind(video_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(views)
    }

    /// Number of videos uploaded by a user
    pub async fn count_by_uploader(&self, uploader_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM videos WHERE uploader_id = $1")
            .bind(uploader_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Videos of a user, newest first, at most `limit` when given
    pub async fn by_uploader(&self, uploader_id: Uuid, limit: Option<i64>) -> Result<Vec<VideoSummaryRow>> {
        let mut query = QueryBuilder::<Postgres>::new(SUMMARY_SELECT);
        query
            .push(" WHERE v.uploader_id = ")
            .push_bind(uploader_id)
            .push(" ORDER BY v.created_at DESC");
        if let Some(limit) = limit {
            query.push(" LIMIT ").push_bind(limit);
        }

        let videos = query
            .build_query_as::<VideoSummaryRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(videos)
    }
}

impl VideoFilter {
    /// Build a filter from the listing query parameters; `All` and blank
    /// values mean no filter
    pub fn from_params(category: Option<&str>, search: Option<&str>, sort: Option<&str>) -> Self {
        let category = category
            .map(str::trim)
            .filter(|c| !c.is_empty() && *c != Category::All.as_str())
            .map(str::to_string);
        let search = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Self {
            category,
            search,
            sort: SortOrder::from_param(sort),
        }
    }
}
