//! Disk-backed storage for uploaded media
//!
//! Files live under a single upload root, split by kind:
//!
//! ```text
//! <root>/videos/<stored name>
//! <root>/thumbnails/<stored name>
//! <root>/profilepics/<stored name>
//! ```
//!
//! The root is served statically under `/uploads`, so a stored file is
//! reachable at `/uploads/<kind dir>/<stored name>`.

use axum::extract::multipart::Field;
use common::ApiError;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt};
use tracing::{error, info};

/// URL prefix under which the upload root is served
pub const PUBLIC_PREFIX: &str = "/uploads";

/// Stored name of the picture assigned to accounts that never uploaded one
pub const DEFAULT_PROFILE_PICTURE: &str = "default_image.png";

const MAX_NAME_LEN: usize = 100;

/// Kind of uploaded file, which decides both the directory and the accepted media type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Thumbnail,
    ProfilePicture,
}

impl MediaKind {
    pub const ALL: [MediaKind; 3] = [
        MediaKind::Video,
        MediaKind::Thumbnail,
        MediaKind::ProfilePicture,
    ];

    /// Directory below the upload root
    pub fn dir_name(&self) -> &'static str {
        match self {
            MediaKind::Video => "videos",
            MediaKind::Thumbnail => "thumbnails",
            MediaKind::ProfilePicture => "profilepics",
        }
    }

    fn accepts(&self, content_type: &str) -> bool {
        match self {
            MediaKind::Video => content_type.starts_with("video/"),
            MediaKind::Thumbnail | MediaKind::ProfilePicture => content_type.starts_with("image/"),
        }
    }
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("Malformed multipart body: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("Failed to write upload: {0}")]
    Io(#[from] std::io::Error),
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::UnsupportedType(_) | UploadError::Multipart(_) => {
                ApiError::BadRequest(err.to_string())
            }
            UploadError::Io(e) => ApiError::Internal(e.into()),
        }
    }
}

/// A file persisted by [`MediaStore::persist_field`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub kind: MediaKind,
    pub file_name: String,
}

#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the upload root and its per-kind directories
    pub async fn ensure_dirs(&self) -> std::io::Result<()> {
        for kind in MediaKind::ALL {
            fs::create_dir_all(self.root.join(kind.dir_name())).await?;
        }
        info!("Upload directories ready under {}", self.root.display());
        Ok(())
    }

    /// Absolute path of a stored file
    pub fn path_for(&self, kind: MediaKind, file_name: &str) -> PathBuf {
        self.root.join(kind.dir_name()).join(file_name)
    }

    /// Stream one multipart file field to disk.
    ///
    /// The field's declared content type must match `kind`. A partially
    /// written file is removed when the stream fails.
    pub async fn persist_field(
        &self,
        kind: MediaKind,
        mut field: Field<'_>,
    ) -> Result<StoredFile, UploadError> {
        let content_type = field.content_type().unwrap_or_default().to_string();
        if !kind.accepts(&content_type) {
            return Err(UploadError::UnsupportedType(content_type));
        }

        let file_name = stored_file_name(field.file_name().unwrap_or_default());
        let path = self.path_for(kind, &file_name);

        let mut file = fs::File::create(&path).await?;
        let mut size = 0u64;

        let written: Result<(), UploadError> = async {
            while let Some(chunk) = field.chunk().await? {
                file.write_all(&chunk).await?;
                size += chunk.len() as u64;
            }
            file.flush().await?;
            Ok(())
        }
        .await;

        if let Err(e) = written {
            error!("Upload to {} failed: {}", path.display(), e);
            drop(file);
            if let Err(remove_err) = fs::remove_file(&path).await {
                error!("Failed to remove partial upload {}: {}", path.display(), remove_err);
            }
            return Err(e);
        }

        info!("Stored {} ({} bytes)", path.display(), size);
        Ok(StoredFile {
            kind,
            file_name,
        })
    }

    /// Delete a stored file; a file that is already gone is not an error
    pub async fn remove(&self, kind: MediaKind, file_name: &str) -> std::io::Result<()> {
        match fs::remove_file(self.path_for(kind, file_name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Public URL of a stored file, rooted at `base_url`
    pub fn public_url(base_url: &str, kind: MediaKind, file_name: &str) -> String {
        format!(
            "{}{}/{}/{}",
            base_url.trim_end_matches('/'),
            PUBLIC_PREFIX,
            kind.dir_name(),
            file_name
        )
    }

    /// Absolute URL for a profile photo.
    ///
    /// Federated accounts store an absolute URL, which is returned as is.
    pub fn photo_url(base_url: &str, photo: &str) -> String {
        if photo.starts_with("http://") || photo.starts_with("https://") {
            photo.to_string()
        } else {
            Self::public_url(base_url, MediaKind::ProfilePicture, photo)
        }
    }
}

/// Unique on-disk name derived from a client-supplied file name.
///
/// Only the final path component is kept and reduced to `[A-Za-z0-9._-]`.
pub fn stored_file_name(original: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let mut cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.len() > MAX_NAME_LEN {
        cleaned = cleaned[cleaned.len() - MAX_NAME_LEN..].to_string();
    }
    if cleaned.is_empty() {
        cleaned = "upload".to_string();
    }

    let unique = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}-{}",
        chrono::Utc::now().timestamp_millis(),
        &unique[..8],
        cleaned
    )
}
