//! Media handling for the NewTube backend
//!
//! Uploaded files are streamed to a local upload root ([`storage`]) and
//! inspected with `ffprobe` when listings need their playback duration
//! ([`metadata_extractor`]).

pub mod metadata_extractor;
pub mod storage;

pub use metadata_extractor::{MetadataExtractor, format_duration};
pub use storage::{MediaKind, MediaStore, StoredFile, UploadError};
