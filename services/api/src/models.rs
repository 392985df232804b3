//! API models for request and response payloads

pub mod subscription;
pub mod video;

use common::{ApiError, ApiResult};
use uuid::Uuid;

/// Parse a path segment as an id, answering `400` with `message` when malformed
pub fn parse_id(raw: &str, message: &str) -> ApiResult<Uuid> {
    raw.parse().map_err(|_| ApiError::bad_request(message))
}
