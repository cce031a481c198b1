//! Delivery of stored media.
//!
//! A request moves through catalog lookup, authorization, opening the file,
//! content type resolution and range selection, then ends in a full body, a
//! partial body or an error. Bodies are read lazily in fixed-size chunks;
//! dropping the response closes the file.

use crate::error::ApiError;
use crate::metrics;
use crate::state::AppState;
use axum::body::Body;
use axum::http::header::{
    ACCEPT_RANGES, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE,
};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use marquee_catalog::CatalogError;
use marquee_core::content_type::{self, SNIFF_LEN};
use marquee_core::range::{self, RangeDecision};
use marquee_core::resource::{normalize_storage_key, profile_image_key};
use marquee_core::{AssetKind, Principal, ResourceDescriptor, authorize, authorize_profile_image};
use marquee_storage::{ByteStream, OpenObject, StorageError};

/// Cache policy sent with profile images.
pub const PROFILE_IMAGE_CACHE_CONTROL: &str = "public, max-age=3600";

/// Why a stream request ended without a body.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("no catalog record")]
    MissingMetadata,

    #[error("no stored file")]
    MissingFile,

    #[error("authentication required")]
    Unauthenticated,

    #[error("access denied")]
    Denied,

    #[error("range not satisfiable for length {total_length}")]
    Unsatisfiable { total_length: u64 },

    #[error("storage error: {0}")]
    Storage(StorageError),

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

impl StreamError {
    /// Metrics label for this outcome.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::MissingMetadata | Self::MissingFile => "not_found",
            Self::Unauthenticated => "unauthenticated",
            Self::Denied => "denied",
            Self::Unsatisfiable { .. } => "unsatisfiable",
            Self::Storage(_) | Self::Catalog(_) => "error",
        }
    }
}

impl From<StorageError> for StreamError {
    fn from(e: StorageError) -> Self {
        if e.is_missing() {
            Self::MissingFile
        } else {
            Self::Storage(e)
        }
    }
}

impl From<StreamError> for ApiError {
    fn from(e: StreamError) -> Self {
        match e {
            // Missing records and missing files look the same to clients.
            StreamError::MissingMetadata | StreamError::MissingFile => {
                ApiError::NotFound("resource not found".to_string())
            }
            StreamError::Unauthenticated => {
                ApiError::Unauthorized("authentication required".to_string())
            }
            StreamError::Denied => ApiError::Forbidden("access denied".to_string()),
            StreamError::Unsatisfiable { total_length } => {
                ApiError::RangeNotSatisfiable { total_length }
            }
            StreamError::Storage(e) => ApiError::Storage(e),
            StreamError::Catalog(e) => ApiError::Catalog(e),
        }
    }
}

/// A successful stream response, headers decided, body not yet read.
pub struct StreamResponse {
    pub kind: AssetKind,
    pub status: StatusCode,
    pub content_type: String,
    pub content_length: u64,
    pub content_range: Option<String>,
    pub accept_ranges: bool,
    pub cache_control: Option<&'static str>,
    body: ByteStream,
}

impl StreamResponse {
    /// Metrics label for this outcome.
    pub fn outcome(&self) -> &'static str {
        if self.status == StatusCode::PARTIAL_CONTENT {
            "partial"
        } else {
            "full"
        }
    }
}

impl std::fmt::Debug for StreamResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamResponse")
            .field("kind", &self.kind)
            .field("status", &self.status)
            .field("content_type", &self.content_type)
            .field("content_length", &self.content_length)
            .field("content_range", &self.content_range)
            .finish_non_exhaustive()
    }
}

impl IntoResponse for StreamResponse {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        let content_type = HeaderValue::from_str(&self.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
        headers.insert(CONTENT_TYPE, content_type);
        headers.insert(CONTENT_LENGTH, HeaderValue::from(self.content_length));
        if let Some(content_range) = self.content_range
            && let Ok(value) = HeaderValue::from_str(&content_range)
        {
            headers.insert(CONTENT_RANGE, value);
        }
        if self.accept_ranges {
            headers.insert(ACCEPT_RANGES, HeaderValue::from_static("bytes"));
        }
        if let Some(cache_control) = self.cache_control {
            headers.insert(CACHE_CONTROL, HeaderValue::from_static(cache_control));
        }

        let kind = self.kind;
        let body = self.body.map(move |chunk| {
            chunk.map_err(|e| {
                tracing::warn!(kind = %kind, error = %e, "stream aborted");
                std::io::Error::other(e.to_string())
            })
        });

        (self.status, headers, Body::from_stream(body)).into_response()
    }
}

/// Record the outcome of a stream request and convert it for the handler.
pub fn finish(
    kind: AssetKind,
    result: Result<StreamResponse, StreamError>,
) -> Result<StreamResponse, ApiError> {
    match result {
        Ok(response) => {
            metrics::record_stream(kind, response.outcome());
            metrics::record_stream_bytes(kind, response.content_length);
            Ok(response)
        }
        Err(e) => {
            metrics::record_stream(kind, e.outcome());
            match &e {
                StreamError::Storage(_) | StreamError::Catalog(_) => {}
                _ => tracing::debug!(kind = %kind, reason = %e, "stream request refused"),
            }
            Err(e.into())
        }
    }
}

/// Serve a video or a thumbnail.
///
/// `id` is the video id for both kinds. The range header is only looked at
/// for kinds that support ranges. Views are not counted here; see
/// [`record_view`].
pub async fn serve_asset(
    state: &AppState,
    kind: AssetKind,
    id: i64,
    principal: Option<&Principal>,
    range_header: Option<&str>,
) -> Result<StreamResponse, StreamError> {
    let descriptor = state
        .catalog
        .get_resource(kind, id)
        .await?
        .ok_or(StreamError::MissingMetadata)?;

    if !authorize(principal, &descriptor).is_allowed() {
        return Err(match principal {
            None => StreamError::Unauthenticated,
            Some(_) => StreamError::Denied,
        });
    }

    let key = normalize_storage_key(&descriptor.storage_path).ok_or(StreamError::MissingFile)?;
    let object = state.storage.open(&key).await?;

    respond(state, &descriptor, &key, object, range_header).await
}

/// Serve a user's profile image, falling back to the configured default.
pub async fn serve_profile_image(
    state: &AppState,
    user_id: i64,
    principal: Option<&Principal>,
) -> Result<StreamResponse, StreamError> {
    let descriptor = state
        .catalog
        .get_resource(AssetKind::ProfileImage, user_id)
        .await?
        .ok_or(StreamError::MissingMetadata)?;

    if !authorize_profile_image(principal).is_allowed() {
        return Err(StreamError::Unauthenticated);
    }

    let assets = &state.config.assets;
    let own = match profile_image_key(&descriptor.storage_path, &assets.profile_image_dir) {
        Some(key) => match state.storage.open(&key).await {
            Ok(object) => Some((key, object)),
            Err(e) if e.is_missing() => {
                tracing::debug!(user_id, "profile image file missing, using default");
                None
            }
            Err(e) => return Err(StreamError::Storage(e)),
        },
        None => None,
    };

    let (key, object) = match own {
        Some(found) => found,
        None => {
            let key = normalize_storage_key(&assets.default_profile_image)
                .ok_or(StreamError::MissingFile)?;
            let object = state.storage.open(&key).await?;
            (key, object)
        }
    };

    let mut response = respond(state, &descriptor, &key, object, None).await?;
    response.cache_control = Some(PROFILE_IMAGE_CACHE_CONTROL);
    Ok(response)
}

/// Decide headers and body for an opened object.
async fn respond(
    state: &AppState,
    descriptor: &ResourceDescriptor,
    key: &str,
    mut object: OpenObject,
    range_header: Option<&str>,
) -> Result<StreamResponse, StreamError> {
    let kind = descriptor.kind;
    let total_length = object.meta.size;
    if descriptor.total_length != 0 && descriptor.total_length != total_length {
        tracing::warn!(
            kind = %kind,
            id = descriptor.id,
            catalog_length = descriptor.total_length,
            stored_length = total_length,
            "catalog length disagrees with stored file, using stored length"
        );
    }

    let content_type = match content_type::from_extension(key) {
        Some(ct) => ct.to_string(),
        None => {
            let head = object.peek_head(SNIFF_LEN).await?;
            content_type::resolve(key, &head, descriptor.content_type_hint.as_deref(), kind)
        }
    };

    let decision = if kind.supports_ranges() {
        range::parse(range_header, total_length)
    } else {
        RangeDecision::Full
    };

    let chunk_size = state.chunk_size();
    match decision {
        RangeDecision::Full => Ok(StreamResponse {
            kind,
            status: StatusCode::OK,
            content_type,
            content_length: total_length,
            content_range: None,
            accept_ranges: kind.supports_ranges(),
            cache_control: None,
            body: object.into_full_stream(chunk_size),
        }),
        RangeDecision::Partial(window) => {
            let body = object
                .into_range_stream(window.start, window.end, chunk_size)
                .map_err(StreamError::Storage)?;
            Ok(StreamResponse {
                kind,
                status: StatusCode::PARTIAL_CONTENT,
                content_type,
                content_length: window.len(),
                content_range: Some(window.content_range(total_length)),
                accept_ranges: true,
                cache_control: None,
                body,
            })
        }
        RangeDecision::Unsatisfiable => Err(StreamError::Unsatisfiable { total_length }),
    }
}

/// Count one view. Failures are logged and never fail the response.
pub async fn record_view(state: &AppState, video_id: i64) {
    if let Err(e) = state.catalog.increment_view_count(video_id).await {
        tracing::warn!(video_id, error = %e, "failed to increment view count");
        metrics::VIEW_INCREMENT_FAILURES.inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_metadata_and_file_are_one_status() {
        let a = ApiError::from(StreamError::MissingMetadata);
        let b = ApiError::from(StreamError::MissingFile);
        assert_eq!(a.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(b.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn test_denial_statuses() {
        assert_eq!(
            ApiError::from(StreamError::Unauthenticated).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(StreamError::Denied).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(StreamError::Unsatisfiable { total_length: 5 }).status_code(),
            StatusCode::RANGE_NOT_SATISFIABLE
        );
    }

    #[test]
    fn test_storage_errors_split_on_missing() {
        let missing = StreamError::from(StorageError::NotFound("x".into()));
        assert!(matches!(missing, StreamError::MissingFile));

        let broken = StreamError::from(StorageError::Io(std::io::Error::other("eio")));
        assert_eq!(broken.outcome(), "error");
        assert_eq!(
            ApiError::from(broken).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
