//! Media streaming endpoints.

use crate::auth::get_auth;
use crate::error::ApiResult;
use crate::state::AppState;
use crate::stream::{self, StreamResponse};
use axum::extract::{Path, Request, State};
use axum::http::header::RANGE;
use axum::http::{Method, StatusCode};
use marquee_core::AssetKind;

/// GET /stream/video/{id} - Stream a video, honoring `Range`.
pub async fn stream_video(
    State(state): State<AppState>,
    Path(video_id): Path<i64>,
    req: Request,
) -> ApiResult<StreamResponse> {
    let principal = get_auth(&req).map(|auth| &auth.principal);
    let range = req.headers().get(RANGE).and_then(|v| v.to_str().ok());

    let result = stream::serve_asset(&state, AssetKind::Video, video_id, principal, range).await;
    let response = stream::finish(AssetKind::Video, result)?;

    // Only a full GET is a view; seeks and HEAD probes are not.
    if response.status == StatusCode::OK && req.method() != Method::HEAD {
        stream::record_view(&state, video_id).await;
    }

    Ok(response)
}

/// GET /stream/thumbnail/{id} - Serve a video's thumbnail.
pub async fn stream_thumbnail(
    State(state): State<AppState>,
    Path(video_id): Path<i64>,
    req: Request,
) -> ApiResult<StreamResponse> {
    let principal = get_auth(&req).map(|auth| &auth.principal);

    let result =
        stream::serve_asset(&state, AssetKind::Thumbnail, video_id, principal, None).await;
    stream::finish(AssetKind::Thumbnail, result)
}

/// GET /stream/profile-image/{user_id} - Serve a user's avatar.
pub async fn stream_profile_image(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    req: Request,
) -> ApiResult<StreamResponse> {
    let principal = get_auth(&req).map(|auth| &auth.principal);

    let result = stream::serve_profile_image(&state, user_id, principal).await;
    stream::finish(AssetKind::ProfileImage, result)
}
