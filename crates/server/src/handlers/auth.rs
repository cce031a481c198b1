//! Authentication-related endpoints.

use crate::auth::require_auth;
use crate::error::{ApiError, ApiResult};
use axum::Json;
use axum::extract::Request;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Response for the authenticated caller.
#[derive(Debug, Serialize)]
pub struct WhoamiResponse {
    pub user_id: i64,
    pub username: String,
    pub issued_at: String,
    pub expires_at: String,
}

/// Response for a logout acknowledgement.
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub status: &'static str,
}

fn format_instant(ts: OffsetDateTime, field: &str) -> ApiResult<String> {
    ts.format(&Rfc3339)
        .map_err(|e| ApiError::Internal(format!("failed to format {field}: {e}")))
}

/// GET /v1/auth/whoami - Return the caller and the token's lifetime.
pub async fn whoami(req: Request) -> ApiResult<Json<WhoamiResponse>> {
    let auth = require_auth(&req)?;

    Ok(Json(WhoamiResponse {
        user_id: auth.principal.id.get(),
        username: auth.principal.display_name.clone(),
        issued_at: format_instant(auth.claims.issued_at, "issued_at")?,
        expires_at: format_instant(auth.claims.expires_at, "expires_at")?,
    }))
}

/// POST /v1/auth/logout - Acknowledge a logout.
///
/// Tokens are stateless; the client discards its copy and the token expires
/// on its own.
pub async fn logout(req: Request) -> ApiResult<Json<LogoutResponse>> {
    let auth = require_auth(&req)?;
    tracing::info!(principal_id = %auth.principal.id, "logout");

    Ok(Json(LogoutResponse { status: "ok" }))
}
