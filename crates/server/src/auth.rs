//! Authentication middleware.
//!
//! Every request passes through [`auth_middleware`]. A valid bearer token
//! attaches an [`AuthenticatedPrincipal`] to the request; a missing, malformed,
//! forged or expired token leaves the request anonymous. Whether anonymous is
//! good enough is decided later, per resource.

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use marquee_core::Principal;
use marquee_token::Claims;
use tracing::Instrument;
use uuid::Uuid;

/// Maximum length for trace IDs.
const MAX_TRACE_ID_LEN: usize = 128;

/// Trace ID for request correlation.
#[derive(Clone, Debug)]
pub struct TraceId(pub String);

impl TraceId {
    /// Generate a new random trace ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create a trace ID from a client-provided value.
    ///
    /// Truncated to 128 characters, restricted to printable ASCII.
    pub fn from_client(value: &str) -> Self {
        let sanitized: String = value
            .chars()
            .take(MAX_TRACE_ID_LEN)
            .filter(|c| c.is_ascii_graphic() || *c == ' ')
            .collect();

        if sanitized.is_empty() {
            Self::new()
        } else {
            Self(sanitized)
        }
    }

    /// Get the trace ID as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Authenticated request extension.
#[derive(Clone, Debug)]
pub struct AuthenticatedPrincipal {
    /// The user the token was issued to.
    pub principal: Principal,
    /// The verified token contents.
    pub claims: Claims,
}

/// Extract the bearer token from the Authorization header.
/// The "Bearer" scheme is case-insensitive.
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            if v.len() >= 7 && v[..7].eq_ignore_ascii_case("bearer ") {
                Some(v[7..].trim())
            } else {
                None
            }
        })
        .filter(|t| !t.is_empty())
}

/// Extract trace ID from X-Trace-Id header or generate a new one.
fn extract_or_generate_trace_id(req: &Request) -> TraceId {
    req.headers()
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .map(TraceId::from_client)
        .unwrap_or_else(TraceId::new)
}

/// Resolve the caller behind a request's bearer token.
///
/// Every token failure collapses to `Ok(None)`; only the logs and the
/// rejection counter tell them apart. Catalog failures are errors.
pub async fn authenticate(
    state: &AppState,
    headers: &HeaderMap,
) -> ApiResult<Option<AuthenticatedPrincipal>> {
    let Some(token) = extract_bearer_token(headers) else {
        return Ok(None);
    };

    let claims = match state.tokens.verify(token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!(reason = e.reason(), "bearer token rejected");
            metrics::record_auth_rejection(e.reason());
            return Ok(None);
        }
    };

    match state.catalog.resolve_principal(claims.principal_id).await? {
        Some(principal) => Ok(Some(AuthenticatedPrincipal { principal, claims })),
        None => {
            tracing::debug!(
                principal_id = %claims.principal_id,
                "token names an unknown principal"
            );
            metrics::record_auth_rejection("unknown_principal");
            Ok(None)
        }
    }
}

/// Authentication middleware that resolves the caller and sets up trace context.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let trace_id = extract_or_generate_trace_id(&req);
    let trace_id_str = trace_id.0.clone();
    req.extensions_mut().insert(trace_id);

    let span = tracing::info_span!("request", trace_id = %trace_id_str);

    if let Some(auth) = authenticate(&state, req.headers())
        .instrument(span.clone())
        .await?
    {
        req.extensions_mut().insert(auth);
    }

    let response = next.run(req).instrument(span).await;

    Ok(response)
}

/// Require authentication (a valid token must be present).
pub fn require_auth(req: &Request) -> ApiResult<&AuthenticatedPrincipal> {
    req.extensions()
        .get::<AuthenticatedPrincipal>()
        .ok_or_else(|| ApiError::Unauthorized("authentication required".to_string()))
}

/// Get optional authentication.
pub fn get_auth(req: &Request) -> Option<&AuthenticatedPrincipal> {
    req.extensions().get::<AuthenticatedPrincipal>()
}
