//! Route configuration.

use crate::auth::auth_middleware;
use crate::handlers;
use crate::metrics::metrics_handler;
use crate::state::AppState;
use axum::Router;
use axum::http::Method;
use axum::http::header::{ACCEPT_RANGES, AUTHORIZATION, CONTENT_LENGTH, CONTENT_RANGE, RANGE};
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// CORS policy for browser video players.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([RANGE, AUTHORIZATION])
        .expose_headers([CONTENT_RANGE, ACCEPT_RANGES, CONTENT_LENGTH])
}

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/v1/auth/whoami", get(handlers::whoami))
        .route("/v1/auth/logout", post(handlers::logout))
        // Health check (unauthenticated for load balancer probes)
        .route("/v1/health", get(handlers::health_check));

    let stream_routes = Router::new()
        .route("/stream/video/{id}", get(handlers::stream_video))
        .route("/stream/thumbnail/{id}", get(handlers::stream_thumbnail))
        .route(
            "/stream/profile-image/{user_id}",
            get(handlers::stream_profile_image),
        );

    let mut router = Router::new().merge(api_routes).merge(stream_routes);

    // /metrics is unauthenticated; operators must network-restrict it to
    // the Prometheus scraper.
    if state.config.server.metrics_enabled {
        let metrics_routes = Router::new().route("/metrics", get(metrics_handler));
        router = router.merge(metrics_routes);
    }

    // Order of execution: TraceLayer -> CORS -> Auth -> Handler
    router
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
