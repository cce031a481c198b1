//! Prometheus metrics for the Marquee server.
//!
//! The `/metrics` endpoint is unauthenticated so Prometheus can scrape it.
//! Labels carry asset kinds and outcomes only, never ids or paths.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use marquee_core::AssetKind;
use prometheus::{self, Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::{LazyLock, Once};

/// Global Prometheus registry for all metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

pub static STREAM_REQUESTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "marquee_stream_requests_total",
            "Stream requests by asset kind and outcome",
        ),
        &["kind", "outcome"],
    )
    .expect("metric creation failed")
});

pub static STREAM_BYTES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "marquee_stream_bytes_total",
            "Bytes scheduled for delivery by asset kind",
        ),
        &["kind"],
    )
    .expect("metric creation failed")
});

pub static AUTH_REJECTIONS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "marquee_auth_rejections_total",
            "Bearer tokens that did not yield a principal, by reason",
        ),
        &["reason"],
    )
    .expect("metric creation failed")
});

pub static VIEW_INCREMENT_FAILURES: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "marquee_view_increment_failures_total",
        "View counter updates that failed after a full video response",
    )
    .expect("metric creation failed")
});

static REGISTER: Once = Once::new();

/// Register all metrics with the global registry.
pub fn register_metrics() {
    REGISTER.call_once(|| {
        REGISTRY
            .register(Box::new(STREAM_REQUESTS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(STREAM_BYTES.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(AUTH_REJECTIONS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(VIEW_INCREMENT_FAILURES.clone()))
            .expect("metric registration failed");
    });
}

/// GET /metrics - Prometheus metrics endpoint.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {e}").into_bytes(),
        ),
    }
}

/// Record the outcome of a stream request.
pub fn record_stream(kind: AssetKind, outcome: &str) {
    STREAM_REQUESTS
        .with_label_values(&[kind.as_str(), outcome])
        .inc();
}

/// Record bytes handed to the response body.
pub fn record_stream_bytes(kind: AssetKind, bytes: u64) {
    STREAM_BYTES.with_label_values(&[kind.as_str()]).inc_by(bytes);
}

/// Record a rejected bearer token.
pub fn record_auth_rejection(reason: &str) {
    AUTH_REJECTIONS.with_label_values(&[reason]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        register_metrics();
        // Second call is a no-op.
        register_metrics();
    }

    #[test]
    fn test_record_helpers() {
        register_metrics();
        let before = STREAM_REQUESTS
            .with_label_values(&["thumbnail", "full"])
            .get();
        record_stream(AssetKind::Thumbnail, "full");
        record_stream_bytes(AssetKind::Thumbnail, 42);
        record_auth_rejection("expired");
        assert!(
            STREAM_REQUESTS
                .with_label_values(&["thumbnail", "full"])
                .get()
                > before
        );
    }
}
