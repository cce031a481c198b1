//! HTTP media delivery server for Marquee.
//!
//! This crate provides the delivery surface:
//! - Video streaming with byte-range support
//! - Thumbnail and profile image delivery
//! - Bearer token authentication
//! - Health and Prometheus endpoints

pub mod auth;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod routes;
pub mod state;
pub mod stream;

pub use auth::{AuthenticatedPrincipal, TraceId};
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
