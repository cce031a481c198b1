//! HTTP request handlers.

pub mod auth;
pub mod health;
pub mod stream;

pub use auth::*;
pub use health::*;
pub use stream::*;
