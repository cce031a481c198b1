//! Signed, expiring bearer tokens for Marquee.
//!
//! This crate provides:
//! - HMAC-SHA256 signing key parsing and generation
//! - Token issue and verification

pub mod codec;
pub mod error;
pub mod key;

pub use codec::{Claims, IssuedToken, TokenCodec};
pub use error::{KeyError, KeyResult, TokenError, TokenResult};
pub use key::SigningKey;
