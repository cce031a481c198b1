//! Token codec error types.

use thiserror::Error;

/// Reasons a presented token is rejected.
///
/// Callers at the HTTP boundary collapse all of these into "unauthenticated";
/// the distinction only shows up in logs and metrics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(&'static str),

    #[error("token signature mismatch")]
    BadSignature,

    #[error("token expired")]
    Expired,
}

impl TokenError {
    /// Short label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "malformed",
            Self::BadSignature => "bad_signature",
            Self::Expired => "expired",
        }
    }
}

/// Signing key errors.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("key parsing error: {0}")]
    KeyParsing(String),

    #[error("signing key too short: {len} bytes (minimum {min})")]
    TooShort { len: usize, min: usize },
}

/// Result type for token operations.
pub type TokenResult<T> = std::result::Result<T, TokenError>;

/// Result type for key operations.
pub type KeyResult<T> = std::result::Result<T, KeyError>;
