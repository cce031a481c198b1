//! Token issue and verification.

use crate::error::{TokenError, TokenResult};
use crate::key::SigningKey;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::Mac;
use marquee_core::PrincipalId;
use serde::Deserialize;
use time::{Duration, OffsetDateTime, PrimitiveDateTime};

/// Verified token contents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Claims {
    pub principal_id: PrincipalId,
    pub issued_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}

/// A freshly issued token together with what it encodes.
#[derive(Clone, Debug)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

#[derive(Deserialize)]
struct WireClaims {
    sub: i64,
    iat: i64,
    exp: i64,
}

/// Creates and verifies signed, expiring bearer tokens.
///
/// A token is `base64url(payload) "." base64url(hmac_sha256(payload))`, where
/// the payload is a small JSON object with the principal id and the issue and
/// expiry instants in unix seconds.
#[derive(Debug)]
pub struct TokenCodec {
    key: SigningKey,
}

impl TokenCodec {
    pub fn new(key: SigningKey) -> Self {
        Self { key }
    }

    /// Issue a token for `principal_id` valid for `ttl` from now.
    pub fn issue(&self, principal_id: PrincipalId, ttl: Duration) -> IssuedToken {
        self.issue_at(principal_id, ttl, OffsetDateTime::now_utc())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(
        &self,
        principal_id: PrincipalId,
        ttl: Duration,
        now: OffsetDateTime,
    ) -> IssuedToken {
        let issued_at = truncate_to_second(now);
        let expires_at = truncate_to_second(
            issued_at
                .checked_add(ttl)
                .unwrap_or_else(|| PrimitiveDateTime::MAX.assume_utc()),
        );

        let payload = serde_json::json!({
            "sub": principal_id.get(),
            "iat": issued_at.unix_timestamp(),
            "exp": expires_at.unix_timestamp(),
        })
        .to_string();

        let mut mac = self.key.mac();
        mac.update(payload.as_bytes());
        let tag = mac.finalize().into_bytes();

        let token = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(payload.as_bytes()),
            URL_SAFE_NO_PAD.encode(tag)
        );

        IssuedToken {
            token,
            claims: Claims {
                principal_id,
                issued_at,
                expires_at,
            },
        }
    }

    /// Verify a token against the current time.
    pub fn verify(&self, token: &str) -> TokenResult<Claims> {
        self.verify_at(token, OffsetDateTime::now_utc())
    }

    /// Verify a token as if the current time were `now`.
    ///
    /// The signature is checked before the payload is interpreted, so a
    /// forged payload is reported as `BadSignature` rather than `Malformed`.
    pub fn verify_at(&self, token: &str, now: OffsetDateTime) -> TokenResult<Claims> {
        let (payload_b64, tag_b64) = token
            .split_once('.')
            .ok_or(TokenError::Malformed("missing separator"))?;
        if payload_b64.is_empty() || tag_b64.is_empty() || tag_b64.contains('.') {
            return Err(TokenError::Malformed("unexpected segment layout"));
        }

        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| TokenError::Malformed("payload is not base64url"))?;
        let tag = URL_SAFE_NO_PAD
            .decode(tag_b64)
            .map_err(|_| TokenError::Malformed("signature is not base64url"))?;

        let mut mac = self.key.mac();
        mac.update(&payload);
        mac.verify_slice(&tag).map_err(|_| TokenError::BadSignature)?;

        let wire: WireClaims = serde_json::from_slice(&payload)
            .map_err(|_| TokenError::Malformed("payload is not valid claims"))?;
        let issued_at = OffsetDateTime::from_unix_timestamp(wire.iat)
            .map_err(|_| TokenError::Malformed("issued-at out of range"))?;
        let expires_at = OffsetDateTime::from_unix_timestamp(wire.exp)
            .map_err(|_| TokenError::Malformed("expiry out of range"))?;

        if now > expires_at {
            return Err(TokenError::Expired);
        }

        Ok(Claims {
            principal_id: PrincipalId::new(wire.sub),
            issued_at,
            expires_at,
        })
    }
}

fn truncate_to_second(t: OffsetDateTime) -> OffsetDateTime {
    t - Duration::nanoseconds(i64::from(t.nanosecond()))
}
