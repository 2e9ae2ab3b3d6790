//! Bearer-token authentication.

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use chrono::Utc;
use gagyebu_core::UserId;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: u64,
}

pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtKeys {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn issue(
        &self,
        user: &UserId,
        ttl: chrono::Duration,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let exp = (Utc::now() + ttl).timestamp().max(0) as u64;
        let claims = Claims { sub: user.as_str().to_string(), exp };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
    }

    /// `None` for any token that is malformed, forged, or expired.
    pub fn verify(&self, token: &str) -> Option<UserId> {
        match decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) if !data.claims.sub.is_empty() => Some(UserId::new(data.claims.sub)),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!("Rejected bearer token: {e}");
                None
            }
        }
    }
}

/// The caller behind a request, if it presented a valid token. Never rejects
/// on its own; handlers decide whether an anonymous caller is acceptable.
#[derive(Debug, Clone)]
pub struct Caller(pub Option<UserId>);

impl Caller {
    pub fn require(self) -> Result<UserId, ApiError> {
        self.0.ok_or(ApiError::Unauthorized)
    }
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .and_then(|token| state.jwt.verify(token.trim()));
        Ok(Caller(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies() {
        let keys = JwtKeys::from_secret(b"test-secret");
        let token = keys.issue(&UserId::new("u1"), chrono::Duration::hours(1)).unwrap();
        assert_eq!(keys.verify(&token), Some(UserId::new("u1")));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = JwtKeys::from_secret(b"a")
            .issue(&UserId::new("u1"), chrono::Duration::hours(1))
            .unwrap();
        assert_eq!(JwtKeys::from_secret(b"b").verify(&token), None);
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = JwtKeys::from_secret(b"test-secret");
        let token = keys.issue(&UserId::new("u1"), chrono::Duration::hours(-2)).unwrap();
        assert_eq!(keys.verify(&token), None);
    }

    #[test]
    fn garbage_is_rejected() {
        let keys = JwtKeys::from_secret(b"test-secret");
        assert_eq!(keys.verify("not.a.jwt"), None);
        assert_eq!(keys.verify(""), None);
    }

    #[test]
    fn require_maps_to_unauthorized() {
        assert!(matches!(Caller(None).require(), Err(ApiError::Unauthorized)));
        assert_eq!(Caller(Some(UserId::new("u1"))).require().unwrap(), UserId::new("u1"));
    }
}
