//! Signed refresh-token format and owner resolution.
//!
//! # Responsibility
//! - Issue HS256 JWTs whose `iss` claim carries the owning email.
//! - Resolve the owning email of a stored token for cascade deletion.
//!
//! # Invariants
//! - Storage never checks expiry; expiry lives in the token itself.
//! - A token that fails to verify has no owner.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum TokenError {
    Jwt(jsonwebtoken::errors::Error),
    MissingIssuer,
}

impl TokenError {
    /// Returns true when the token verified but is past its `exp`.
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::Jwt(err) if matches!(err.kind(), ErrorKind::ExpiredSignature))
    }
}

impl Display for TokenError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Jwt(err) => write!(f, "invalid token: {err}"),
            Self::MissingIssuer => write!(f, "invalid token: empty issuer claim"),
        }
    }
}

impl Error for TokenError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Jwt(err) => Some(err),
            Self::MissingIssuer => None,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        Self::Jwt(value)
    }
}

/// Resolves which user a stored token belongs to.
///
/// Used by the user-deletion cascade; an `Err` marks the token as orphaned.
pub trait TokenOwner: Send + Sync {
    fn owner_of(&self, token: &str) -> Result<String, TokenError>;
}

impl<F> TokenOwner for F
where
    F: Fn(&str) -> Result<String, TokenError> + Send + Sync,
{
    fn owner_of(&self, token: &str) -> Result<String, TokenError> {
        self(token)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    iss: String,
    iat: i64,
    exp: i64,
}

/// HMAC-SHA256 codec for refresh and access tokens.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(signing_key: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(signing_key),
            decoding_key: DecodingKey::from_secret(signing_key),
            validation,
        }
    }

    /// Issues a token for `email` that expires `ttl` from now.
    pub fn issue(&self, email: &str, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            iss: email.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    /// Verifies `token` and returns its issuer email.
    pub fn owner(&self, token: &str) -> Result<String, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        if data.claims.iss.is_empty() {
            return Err(TokenError::MissingIssuer);
        }
        Ok(data.claims.iss)
    }
}

impl TokenOwner for TokenCodec {
    fn owner_of(&self, token: &str) -> Result<String, TokenError> {
        self.owner(token)
    }
}

#[cfg(test)]
mod tests {
    use super::{TokenCodec, TokenOwner};
    use chrono::Duration;

    #[test]
    fn issued_token_resolves_to_its_email() {
        let codec = TokenCodec::new(b"signing-key");
        let token = codec.issue("alice@example.com", Duration::hours(1)).unwrap();
        assert_eq!(codec.owner_of(&token).unwrap(), "alice@example.com");
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let codec = TokenCodec::new(b"signing-key");
        let token = codec
            .issue("alice@example.com", Duration::minutes(-5))
            .unwrap();
        let err = codec.owner(&token).unwrap_err();
        assert!(err.is_expired(), "unexpected error: {err}");
    }

    #[test]
    fn foreign_signature_and_garbage_have_no_owner() {
        let codec = TokenCodec::new(b"signing-key");
        let other = TokenCodec::new(b"other-key");
        let token = other.issue("bob@example.com", Duration::hours(1)).unwrap();

        let err = codec.owner(&token).unwrap_err();
        assert!(!err.is_expired());
        assert!(codec.owner("not-a-jwt").is_err());
    }
}
