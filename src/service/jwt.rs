//! JWT Token Issuer
//!
//! Mints and checks the bearer token handed out on registration and login.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use crate::models::{AuthToken, AuthTokenClaims};

/// Lifetime of every issued token
pub const TOKEN_LIFETIME_HOURS: i64 = 1;

/// Token issuer errors
#[derive(Error, Debug)]
pub enum TokenError {
    /// Signing the claims failed
    #[error("Token generation failed: {0}")]
    Generation(String),

    /// The token is malformed, expired or signed with another secret
    #[error("Invalid token: {0}")]
    Invalid(String),
}

/// Result type for token operations
pub type TokenResult<T> = Result<T, TokenError>;

/// Signs HS256 tokens with the process-wide secret
///
/// The secret is read once at startup and never changes afterwards, so the issuer
/// can be shared freely between request handlers.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: Duration,
}

impl TokenIssuer {
    /// Create a new token issuer from the signing secret
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            lifetime: Duration::hours(TOKEN_LIFETIME_HOURS),
        }
    }

    /// Mint a token bound to the given subject, valid for one hour
    pub fn issue(&self, subject: &str) -> TokenResult<AuthToken> {
        let issued_at = Utc::now();
        let expires_at = issued_at + self.lifetime;
        let claims = AuthTokenClaims::new(subject, expires_at, issued_at);

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Generation(e.to_string()))?;

        Ok(AuthToken {
            token,
            subject: claims.sub,
            issued_at,
            expires_at,
        })
    }

    /// Check signature and expiry, returning the embedded claims
    pub fn verify(&self, token: &str) -> TokenResult<AuthTokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_aud = false;
        // Expiry is exact; no grace period past `exp`
        validation.leeway = 0;

        decode::<AuthTokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| TokenError::Invalid(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issued_token_verifies_with_same_secret() {
        let issuer = TokenIssuer::new("test_signing_secret");
        let issued = issuer.issue("uid-42").unwrap();

        let claims = issuer.verify(&issued.token).unwrap();
        assert_eq!(claims.sub, "uid-42");
        assert_eq!(issued.subject, "uid-42");
        assert_eq!(claims.exp, issued.expires_at.timestamp());
    }

    #[test]
    fn test_token_lifetime_is_one_hour() {
        let issuer = TokenIssuer::new("test_signing_secret");
        let issued = issuer.issue("uid-42").unwrap();

        assert_eq!((issued.expires_at - issued.issued_at).num_seconds(), 3600);
        let claims = issuer.verify(&issued.token).unwrap();
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_token_rejected_with_other_secret() {
        let issuer = TokenIssuer::new("test_signing_secret");
        let other = TokenIssuer::new("another_secret");
        let issued = issuer.issue("uid-42").unwrap();

        assert!(matches!(
            other.verify(&issued.token),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let issuer = TokenIssuer::new("test_signing_secret");
        let issued_at = Utc::now() - Duration::hours(3);
        let claims = AuthTokenClaims::new("uid-42", issued_at + Duration::hours(1), issued_at);
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test_signing_secret"),
        )
        .unwrap();

        assert!(issuer.verify(&token).is_err());
    }

    #[test]
    fn test_token_rejected_just_after_expiry() {
        let issuer = TokenIssuer::new("test_signing_secret");
        let now = Utc::now();
        let claims = AuthTokenClaims::new(
            "uid-42",
            now - Duration::seconds(5),
            now - Duration::hours(1) - Duration::seconds(5),
        );
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test_signing_secret"),
        )
        .unwrap();

        assert!(matches!(issuer.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let issuer = TokenIssuer::new("test_signing_secret");
        assert!(issuer.verify("not.a.token").is_err());
    }
}
