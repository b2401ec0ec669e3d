//! Authentication Models
//!
//! Claims carried by the bearer token minted on registration and login.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims structure for auth tokens
///
/// The subject is the identity provider's identifier for the account, not the
/// local profile id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthTokenClaims {
    /// Subject - identity provider id
    pub sub: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// JWT ID - unique token identifier
    pub jti: String,
}

impl AuthTokenClaims {
    /// Create new auth token claims
    pub fn new(subject: &str, expires_at: DateTime<Utc>, issued_at: DateTime<Utc>) -> Self {
        Self {
            sub: subject.to_string(),
            exp: expires_at.timestamp(),
            iat: issued_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }
}

/// Signed token together with the window it is valid for
#[derive(Debug, Clone)]
pub struct AuthToken {
    pub token: String,
    pub subject: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_token_claims_creation() {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::hours(1);

        let claims = AuthTokenClaims::new("uid-abc", expires_at, now);

        assert_eq!(claims.sub, "uid-abc");
        assert_eq!(claims.exp, expires_at.timestamp());
        assert_eq!(claims.iat, now.timestamp());
        assert_eq!(claims.exp - claims.iat, 3600);
        assert!(!claims.jti.is_empty());
        assert_eq!(claims.expires_at().timestamp(), expires_at.timestamp());
    }

    #[test]
    fn test_claims_have_unique_ids() {
        let now = Utc::now();
        let a = AuthTokenClaims::new("uid", now, now);
        let b = AuthTokenClaims::new("uid", now, now);
        assert_ne!(a.jti, b.jti);
    }
}
