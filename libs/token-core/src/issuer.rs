//! Token Issuance for Bootstrap and Test Flows
//!
//! The request pipeline only ever verifies tokens; issuance lives here for
//! the collaborators that need it (login flows, fixtures, integration
//! tests). Issued tokens always carry `sub`, `aud`, `iat`, `exp` and a
//! unique `jti`.

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use thiserror::Error;
use uuid::Uuid;

use crate::claims::Claims;

const DEFAULT_TOKEN_TTL_HOURS: i64 = 1;

/// Token signing failure
#[derive(Debug, Error)]
pub enum IssueError {
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Mints signed tokens carrying a claims object
pub struct TokenIssuer {
    key: EncodingKey,
    algorithm: Algorithm,
    ttl: Duration,
}

impl TokenIssuer {
    /// Build an issuer signing with an HMAC secret
    ///
    /// Default token lifetime is one hour.
    pub fn from_hmac_secret(secret: &[u8], algorithm: Algorithm) -> Self {
        Self {
            key: EncodingKey::from_secret(secret),
            algorithm,
            ttl: Duration::hours(DEFAULT_TOKEN_TTL_HOURS),
        }
    }

    /// Override the token lifetime
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Issue a token for a subject and audience with standard claims
    pub fn issue(&self, subject: &str, audience: &str) -> Result<String, IssueError> {
        let now = Utc::now();

        let mut claims = Claims::new();
        claims.insert("sub", subject);
        claims.insert("aud", audience);
        claims.insert("iat", now.timestamp());
        claims.insert("exp", (now + self.ttl).timestamp());
        claims.insert("jti", Uuid::new_v4().to_string());

        self.issue_claims(&claims)
    }

    /// Issue a token from a caller-supplied claims object
    ///
    /// No claims are added or rewritten; the caller owns the payload.
    pub fn issue_claims(&self, claims: &Claims) -> Result<String, IssueError> {
        encode(&Header::new(self.algorithm), claims, &self.key)
            .map_err(|e| IssueError::Signing(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &[u8] = b"unit-test-secret-material-0123456789";

    #[test]
    fn test_issued_token_has_three_parts() {
        let issuer = TokenIssuer::from_hmac_secret(TEST_SECRET, Algorithm::HS256);
        let token = issuer.issue("user-1", "internal-api").unwrap();

        assert_eq!(token.matches('.').count(), 2);
    }

    #[test]
    fn test_issued_claims_round_trip() {
        use crate::verifier::{JwtVerifier, TokenVerifier};

        let issuer = TokenIssuer::from_hmac_secret(TEST_SECRET, Algorithm::HS256);
        let token = issuer.issue("user-1", "internal-api").unwrap();

        let verifier =
            JwtVerifier::from_hmac_secret(TEST_SECRET, &[Algorithm::HS256]).unwrap();
        let claims = verifier.verify(&token).unwrap();

        assert_eq!(claims.subject(), Some("user-1"));
        assert_eq!(claims.audience(), Some("internal-api"));
        assert!(claims.get("jti").is_some());
        assert!(claims.expires_at().unwrap() > Utc::now().timestamp());
    }

    #[test]
    fn test_issue_claims_does_not_rewrite_payload() {
        use crate::verifier::{JwtVerifier, TokenVerifier};

        let issuer = TokenIssuer::from_hmac_secret(TEST_SECRET, Algorithm::HS256);

        let mut claims = Claims::new();
        claims.insert("sub", "svc-a");
        claims.insert("aud", "svc-b");
        let token = issuer.issue_claims(&claims).unwrap();

        let verifier = JwtVerifier::from_hmac_secret(TEST_SECRET, &[Algorithm::HS256])
            .unwrap()
            .without_expiry_validation();
        let decoded = verifier.verify(&token).unwrap();

        assert_eq!(decoded, claims);
    }
}
