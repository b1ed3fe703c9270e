//! Access token issuance and validation
//!
//! Tokens are compact HS256 JWS carrying subject, role, and expiry. The PIN
//! itself never enters a token. Validation runs with zero leeway: a token is
//! accepted until its expiry instant and rejected after it. There is no
//! refresh or rotation; an expired token means logging in again.

use crate::auth::guard::Role;
use crate::{Error, Result};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Claims embedded in an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: "admin" or the guest row id as a string.
    pub sub: String,
    /// Principal role.
    pub role: Role,
    /// Expiry as a unix timestamp.
    pub exp: i64,
}

/// Issues and validates signed access tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_minutes: i64,
}

impl TokenService {
    pub fn new(secret: &str, ttl_minutes: i64) -> TokenService {
        TokenService {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_minutes,
        }
    }

    /// Issue a token for the given subject and role, expiring TTL minutes
    /// from now.
    pub fn issue(&self, subject: &str, role: Role) -> Result<String> {
        let exp = (Utc::now() + chrono::Duration::minutes(self.ttl_minutes)).timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            role,
            exp,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| Error::Internal(format!("token encoding failed: {}", e)))
    }

    /// Validate signature and expiry, returning the claims.
    ///
    /// Every failure mode (malformed, bad signature, expired) collapses to
    /// `InvalidToken`; callers do not learn why a token was rejected.
    pub fn validate(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Token validation failed: {}", e);
                Error::InvalidToken
            })
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl_minutes", &self.ttl_minutes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_validates_and_round_trips_claims() {
        let service = TokenService::new("test-secret", 60);
        let token = service.issue("42", Role::Guest).unwrap();

        let claims = service.validate(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.role, Role::Guest);
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn expired_token_is_rejected() {
        // Negative TTL mints a token already past its expiry
        let service = TokenService::new("test-secret", -5);
        let token = service.issue("admin", Role::Admin).unwrap();

        assert!(matches!(
            service.validate(&token),
            Err(Error::InvalidToken)
        ));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let issuer = TokenService::new("secret-a", 60);
        let verifier = TokenService::new("secret-b", 60);
        let token = issuer.issue("admin", Role::Admin).unwrap();

        assert!(matches!(
            verifier.validate(&token),
            Err(Error::InvalidToken)
        ));
    }

    #[test]
    fn garbage_token_is_rejected() {
        let service = TokenService::new("test-secret", 60);
        assert!(matches!(
            service.validate("not-a-token"),
            Err(Error::InvalidToken)
        ));
        assert!(matches!(service.validate(""), Err(Error::InvalidToken)));
    }

    #[test]
    fn token_never_contains_the_pin() {
        let service = TokenService::new("test-secret", 60);
        let token = service.issue("admin", Role::Admin).unwrap();
        // Claims are only {sub, role, exp}; spot-check the payload segment
        let payload = token.split('.').nth(1).unwrap();
        assert!(!payload.is_empty());
        let claims = service.validate(&token).unwrap();
        assert_eq!(
            serde_json::to_value(&claims).unwrap()
                .as_object()
                .unwrap()
                .len(),
            3
        );
    }
}
