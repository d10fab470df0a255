//! JWT Token Handler
//! Mission: Issue bearer tokens and validate them in a single verified step

use crate::auth::models::{Claims, User};
use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use tracing::debug;

/// Default token lifetime
pub const DEFAULT_EXPIRATION_HOURS: i64 = 3;

/// JWT Handler for token operations
pub struct JwtHandler {
    secret: String,
    ttl: Duration,
}

impl JwtHandler {
    /// Create a new JWT handler with secret key and 3-hour tokens
    pub fn new(secret: String) -> Self {
        Self::with_ttl(secret, Duration::hours(DEFAULT_EXPIRATION_HOURS))
    }

    /// Create a handler issuing tokens that live for `ttl`
    pub fn with_ttl(secret: String, ttl: Duration) -> Self {
        Self { secret, ttl }
    }

    /// Generate a JWT token for a user
    pub fn generate_token(&self, user: &User) -> Result<(String, usize)> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(self.ttl)
            .context("Invalid timestamp")?
            .timestamp()
            .max(0) as usize;

        let expires_in = self.ttl.num_seconds().max(0) as usize;

        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            iat: now.timestamp().max(0) as usize,
            exp: expiration,
        };

        debug!(
            "Generating JWT for user {} ({}), expires in {}s",
            user.username, user.id, expires_in
        );

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .context("Failed to generate JWT")?;

        Ok((token, expires_in))
    }

    /// Validate signature and expiry, then return the claims.
    ///
    /// This is the only way to read a token's payload. Only HS256 tokens
    /// carrying both `sub` and `exp` are accepted.
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => debug!("Rejected expired token"),
                ErrorKind::InvalidSignature => debug!("Rejected token with bad signature"),
                kind => debug!("Rejected token: {:?}", kind),
            }
            anyhow::Error::new(e).context("Invalid or expired token")
        })?;

        debug!("Validated JWT for user {}", claims.username);
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn diner() -> User {
        User {
            id: Uuid::new_v4(),
            username: "margot".to_string(),
            password_hash: "hash".to_string(),
            created_at: Utc::now().to_rfc3339(),
        }
    }

    #[test]
    fn test_claims_identify_the_user() {
        let handler = JwtHandler::new("kitchen-secret".to_string());
        let user = diner();

        let (token, _) = handler.generate_token(&user).unwrap();
        let claims = handler.validate_token(&token).unwrap();

        assert_eq!(claims.user_id(), Some(user.id));
        assert_eq!(claims.username, "margot");
    }

    #[test]
    fn test_default_lifetime_is_three_hours() {
        let handler = JwtHandler::new("kitchen-secret".to_string());
        let before = Utc::now().timestamp() as usize;

        let (token, expires_in) = handler.generate_token(&diner()).unwrap();
        let claims = handler.validate_token(&token).unwrap();

        assert_eq!(expires_in, 10_800);
        assert_eq!(claims.exp - claims.iat, 10_800);
        assert!(claims.iat >= before);
    }

    #[test]
    fn test_configured_lifetime() {
        let handler = JwtHandler::with_ttl("kitchen-secret".to_string(), Duration::minutes(30));

        let (token, expires_in) = handler.generate_token(&diner()).unwrap();
        let claims = handler.validate_token(&token).unwrap();

        assert_eq!(expires_in, 1_800);
        assert_eq!(claims.exp - claims.iat, 1_800);
    }

    #[test]
    fn test_token_from_another_server_rejected() {
        let ours = JwtHandler::new("kitchen-secret".to_string());
        let theirs = JwtHandler::new("other-kitchen".to_string());

        let (token, _) = theirs.generate_token(&diner()).unwrap();
        assert!(ours.validate_token(&token).is_err());
    }

    #[test]
    fn test_other_algorithm_rejected() {
        let handler = JwtHandler::new("kitchen-secret".to_string());
        let user = diner();
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username,
            iat: now,
            exp: now + 3600,
        };

        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"kitchen-secret"),
        )
        .unwrap();

        assert!(handler.validate_token(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        // Well past the default 60s validation leeway
        let handler = JwtHandler::with_ttl("kitchen-secret".to_string(), Duration::hours(-1));

        let (token, expires_in) = handler.generate_token(&diner()).unwrap();
        assert_eq!(expires_in, 0);
        assert!(handler.validate_token(&token).is_err());
    }
}
