use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppResult,
    models::{User, UserId},
};

/// Payload carried by a bearer token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Caller identity
    pub sub: UserId,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies HS256 bearer tokens
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            ttl,
        }
    }

    /// Signs a token for `user` valid from now
    pub fn issue(&self, user: &User) -> AppResult<String> {
        self.issue_at(user, Utc::now())
    }

    pub fn issue_at(&self, user: &User, now: DateTime<Utc>) -> AppResult<String> {
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )?)
    }

    /// Checks signature and expiry, returning the claims
    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::AppError, models::NewUser};

    fn user() -> User {
        NewUser {
            email: "alice@example.com".to_string(),
            password_hash: String::new(),
            username: "alice".to_string(),
            avatar_url: None,
        }
        .into_user()
    }

    #[test]
    fn test_issued_token_verifies() {
        let tokens = TokenService::new("secret", Duration::hours(24));
        let user = user();

        let token = tokens.issue(&user).unwrap();
        let claims = tokens.verify(&token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = TokenService::new("secret", Duration::hours(24));
        let token = tokens
            .issue_at(&user(), Utc::now() - Duration::hours(48))
            .unwrap();

        assert!(matches!(tokens.verify(&token), Err(AppError::Token(_))));
    }

    #[test]
    fn test_token_signed_with_other_secret_rejected() {
        let issuer = TokenService::new("secret", Duration::hours(24));
        let verifier = TokenService::new("other", Duration::hours(24));
        let token = issuer.issue(&user()).unwrap();

        assert!(verifier.verify(&token).is_err());
    }
}
