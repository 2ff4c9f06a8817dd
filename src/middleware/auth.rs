use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::{
    auth::TokenService,
    error::AppError,
    models::UserId,
};

/// The authenticated caller, taken from the `Authorization: Bearer` header.
///
/// A missing header or one without a bearer token is `Unauthorized`; a token
/// that fails verification is `Forbidden`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: UserId,
    pub email: String,
}

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("No token provided".to_string()))?;

    header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Malformed token".to_string()))
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    TokenService: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = TokenService::from_ref(state).verify(token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            AppError::Forbidden("Invalid token".to_string())
        })?;

        Ok(AuthUser {
            id: claims.sub,
            email: claims.email,
        })
    }
}
