use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use super::jwt::{JwtKeys, TokenError};
use crate::error::AppError;

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Authorization header required")]
    MissingHeader,
    #[error("Invalid authorization format. Must be 'Bearer <token>'")]
    MalformedHeader,
    #[error("{0}")]
    Token(#[from] TokenError),
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        AppError::Unauthorized(e.to_string())
    }
}

/// Identity of the caller, proven by a bearer token. Taking this as a
/// handler argument makes the route protected: a request without a valid
/// token is answered with 401 before the handler body runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        authenticate(&parts.headers, &keys)
            .map(AuthUser)
            .map_err(|e| {
                warn!(reason = %e, "request rejected by auth gate");
                e.into()
            })
    }
}

fn authenticate(headers: &axum::http::HeaderMap, keys: &JwtKeys) -> Result<i64, AuthError> {
    let header = headers.get(AUTHORIZATION).ok_or(AuthError::MissingHeader)?;
    let header = header.to_str().map_err(|_| AuthError::MalformedHeader)?;
    let token = header
        .strip_prefix(BEARER_PREFIX)
        .ok_or(AuthError::MalformedHeader)?;
    let claims = keys.validate(token)?;
    Ok(claims.user_id)
}
