use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use uuid::Uuid;

use cardcraft_core::UserId;

use super::error::{ApiError, ErrorCode};

/// Authenticated caller. Session verification is delegated to the fronting
/// identity provider, which validates the session and forwards the verified
/// subject id as the bearer token. A missing or malformed token is rejected
/// before any handler runs.
#[derive(Clone, Copy, Debug)]
pub struct CurrentUser(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .and_then(|t| Uuid::parse_str(t.trim()).ok())
            .map(CurrentUser)
            .ok_or_else(|| ApiError::new(ErrorCode::Unauthorized, "Authentication required"))
    }
}
