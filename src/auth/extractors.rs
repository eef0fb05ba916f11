use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tower_cookies::Cookies;
use tracing::{error, warn};
use uuid::Uuid;

use super::{cookie, session::SessionKeys};
use crate::error::AppError;

/// Identity of the caller, resolved from the session cookie.
///
/// A missing cookie and an invalid one are indistinguishable to the caller:
/// both reject with [`AppError::Unauthorized`].
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let cookies = Cookies::from_request_parts(parts, state)
            .await
            .map_err(|(status, msg)| {
                error!(%status, msg, "cookie layer missing");
                AppError::Internal(anyhow::anyhow!(msg))
            })?;

        let token = cookie::retrieve(&cookies).ok_or(AppError::Unauthorized)?;

        let keys = SessionKeys::from_ref(state);
        let claims = keys.validate(&token).ok_or_else(|| {
            warn!("invalid or expired session");
            AppError::Unauthorized
        })?;

        Ok(AuthUser {
            id: claims.sub,
            username: claims.username,
        })
    }
}
