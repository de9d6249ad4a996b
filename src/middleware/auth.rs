use axum::{extract::FromRequestParts, http::request::Parts, Extension};
use axum_extra::extract::CookieJar;

use crate::error::AppError;
use crate::repositories::SessionRepository;
use crate::session::get_session_token;

/// The user behind a valid session cookie. Extracting it from a request
/// without one rejects with 401.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: String,
    pub token: String,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Extension(sessions) = Extension::<SessionRepository>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let jar = CookieJar::from_headers(&parts.headers);
        let token = get_session_token(&jar).ok_or(AppError::Unauthorized)?;

        let user_id = sessions
            .find_valid(&token)
            .await?
            .ok_or(AppError::Unauthorized)?;

        Ok(AuthUser { id: user_id, token })
    }
}
