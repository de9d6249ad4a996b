use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::extract::ApiQuery;
use crate::middleware::AuthUser;
use crate::models::Me;
use crate::oauth::{random_token, IdentityProvider, PkceParams};
use crate::repositories::{PendingLogin, PendingLoginRepository, SessionRepository, UserRepository};
use crate::session::{get_oauth_state, get_session_token, CookieSettings};

#[derive(Clone)]
pub struct AuthState {
    pub user_repo: UserRepository,
    pub session_repo: SessionRepository,
    pub pending_login_repo: PendingLoginRepository,
    pub provider: Arc<dyn IdentityProvider>,
    pub cookies: CookieSettings,
    /// Where the browser is sent after login and logout.
    pub frontend_origin: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// Start a login: remember state, nonce and PKCE verifier, then redirect to
/// the provider.
pub async fn login(State(state): State<AuthState>, jar: CookieJar) -> Result<(CookieJar, Redirect)> {
    let pkce = PkceParams::generate();
    let pending = PendingLogin {
        state: random_token(24),
        nonce: random_token(24),
        code_verifier: pkce.code_verifier.clone(),
    };
    let url = state
        .provider
        .authorize_url(&pending.state, &pending.nonce, &pkce.code_challenge)?;

    state.pending_login_repo.create(&pending).await?;

    let jar = jar.add(state.cookies.oauth_state_cookie(&pending.state));
    Ok((jar, Redirect::to(url.as_str())))
}

/// Finish a login. The `oauth_state` cookie is cleared whatever the outcome.
pub async fn callback(
    State(state): State<AuthState>,
    jar: CookieJar,
    ApiQuery(params): ApiQuery<CallbackParams>,
) -> Response {
    let result = complete_login(&state, &jar, params).await;
    let jar = jar.add(state.cookies.remove_oauth_state_cookie());
    match result {
        Ok(token) => (
            jar.add(state.cookies.session_cookie(&token)),
            Redirect::to(&state.frontend_origin),
        )
            .into_response(),
        Err(e) => (jar, e).into_response(),
    }
}

/// Validate the callback, redeem the code and open a session; returns the
/// session token.
async fn complete_login(
    state: &AuthState,
    jar: &CookieJar,
    params: CallbackParams,
) -> Result<String> {
    if let Some(error) = params.error {
        tracing::info!("Login denied by provider: {}", error);
        return Err(AppError::BadRequest("invalid callback".to_string()));
    }
    let (code, returned_state) = match (params.code, params.state) {
        (Some(code), Some(s)) if !code.is_empty() && !s.is_empty() => (code, s),
        _ => return Err(AppError::BadRequest("invalid callback".to_string())),
    };

    if get_oauth_state(jar).as_deref() != Some(returned_state.as_str()) {
        return Err(AppError::BadRequest("state mismatch".to_string()));
    }

    let pending = state
        .pending_login_repo
        .take(&returned_state)
        .await?
        .ok_or_else(|| AppError::BadRequest("login expired".to_string()))?;

    let access_token = state
        .provider
        .exchange_code(&code, &pending.code_verifier, &pending.nonce)
        .await?;
    let profile = state.provider.fetch_profile(&access_token).await?;

    let user = state
        .user_repo
        .upsert_from_profile(state.provider.name(), &profile)
        .await?;
    let token = state
        .session_repo
        .create(&user.id, state.cookies.session_ttl)
        .await?;
    tracing::info!(user_id = %user.id, provider = state.provider.name(), "User logged in");
    Ok(token)
}

pub async fn logout(State(state): State<AuthState>, jar: CookieJar) -> Result<(CookieJar, Redirect)> {
    if let Some(token) = get_session_token(&jar) {
        state.session_repo.delete(&token).await?;
        tracing::info!("User logged out");
    }
    let jar = jar.add(state.cookies.remove_session_cookie());
    Ok((jar, Redirect::to(&state.frontend_origin)))
}

pub async fn me(State(state): State<AuthState>, auth_user: AuthUser) -> Result<Json<Me>> {
    let user = state
        .user_repo
        .find_by_id(&auth_user.id)
        .await?
        .ok_or(AppError::Unauthorized)?;
    Ok(Json(Me::from(user)))
}
