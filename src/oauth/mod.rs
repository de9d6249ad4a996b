//! Redirect-based login against an external identity provider.

pub mod line;
pub mod pkce;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

use crate::error::AppError;
use crate::models::Profile;

pub use line::LineProvider;
pub use pkce::{random_token, PkceParams};

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("provider is not configured: {0}")]
    NotConfigured(String),

    #[error("invalid provider url: {0}")]
    Url(#[from] url::ParseError),

    #[error("request to provider failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider responded with {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid id_token: {0}")]
    IdToken(String),
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotConfigured(msg) => AppError::Internal(msg),
            ProviderError::Url(e) => AppError::Internal(e.to_string()),
            other => {
                // Provider bodies stay in the log, not in the browser
                tracing::warn!("Identity provider error: {}", other);
                AppError::BadGateway("login failed".to_string())
            }
        }
    }
}

/// An OAuth 2.0 authorization-code provider with PKCE.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Stored as `users.provider`.
    fn name(&self) -> &str;

    /// Where to send the browser to start a login.
    fn authorize_url(
        &self,
        state: &str,
        nonce: &str,
        code_challenge: &str,
    ) -> Result<Url, ProviderError>;

    /// Trade the callback `code` for an access token. The `nonce` sent with
    /// the authorize request must come back in the issued ID token.
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
        nonce: &str,
    ) -> Result<String, ProviderError>;

    async fn fetch_profile(&self, access_token: &str) -> Result<Profile, ProviderError>;
}
