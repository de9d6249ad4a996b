use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;
use url::Url;

use super::{IdentityProvider, ProviderError};
use crate::config::Config;
use crate::models::Profile;

const AUTHORIZE_URL: &str = "https://access.line.me/oauth2/v2.1/authorize";
const TOKEN_URL: &str = "https://api.line.me/oauth2/v2.1/token";
const PROFILE_URL: &str = "https://api.line.me/v2/profile";
const SCOPE: &str = "openid profile";

/// LINE Login v2.1.
pub struct LineProvider {
    client: reqwest::Client,
    channel_id: String,
    channel_secret: String,
    redirect_uri: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    id_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    nonce: Option<String>,
}

/// Compare the `nonce` claim of an ID token with the one sent at login.
///
/// The token comes straight from the token endpoint over TLS, so only the
/// payload is read; the signature is not checked here.
fn verify_nonce(id_token: &str, expected: &str) -> Result<(), ProviderError> {
    let payload = id_token
        .split('.')
        .nth(1)
        .ok_or_else(|| ProviderError::IdToken("malformed token".to_string()))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| ProviderError::IdToken(e.to_string()))?;
    let claims: IdTokenClaims =
        serde_json::from_slice(&bytes).map_err(|e| ProviderError::IdToken(e.to_string()))?;

    match claims.nonce {
        Some(nonce) if nonce == expected => Ok(()),
        _ => Err(ProviderError::IdToken("nonce mismatch".to_string())),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LineProfile {
    user_id: String,
    display_name: Option<String>,
    picture_url: Option<String>,
    status_message: Option<String>,
}

impl From<LineProfile> for Profile {
    fn from(p: LineProfile) -> Self {
        Profile {
            subject: p.user_id,
            display_name: p.display_name,
            picture_url: p.picture_url,
            email: None,
            status_message: p.status_message,
        }
    }
}

impl LineProvider {
    pub fn new(channel_id: &str, channel_secret: &str, redirect_uri: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            channel_id: channel_id.to_string(),
            channel_secret: channel_secret.to_string(),
            redirect_uri: redirect_uri.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.line_channel_id,
            &config.line_channel_secret,
            &config.line_redirect_uri,
        )
    }

    fn ensure_configured(&self) -> Result<(), ProviderError> {
        if self.channel_id.is_empty() || self.channel_secret.is_empty() {
            return Err(ProviderError::NotConfigured(
                "LINE_CHANNEL_ID and LINE_CHANNEL_SECRET must be set".to_string(),
            ));
        }
        Ok(())
    }
}

async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl IdentityProvider for LineProvider {
    fn name(&self) -> &str {
        "line"
    }

    fn authorize_url(
        &self,
        state: &str,
        nonce: &str,
        code_challenge: &str,
    ) -> Result<Url, ProviderError> {
        self.ensure_configured()?;
        let url = Url::parse_with_params(
            AUTHORIZE_URL,
            &[
                ("response_type", "code"),
                ("client_id", self.channel_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("state", state),
                ("scope", SCOPE),
                ("nonce", nonce),
                ("code_challenge", code_challenge),
                ("code_challenge_method", "S256"),
            ],
        )?;
        Ok(url)
    }

    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
        nonce: &str,
    ) -> Result<String, ProviderError> {
        self.ensure_configured()?;
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("client_id", self.channel_id.as_str()),
            ("client_secret", self.channel_secret.as_str()),
            ("code_verifier", code_verifier),
        ];
        let response = self.client.post(TOKEN_URL).form(&params).send().await?;
        let token: TokenResponse = error_for_status(response).await?.json().await?;
        let id_token = token
            .id_token
            .ok_or_else(|| ProviderError::IdToken("missing from token response".to_string()))?;
        verify_nonce(&id_token, nonce)?;
        Ok(token.access_token)
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<Profile, ProviderError> {
        let response = self
            .client
            .get(PROFILE_URL)
            .bearer_auth(access_token)
            .send()
            .await?;
        let profile: LineProfile = error_for_status(response).await?.json().await?;
        Ok(profile.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_authorize_url_carries_pkce_and_nonce() {
        let provider = LineProvider::new("1234", "secret", "http://localhost:3000/cb");

        let url = provider
            .authorize_url("st4te", "n0nce", "ch4llenge")
            .unwrap();
        let query: HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(url.host_str(), Some("access.line.me"));
        assert_eq!(query["client_id"], "1234");
        assert_eq!(query["redirect_uri"], "http://localhost:3000/cb");
        assert_eq!(query["scope"], "openid profile");
        assert_eq!(query["state"], "st4te");
        assert_eq!(query["nonce"], "n0nce");
        assert_eq!(query["code_challenge"], "ch4llenge");
        assert_eq!(query["code_challenge_method"], "S256");
    }

    #[test]
    fn test_unconfigured_provider_refuses_login() {
        let provider = LineProvider::new("", "", "http://localhost:3000/cb");

        assert!(matches!(
            provider.authorize_url("s", "n", "c"),
            Err(ProviderError::NotConfigured(_))
        ));
    }

    fn id_token(claims: &str) -> String {
        format!(
            "{}.{}.signature",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
            URL_SAFE_NO_PAD.encode(claims)
        )
    }

    #[test]
    fn test_verify_nonce_accepts_matching_claim() {
        let token = id_token(r#"{"iss":"https://access.line.me","sub":"U42","nonce":"n0nce"}"#);

        assert!(verify_nonce(&token, "n0nce").is_ok());
    }

    #[test]
    fn test_verify_nonce_rejects_replayed_token() {
        let token = id_token(r#"{"sub":"U42","nonce":"someone-else"}"#);

        assert!(matches!(
            verify_nonce(&token, "n0nce"),
            Err(ProviderError::IdToken(_))
        ));
    }

    #[test]
    fn test_verify_nonce_rejects_missing_claim_and_garbage() {
        assert!(verify_nonce(&id_token(r#"{"sub":"U42"}"#), "n0nce").is_err());
        assert!(verify_nonce("not-a-jwt", "n0nce").is_err());
        assert!(verify_nonce("a.!!!.c", "n0nce").is_err());
    }

    #[test]
    fn test_profile_maps_line_fields() {
        let json = r#"{"userId":"U42","displayName":"Hanako","pictureUrl":"https://p/x.png"}"#;
        let line: LineProfile = serde_json::from_str(json).unwrap();

        let profile = Profile::from(line);

        assert_eq!(profile.subject, "U42");
        assert_eq!(profile.display_name.as_deref(), Some("Hanako"));
        assert_eq!(profile.status_message, None);
    }
}
