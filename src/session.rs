use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;

use crate::config::Config;
use crate::repositories::pending_login_repo::PENDING_LOGIN_TTL_MINUTES;

pub const SESSION_COOKIE_NAME: &str = "session";
pub const OAUTH_STATE_COOKIE_NAME: &str = "oauth_state";

/// Attributes shared by every cookie the server issues.
#[derive(Clone, Debug)]
pub struct CookieSettings {
    pub secure: bool,
    pub session_ttl: chrono::Duration,
}

impl CookieSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            secure: config.cookie_secure,
            session_ttl: config.session_ttl(),
        }
    }

    fn build(&self, name: &'static str, value: String, max_age: time::Duration) -> Cookie<'static> {
        // A cross-site frontend only sends the cookie with SameSite=None, which requires Secure
        let same_site = if self.secure {
            SameSite::None
        } else {
            SameSite::Lax
        };
        Cookie::build((name, value))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(same_site)
            .max_age(max_age)
            .build()
    }

    pub fn session_cookie(&self, token: &str) -> Cookie<'static> {
        let max_age = time::Duration::seconds(self.session_ttl.num_seconds());
        self.build(SESSION_COOKIE_NAME, token.to_string(), max_age)
    }

    pub fn remove_session_cookie(&self) -> Cookie<'static> {
        self.build(SESSION_COOKIE_NAME, String::new(), time::Duration::ZERO)
    }

    pub fn oauth_state_cookie(&self, state: &str) -> Cookie<'static> {
        let max_age = time::Duration::minutes(PENDING_LOGIN_TTL_MINUTES);
        self.build(OAUTH_STATE_COOKIE_NAME, state.to_string(), max_age)
    }

    pub fn remove_oauth_state_cookie(&self) -> Cookie<'static> {
        self.build(OAUTH_STATE_COOKIE_NAME, String::new(), time::Duration::ZERO)
    }
}

pub fn get_session_token(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE_NAME)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

pub fn get_oauth_state(jar: &CookieJar) -> Option<String> {
    jar.get(OAUTH_STATE_COOKIE_NAME)
        .map(|cookie| cookie.value().to_string())
        .filter(|state| !state.is_empty())
}
