use std::env;

use chrono::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Origin of the browser frontend; used for CORS and post-login redirects.
    pub frontend_origin: String,
    pub line_channel_id: String,
    pub line_channel_secret: String,
    pub line_redirect_uri: String,
    /// When set, cookies are issued with `Secure; SameSite=None` so a
    /// frontend on another origin can send them.
    pub cookie_secure: bool,
    pub session_ttl_hours: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:logbook.db?mode=rwc".to_string()),
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_port(env::var("PORT").ok()),
            frontend_origin: env::var("FRONTEND_ORIGIN")
                .map(|origin| origin.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            line_channel_id: env::var("LINE_CHANNEL_ID").unwrap_or_default(),
            line_channel_secret: env::var("LINE_CHANNEL_SECRET").unwrap_or_default(),
            line_redirect_uri: env::var("LINE_REDIRECT_URI").unwrap_or_else(|_| {
                "http://localhost:3000/api/auth/line/callback".to_string()
            }),
            cookie_secure: env::var("COOKIE_SECURE")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            session_ttl_hours: env::var("SESSION_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|hours: &i64| *hours > 0)
                .unwrap_or(24),
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::hours(self.session_ttl_hours)
    }
}

const DEFAULT_PORT: u16 = 3000;

fn parse_port(raw: Option<String>) -> u16 {
    let Some(raw) = raw else {
        return DEFAULT_PORT;
    };
    match raw.trim().parse() {
        Ok(port) => port,
        Err(e) => {
            tracing::warn!("Invalid PORT {:?} ({}), using {}", raw, e, DEFAULT_PORT);
            DEFAULT_PORT
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port(None), DEFAULT_PORT);
        assert_eq!(parse_port(Some("8080".to_string())), 8080);
        assert_eq!(parse_port(Some(" 8081 ".to_string())), 8081);
    }

    #[test]
    fn test_parse_port_rejects_garbage() {
        assert_eq!(parse_port(Some("80a0".to_string())), DEFAULT_PORT);
        assert_eq!(parse_port(Some("70000".to_string())), DEFAULT_PORT);
        assert_eq!(parse_port(Some(String::new())), DEFAULT_PORT);
    }
}
