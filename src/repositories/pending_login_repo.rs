use chrono::{DateTime, Duration, Utc};
use rusqlite::OptionalExtension;

use crate::db::{self, to_sql_timestamp, DbPool};
use crate::error::{AppError, Result};

/// How long a started login may wait for the provider callback.
pub const PENDING_LOGIN_TTL_MINUTES: i64 = 10;

/// Values generated when a login starts and needed again at the callback.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingLogin {
    pub state: String,
    pub nonce: String,
    pub code_verifier: String,
}

#[derive(Clone)]
pub struct PendingLoginRepository {
    pool: DbPool,
}

impl PendingLoginRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, login: &PendingLogin) -> Result<()> {
        let pool = self.pool.clone();
        let login = login.clone();
        let now = db::now();
        let expires_at = now + Duration::minutes(PENDING_LOGIN_TTL_MINUTES);

        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            conn.execute(
                "INSERT INTO pending_logins (state, nonce, code_verifier, created_at, expires_at)
                 VALUES (?, ?, ?, ?, ?)",
                rusqlite::params![
                    login.state,
                    login.nonce,
                    login.code_verifier,
                    to_sql_timestamp(&now),
                    to_sql_timestamp(&expires_at)
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Remove and return the pending login for `state`, if it has not expired.
    /// The row is claimed by a single `DELETE ... RETURNING`, so concurrent
    /// callbacks with the same state get it at most once.
    pub async fn take(&self, state: &str) -> Result<Option<PendingLogin>> {
        let pool = self.pool.clone();
        let state = state.to_string();
        let now = Utc::now();

        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let row: Option<(String, String, DateTime<Utc>)> = conn
                .query_row(
                    "DELETE FROM pending_logins WHERE state = ?
                     RETURNING nonce, code_verifier, expires_at",
                    [&state],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()?;

            Ok(match row {
                Some((nonce, code_verifier, expires_at)) if expires_at > now => {
                    Some(PendingLogin {
                        state,
                        nonce,
                        code_verifier,
                    })
                }
                _ => None,
            })
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn cleanup_expired(&self) -> Result<usize> {
        let pool = self.pool.clone();
        let now = to_sql_timestamp(&Utc::now());

        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let removed =
                conn.execute("DELETE FROM pending_logins WHERE expires_at <= ?", [&now])?;
            Ok(removed)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }
}
