use rusqlite::OptionalExtension;
use uuid::Uuid;

use crate::db::{self, to_sql_timestamp, DbPool};
use crate::error::{AppError, Result};
use crate::models::{FromSqliteRow, Profile, User};

#[derive(Clone)]
pub struct UserRepository {
    pool: DbPool,
}

impl UserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let pool = self.pool.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare("SELECT * FROM users WHERE id = ?")?;
            let result = stmt.query_row([&id], User::from_row).optional()?;
            Ok(result)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Find the user for a provider subject, creating it on first login.
    /// Profile fields are refreshed from the provider on every login.
    pub async fn upsert_from_profile(&self, provider: &str, profile: &Profile) -> Result<User> {
        let pool = self.pool.clone();
        let provider = provider.to_string();
        let profile = profile.clone();
        let now = to_sql_timestamp(&db::now());

        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            conn.execute(
                "INSERT INTO users
                    (id, provider, provider_user_id, name, picture_url, email, status_message, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(provider, provider_user_id) DO UPDATE SET
                    name = excluded.name,
                    picture_url = excluded.picture_url,
                    email = COALESCE(excluded.email, users.email),
                    status_message = excluded.status_message,
                    updated_at = excluded.updated_at",
                rusqlite::params![
                    Uuid::new_v4().to_string(),
                    provider,
                    profile.subject,
                    profile.display_name,
                    profile.picture_url,
                    profile.email,
                    profile.status_message,
                    now,
                    now
                ],
            )?;

            let mut stmt =
                conn.prepare("SELECT * FROM users WHERE provider = ? AND provider_user_id = ?")?;
            let user = stmt.query_row(
                rusqlite::params![provider, profile.subject],
                User::from_row,
            )?;
            Ok(user)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }
}
