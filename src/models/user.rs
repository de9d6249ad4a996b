use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::FromSqliteRow;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub provider: String,
    pub provider_user_id: String,
    pub name: Option<String>,
    #[serde(rename = "picture")]
    pub picture_url: Option<String>,
    pub email: Option<String>,
    pub status_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromSqliteRow for User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            provider: row.get("provider")?,
            provider_user_id: row.get("provider_user_id")?,
            name: row.get("name")?,
            picture_url: row.get("picture_url")?,
            email: row.get("email")?,
            status_message: row.get("status_message")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Profile returned by an identity provider after a successful login.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    pub subject: String,
    pub display_name: Option<String>,
    pub picture_url: Option<String>,
    pub email: Option<String>,
    pub status_message: Option<String>,
}

/// Body of `GET /api/me`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Me {
    pub provider: String,
    pub user_id: String,
    pub name: String,
    pub picture: Option<String>,
    pub status_message: Option<String>,
}

impl From<User> for Me {
    fn from(user: User) -> Self {
        Self {
            provider: user.provider,
            user_id: user.id,
            name: user.name.unwrap_or_default(),
            picture: user.picture_url,
            status_message: user.status_message,
        }
    }
}
