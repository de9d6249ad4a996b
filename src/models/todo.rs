use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::FromSqliteRow;
use crate::error::{AppError, Result};

pub const MAX_CONTENT_CHARS: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: i64,
    pub user_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromSqliteRow for Todo {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            content: row.get("content")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Body of `POST /api/todos` and `PUT /api/todos/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TodoInput {
    #[serde(default)]
    pub content: String,
}

/// Trim todo content and check it is non-empty and within the length limit.
pub fn validate_content(content: &str) -> Result<String> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::Validation("content is required".to_string()));
    }
    if content.chars().count() > MAX_CONTENT_CHARS {
        return Err(AppError::Validation("content too long".to_string()));
    }
    Ok(content.to_string())
}

/// Todo ids in paths must be positive integers.
pub fn parse_todo_id(raw: &str) -> Result<i64> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::BadRequest("invalid id".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_content_trims() {
        assert_eq!(validate_content("  buy chalk ").unwrap(), "buy chalk");
    }

    #[test]
    fn test_validate_content_rejects_blank() {
        assert!(matches!(validate_content(""), Err(AppError::Validation(_))));
        assert!(matches!(
            validate_content(" \t\n "),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_content_length_counts_chars() {
        let at_limit = "筋".repeat(MAX_CONTENT_CHARS);
        assert!(validate_content(&at_limit).is_ok());

        let over = "a".repeat(MAX_CONTENT_CHARS + 1);
        assert!(matches!(
            validate_content(&over),
            Err(AppError::Validation(msg)) if msg == "content too long"
        ));
    }

    #[test]
    fn test_parse_todo_id() {
        assert_eq!(parse_todo_id("42").unwrap(), 42);
        assert!(parse_todo_id("0").is_err());
        assert!(parse_todo_id("-3").is_err());
        assert!(parse_todo_id("abc").is_err());
    }
}
