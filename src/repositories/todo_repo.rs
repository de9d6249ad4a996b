use rusqlite::OptionalExtension;

use crate::db::{self, to_sql_timestamp, DbPool};
use crate::error::{AppError, Result};
use crate::models::{FromSqliteRow, Todo};

#[derive(Clone)]
pub struct TodoRepository {
    pool: DbPool,
}

impl TodoRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// One page of the user's todos, newest first, with the total count.
    pub async fn list(&self, user_id: &str, limit: i64, offset: i64) -> Result<(Vec<Todo>, i64)> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let total: i64 = conn.query_row(
                "SELECT COUNT(*) FROM todos WHERE user_id = ?",
                [&user_id],
                |row| row.get(0),
            )?;
            let mut stmt = conn.prepare(
                "SELECT * FROM todos WHERE user_id = ?
                 ORDER BY created_at DESC, id DESC
                 LIMIT ? OFFSET ?",
            )?;
            let todos = stmt
                .query_map(rusqlite::params![user_id, limit, offset], Todo::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok((todos, total))
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn find_by_id_for_user(&self, id: i64, user_id: &str) -> Result<Option<Todo>> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare("SELECT * FROM todos WHERE id = ? AND user_id = ?")?;
            let result = stmt
                .query_row(rusqlite::params![id, user_id], Todo::from_row)
                .optional()?;
            Ok(result)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// `content` must already be validated.
    pub async fn create(&self, user_id: &str, content: &str) -> Result<Todo> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();
        let content = content.to_string();
        let now = db::now();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            conn.execute(
                "INSERT INTO todos (user_id, content, created_at, updated_at) VALUES (?, ?, ?, ?)",
                rusqlite::params![user_id, content, to_sql_timestamp(&now), to_sql_timestamp(&now)],
            )?;
            Ok(Todo {
                id: conn.last_insert_rowid(),
                user_id,
                content,
                created_at: now,
                updated_at: now,
            })
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Replace the content of one of the user's todos. `None` if it does not exist.
    pub async fn update_content(
        &self,
        id: i64,
        user_id: &str,
        content: &str,
    ) -> Result<Option<Todo>> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();
        let content = content.to_string();
        let now = to_sql_timestamp(&db::now());
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let rows = conn.execute(
                "UPDATE todos SET content = ?, updated_at = ? WHERE id = ? AND user_id = ?",
                rusqlite::params![content, now, id, user_id],
            )?;
            if rows == 0 {
                return Ok(None);
            }
            let mut stmt = conn.prepare("SELECT * FROM todos WHERE id = ?")?;
            let todo = stmt.query_row([id], Todo::from_row)?;
            Ok(Some(todo))
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn delete(&self, id: i64, user_id: &str) -> Result<bool> {
        let pool = self.pool.clone();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let rows = conn.execute(
                "DELETE FROM todos WHERE id = ? AND user_id = ?",
                rusqlite::params![id, user_id],
            )?;
            Ok(rows > 0)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }
}
