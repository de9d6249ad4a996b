use rusqlite::types::Value;
use rusqlite::OptionalExtension;
use uuid::Uuid;

use super::push_range;
use crate::db::{self, to_sql_timestamp, DbPool};
use crate::error::{is_unique_violation, AppError, Result};
use crate::models::fields::normalize_text;
use crate::models::{BodyMetric, CreateBodyMetric, FromSqliteRow, TimeRange};

#[derive(Clone)]
pub struct BodyMetricRepository {
    pool: DbPool,
}

fn duplicate_measurement(err: rusqlite::Error) -> AppError {
    if is_unique_violation(&err) {
        AppError::Conflict("a measurement already exists at measuredAt".to_string())
    } else {
        AppError::Database(err)
    }
}

impl BodyMetricRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// The user's measurements with `measured_at` in `[from, to)`, newest first.
    pub async fn list(
        &self,
        user_id: &str,
        range: &TimeRange,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<BodyMetric>, i64)> {
        let mut clauses = vec!["user_id = ?".to_string()];
        let mut params = vec![Value::Text(user_id.to_string())];
        push_range("measured_at", range, &mut clauses, &mut params);
        let where_sql = clauses.join(" AND ");

        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM body_metrics WHERE {}", where_sql),
                rusqlite::params_from_iter(params.iter()),
                |row| row.get(0),
            )?;

            let mut page_params = params;
            page_params.push(Value::Integer(limit));
            page_params.push(Value::Integer(offset));
            let mut stmt = conn.prepare(&format!(
                "SELECT * FROM body_metrics WHERE {} ORDER BY measured_at DESC LIMIT ? OFFSET ?",
                where_sql
            ))?;
            let metrics = stmt
                .query_map(
                    rusqlite::params_from_iter(page_params.iter()),
                    BodyMetric::from_row,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok((metrics, total))
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn find_by_id_for_user(&self, id: &str, user_id: &str) -> Result<Option<BodyMetric>> {
        let pool = self.pool.clone();
        let id = id.to_string();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt =
                conn.prepare("SELECT * FROM body_metrics WHERE id = ? AND user_id = ?")?;
            let result = stmt
                .query_row(rusqlite::params![id, user_id], BodyMetric::from_row)
                .optional()?;
            Ok(result)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn create(&self, user_id: &str, input: CreateBodyMetric) -> Result<BodyMetric> {
        let now = db::now();
        let metric = BodyMetric {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            measured_at: db::truncate_to_stored(input.measured_at),
            weight_kg: input.weight_kg,
            body_fat_pct: input.body_fat_pct,
            note: normalize_text(input.note),
            created_at: now,
            updated_at: now,
        };
        metric.validate()?;
        let metric_clone = metric.clone();

        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = pool.get()?;
            conn.execute(
                "INSERT INTO body_metrics
                    (id, user_id, measured_at, weight_kg, body_fat_pct, note, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    metric_clone.id,
                    metric_clone.user_id,
                    to_sql_timestamp(&metric_clone.measured_at),
                    metric_clone.weight_kg,
                    metric_clone.body_fat_pct,
                    metric_clone.note,
                    to_sql_timestamp(&metric_clone.created_at),
                    to_sql_timestamp(&metric_clone.updated_at)
                ],
            )
            .map_err(duplicate_measurement)?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

        Ok(metric)
    }

    /// Write back an edited measurement after validating it.
    pub async fn update(&self, mut metric: BodyMetric) -> Result<BodyMetric> {
        metric.measured_at = db::truncate_to_stored(metric.measured_at);
        metric.validate()?;
        metric.updated_at = db::now();
        let metric_clone = metric.clone();

        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = pool.get()?;
            conn.execute(
                "UPDATE body_metrics
                 SET measured_at = ?, weight_kg = ?, body_fat_pct = ?, note = ?, updated_at = ?
                 WHERE id = ? AND user_id = ?",
                rusqlite::params![
                    to_sql_timestamp(&metric_clone.measured_at),
                    metric_clone.weight_kg,
                    metric_clone.body_fat_pct,
                    metric_clone.note,
                    to_sql_timestamp(&metric_clone.updated_at),
                    metric_clone.id,
                    metric_clone.user_id
                ],
            )
            .map_err(duplicate_measurement)?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

        Ok(metric)
    }

    pub async fn delete(&self, id: &str, user_id: &str) -> Result<bool> {
        let pool = self.pool.clone();
        let id = id.to_string();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let rows = conn.execute(
                "DELETE FROM body_metrics WHERE id = ? AND user_id = ?",
                rusqlite::params![id, user_id],
            )?;
            Ok(rows > 0)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }
}
