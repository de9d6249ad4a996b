use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use super::push_range;
use crate::db::{self, to_sql_timestamp, DbPool};
use crate::error::{AppError, Result};
use crate::models::fields::normalize_text;
use crate::models::{CreateWorkoutSet, FromSqliteRow, TimeRange, Workout, WorkoutSet};

#[derive(Clone)]
pub struct WorkoutRepository {
    pool: DbPool,
}

fn next_set_index(conn: &Connection, workout_id: &str) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COALESCE(MAX(set_index), 0) + 1 FROM workout_sets WHERE workout_id = ?",
        [workout_id],
        |row| row.get(0),
    )
}

impl WorkoutRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// The user's workouts with `started_at` in `[from, to)`, newest first.
    pub async fn list(
        &self,
        user_id: &str,
        range: &TimeRange,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Workout>, i64)> {
        let mut clauses = vec!["user_id = ?".to_string()];
        let mut params = vec![Value::Text(user_id.to_string())];
        push_range("started_at", range, &mut clauses, &mut params);
        let where_sql = clauses.join(" AND ");

        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM workouts WHERE {}", where_sql),
                rusqlite::params_from_iter(params.iter()),
                |row| row.get(0),
            )?;

            let mut page_params = params;
            page_params.push(Value::Integer(limit));
            page_params.push(Value::Integer(offset));
            let mut stmt = conn.prepare(&format!(
                "SELECT * FROM workouts WHERE {} ORDER BY started_at DESC, id LIMIT ? OFFSET ?",
                where_sql
            ))?;
            let workouts = stmt
                .query_map(rusqlite::params_from_iter(page_params.iter()), Workout::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok((workouts, total))
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn find_by_id_for_user(&self, id: &str, user_id: &str) -> Result<Option<Workout>> {
        let pool = self.pool.clone();
        let id = id.to_string();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare("SELECT * FROM workouts WHERE id = ? AND user_id = ?")?;
            let result = stmt
                .query_row(rusqlite::params![id, user_id], Workout::from_row)
                .optional()?;
            Ok(result)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    pub async fn create(
        &self,
        user_id: &str,
        started_at: DateTime<Utc>,
        note: Option<String>,
    ) -> Result<Workout> {
        let now = db::now();
        let workout = Workout {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            started_at: db::truncate_to_stored(started_at),
            ended_at: None,
            note: normalize_text(note),
            created_at: now,
            updated_at: now,
        };
        let workout_clone = workout.clone();

        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = pool.get()?;
            conn.execute(
                "INSERT INTO workouts (id, user_id, started_at, ended_at, note, created_at, updated_at)
                 VALUES (?, ?, ?, NULL, ?, ?, ?)",
                rusqlite::params![
                    workout_clone.id,
                    workout_clone.user_id,
                    to_sql_timestamp(&workout_clone.started_at),
                    workout_clone.note,
                    to_sql_timestamp(&workout_clone.created_at),
                    to_sql_timestamp(&workout_clone.updated_at)
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

        Ok(workout)
    }

    /// Write back an edited workout after validating it.
    pub async fn update(&self, mut workout: Workout) -> Result<Workout> {
        workout.started_at = db::truncate_to_stored(workout.started_at);
        workout.ended_at = workout.ended_at.map(db::truncate_to_stored);
        workout.validate()?;
        workout.updated_at = db::now();
        let workout_clone = workout.clone();

        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = pool.get()?;
            conn.execute(
                "UPDATE workouts SET started_at = ?, ended_at = ?, note = ?, updated_at = ?
                 WHERE id = ? AND user_id = ?",
                rusqlite::params![
                    to_sql_timestamp(&workout_clone.started_at),
                    workout_clone.ended_at.as_ref().map(to_sql_timestamp),
                    workout_clone.note,
                    to_sql_timestamp(&workout_clone.updated_at),
                    workout_clone.id,
                    workout_clone.user_id
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

        Ok(workout)
    }

    /// Delete a workout together with its sets.
    pub async fn delete(&self, id: &str, user_id: &str) -> Result<bool> {
        let pool = self.pool.clone();
        let id = id.to_string();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let tx = conn.transaction()?;
            let owned: Option<String> = tx
                .query_row(
                    "SELECT id FROM workouts WHERE id = ? AND user_id = ?",
                    rusqlite::params![id, user_id],
                    |row| row.get(0),
                )
                .optional()?;
            if owned.is_none() {
                return Ok(false);
            }
            tx.execute("DELETE FROM workout_sets WHERE workout_id = ?", [&id])?;
            tx.execute("DELETE FROM workouts WHERE id = ?", [&id])?;
            tx.commit()?;
            Ok(true)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Sets of a workout ordered by `set_index`, then creation time.
    pub async fn list_sets(&self, workout_id: &str) -> Result<Vec<WorkoutSet>> {
        let pool = self.pool.clone();
        let workout_id = workout_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare(
                "SELECT * FROM workout_sets WHERE workout_id = ?
                 ORDER BY set_index, created_at, id",
            )?;
            let sets = stmt
                .query_map([&workout_id], WorkoutSet::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(sets)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Find a set whose workout belongs to `user_id`.
    pub async fn find_set_for_user(&self, id: &str, user_id: &str) -> Result<Option<WorkoutSet>> {
        let pool = self.pool.clone();
        let id = id.to_string();
        let user_id = user_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare(
                "SELECT s.* FROM workout_sets s
                 JOIN workouts w ON w.id = s.workout_id
                 WHERE s.id = ? AND w.user_id = ?",
            )?;
            let result = stmt
                .query_row(rusqlite::params![id, user_id], WorkoutSet::from_row)
                .optional()?;
            Ok(result)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Add a set to a workout. A missing or zero `set_index` appends after
    /// the current last set.
    pub async fn create_set(&self, workout_id: &str, input: CreateWorkoutSet) -> Result<WorkoutSet> {
        let pool = self.pool.clone();
        let workout_id = workout_id.to_string();
        let now = db::now();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let tx = conn.transaction()?;
            let set_index = match input.set_index {
                Some(index) if index != 0 => index,
                _ => next_set_index(&tx, &workout_id)?,
            };
            let set = WorkoutSet {
                id: Uuid::new_v4().to_string(),
                workout_id,
                exercise_id: input.exercise_id,
                set_index,
                reps: input.reps,
                weight_kg: input.weight_kg,
                rpe: input.rpe,
                rest_sec: input.rest_sec,
                duration_sec: input.duration_sec,
                distance_m: input.distance_m,
                note: normalize_text(input.note),
                is_warmup: input.is_warmup,
                created_at: now,
                updated_at: now,
            };
            set.validate()?;

            tx.execute(
                "INSERT INTO workout_sets
                    (id, workout_id, exercise_id, set_index, reps, weight_kg, rpe, rest_sec,
                     duration_sec, distance_m, note, is_warmup, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    set.id,
                    set.workout_id,
                    set.exercise_id,
                    set.set_index,
                    set.reps,
                    set.weight_kg,
                    set.rpe,
                    set.rest_sec,
                    set.duration_sec,
                    set.distance_m,
                    set.note,
                    set.is_warmup,
                    to_sql_timestamp(&set.created_at),
                    to_sql_timestamp(&set.updated_at)
                ],
            )?;
            tx.commit()?;
            Ok(set)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Write back an edited set after validating it.
    pub async fn update_set(&self, mut set: WorkoutSet) -> Result<WorkoutSet> {
        set.validate()?;
        set.updated_at = db::now();
        let set_clone = set.clone();

        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = pool.get()?;
            conn.execute(
                "UPDATE workout_sets
                 SET exercise_id = ?, set_index = ?, reps = ?, weight_kg = ?, rpe = ?,
                     rest_sec = ?, duration_sec = ?, distance_m = ?, note = ?, is_warmup = ?,
                     updated_at = ?
                 WHERE id = ?",
                rusqlite::params![
                    set_clone.exercise_id,
                    set_clone.set_index,
                    set_clone.reps,
                    set_clone.weight_kg,
                    set_clone.rpe,
                    set_clone.rest_sec,
                    set_clone.duration_sec,
                    set_clone.distance_m,
                    set_clone.note,
                    set_clone.is_warmup,
                    to_sql_timestamp(&set_clone.updated_at),
                    set_clone.id
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

        Ok(set)
    }

    pub async fn delete_set(&self, id: &str) -> Result<bool> {
        let pool = self.pool.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let rows = conn.execute("DELETE FROM workout_sets WHERE id = ?", [&id])?;
            Ok(rows > 0)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }
}
