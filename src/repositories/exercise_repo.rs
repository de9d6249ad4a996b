use rusqlite::types::Value;
use rusqlite::OptionalExtension;
use uuid::Uuid;

use crate::db::{self, to_sql_timestamp, DbPool};
use crate::error::{is_unique_violation, AppError, Result};
use crate::models::exercise::normalize_exercise;
use crate::models::{CreateExercise, Exercise, ExerciseFilter, ExerciseType, FromSqliteRow};

/// A catalog entry installed with a fixed id by the seeding binary.
#[derive(Debug, Clone, Copy)]
pub struct SharedExercise {
    pub id: &'static str,
    pub name: &'static str,
    pub exercise_type: ExerciseType,
    pub primary_muscle: &'static str,
}

#[derive(Clone)]
pub struct ExerciseRepository {
    pool: DbPool,
}

/// Escape `%`, `_` and `\` so user input matches literally in a LIKE pattern.
fn like_pattern(q: &str) -> String {
    let mut escaped = String::with_capacity(q.len() + 2);
    escaped.push('%');
    for c in q.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn duplicate_name(err: rusqlite::Error) -> AppError {
    if is_unique_violation(&err) {
        AppError::Conflict("exercise name already exists".to_string())
    } else {
        AppError::Database(err)
    }
}

impl ExerciseRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Exercise>> {
        let pool = self.pool.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let mut stmt = conn.prepare("SELECT * FROM exercises WHERE id = ?")?;
            let result = stmt.query_row([&id], Exercise::from_row).optional()?;
            Ok(result)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Exercises visible to the user (shared and own, or own only with
    /// `only_mine`), ordered by name then id.
    pub async fn list(
        &self,
        user_id: &str,
        filter: &ExerciseFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Exercise>, i64)> {
        let mut clauses = Vec::new();
        let mut params: Vec<Value> = Vec::new();

        if filter.only_mine {
            clauses.push("owner_user_id = ?");
        } else {
            clauses.push("(owner_user_id IS NULL OR owner_user_id = ?)");
        }
        params.push(Value::Text(user_id.to_string()));

        if let Some(q) = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            clauses.push("name LIKE ? ESCAPE '\\'");
            params.push(Value::Text(like_pattern(q)));
        }
        if let Some(exercise_type) = filter.exercise_type {
            clauses.push("type = ?");
            params.push(Value::Text(exercise_type.as_str().to_string()));
        }

        let where_sql = clauses.join(" AND ");
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM exercises WHERE {}", where_sql),
                rusqlite::params_from_iter(params.iter()),
                |row| row.get(0),
            )?;

            let mut page_params = params;
            page_params.push(Value::Integer(limit));
            page_params.push(Value::Integer(offset));
            let mut stmt = conn.prepare(&format!(
                "SELECT * FROM exercises WHERE {} ORDER BY name COLLATE NOCASE, id LIMIT ? OFFSET ?",
                where_sql
            ))?;
            let exercises = stmt
                .query_map(rusqlite::params_from_iter(page_params.iter()), Exercise::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok((exercises, total))
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Create an exercise owned by `owner_user_id`. Duplicate names are a conflict.
    pub async fn create(&self, owner_user_id: &str, input: CreateExercise) -> Result<Exercise> {
        let now = db::now();
        let mut exercise = Exercise {
            id: Uuid::new_v4().to_string(),
            owner_user_id: Some(owner_user_id.to_string()),
            name: input.name,
            exercise_type: input.exercise_type,
            primary_muscle: input.primary_muscle,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        normalize_exercise(&mut exercise)?;
        let exercise_clone = exercise.clone();

        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = pool.get()?;
            conn.execute(
                "INSERT INTO exercises
                    (id, owner_user_id, name, type, primary_muscle, is_active, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                rusqlite::params![
                    exercise_clone.id,
                    exercise_clone.owner_user_id,
                    exercise_clone.name,
                    exercise_clone.exercise_type.as_str(),
                    exercise_clone.primary_muscle,
                    exercise_clone.is_active,
                    to_sql_timestamp(&exercise_clone.created_at),
                    to_sql_timestamp(&exercise_clone.updated_at)
                ],
            )
            .map_err(duplicate_name)?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

        Ok(exercise)
    }

    /// Write back an edited exercise, refreshing `updated_at`.
    pub async fn update(&self, mut exercise: Exercise) -> Result<Exercise> {
        normalize_exercise(&mut exercise)?;
        exercise.updated_at = db::now();
        let exercise_clone = exercise.clone();

        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = pool.get()?;
            conn.execute(
                "UPDATE exercises
                 SET name = ?, type = ?, primary_muscle = ?, is_active = ?, updated_at = ?
                 WHERE id = ?",
                rusqlite::params![
                    exercise_clone.name,
                    exercise_clone.exercise_type.as_str(),
                    exercise_clone.primary_muscle,
                    exercise_clone.is_active,
                    to_sql_timestamp(&exercise_clone.updated_at),
                    exercise_clone.id
                ],
            )
            .map_err(duplicate_name)?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

        Ok(exercise)
    }

    /// Delete an exercise. Fails with a conflict while sets still reference it.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let pool = self.pool.clone();
        let id = id.to_string();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let tx = conn.transaction()?;
            let in_use: i64 = tx.query_row(
                "SELECT COUNT(*) FROM workout_sets WHERE exercise_id = ?",
                [&id],
                |row| row.get(0),
            )?;
            if in_use > 0 {
                return Err(AppError::Conflict("exercise is in use".to_string()));
            }
            let rows = tx.execute("DELETE FROM exercises WHERE id = ?", [&id])?;
            tx.commit()?;
            Ok(rows > 0)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }

    /// Insert shared catalog entries that are not present yet. Returns the
    /// number of rows added.
    pub async fn seed_shared(&self, entries: &[SharedExercise]) -> Result<usize> {
        let pool = self.pool.clone();
        let entries = entries.to_vec();
        let now = to_sql_timestamp(&db::now());
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            let tx = conn.transaction()?;
            let mut inserted = 0;
            for entry in &entries {
                inserted += tx.execute(
                    "INSERT OR IGNORE INTO exercises
                        (id, owner_user_id, name, type, primary_muscle, is_active, created_at, updated_at)
                     VALUES (?, NULL, ?, ?, ?, 1, ?, ?)",
                    rusqlite::params![
                        entry.id,
                        entry.name,
                        entry.exercise_type.as_str(),
                        entry.primary_muscle,
                        now,
                        now
                    ],
                )?;
            }
            tx.commit()?;
            Ok(inserted)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_memory_pool;
    use crate::migrations::run_migrations_for_tests;

    fn setup_test_db() -> DbPool {
        let pool = create_memory_pool().expect("Failed to create test database");
        run_migrations_for_tests(&pool).expect("Failed to run migrations");
        pool
    }

    fn create_test_user(pool: &DbPool, user_id: &str) {
        let conn = pool.get().unwrap();
        conn.execute(
            "INSERT INTO users (id, provider, provider_user_id, created_at, updated_at)
             VALUES (?, 'line', ?, '2024-01-01T00:00:00.000000+00:00', '2024-01-01T00:00:00.000000+00:00')",
            rusqlite::params![user_id, format!("U-{}", user_id)],
        )
        .unwrap();
    }

    fn input(name: &str, exercise_type: ExerciseType) -> CreateExercise {
        CreateExercise {
            name: name.to_string(),
            exercise_type,
            primary_muscle: None,
        }
    }

    const SHARED: [SharedExercise; 2] = [
        SharedExercise {
            id: "shared-deadlift",
            name: "Deadlift",
            exercise_type: ExerciseType::Strength,
            primary_muscle: "back",
        },
        SharedExercise {
            id: "shared-bench",
            name: "Bench Press",
            exercise_type: ExerciseType::Strength,
            primary_muscle: "chest",
        },
    ];

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_a\\b"), "%50\\%\\_a\\\\b%");
    }

    #[tokio::test]
    async fn test_create_exercise() {
        let pool = setup_test_db();
        create_test_user(&pool, "user1");
        let repo = ExerciseRepository::new(pool);

        let exercise = repo
            .create("user1", input("  Rowing ", ExerciseType::Cardio))
            .await
            .unwrap();

        assert_eq!(exercise.name, "Rowing");
        assert_eq!(exercise.owner_user_id.as_deref(), Some("user1"));
        assert!(exercise.is_active);
        assert_eq!(
            repo.find_by_id(&exercise.id).await.unwrap(),
            Some(exercise)
        );
    }

    #[tokio::test]
    async fn test_duplicate_name_per_owner_conflicts() {
        let pool = setup_test_db();
        create_test_user(&pool, "user1");
        create_test_user(&pool, "user2");
        let repo = ExerciseRepository::new(pool);

        repo.create("user1", input("Curl", ExerciseType::Strength))
            .await
            .unwrap();
        let dup = repo
            .create("user1", input("Curl", ExerciseType::Strength))
            .await;
        assert!(matches!(dup, Err(AppError::Conflict(_))));

        // Another owner may reuse the name
        assert!(repo
            .create("user2", input("Curl", ExerciseType::Strength))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_name_ignores_case() {
        let pool = setup_test_db();
        create_test_user(&pool, "user1");
        let repo = ExerciseRepository::new(pool);
        repo.seed_shared(&SHARED).await.unwrap();

        repo.create("user1", input("Curl", ExerciseType::Strength))
            .await
            .unwrap();
        let dup = repo
            .create("user1", input("cURL", ExerciseType::Strength))
            .await;
        assert!(matches!(dup, Err(AppError::Conflict(_))));

        // Shared names are unique regardless of case as well
        let clash = SharedExercise {
            id: "shared-deadlift-lower",
            name: "deadlift",
            exercise_type: ExerciseType::Strength,
            primary_muscle: "back",
        };
        assert_eq!(repo.seed_shared(&[clash]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_visibility_and_filters() {
        let pool = setup_test_db();
        create_test_user(&pool, "user1");
        create_test_user(&pool, "user2");
        let repo = ExerciseRepository::new(pool);
        repo.seed_shared(&SHARED).await.unwrap();
        repo.create("user1", input("Bench Dip", ExerciseType::Strength))
            .await
            .unwrap();
        repo.create("user2", input("Bench Jump", ExerciseType::Other))
            .await
            .unwrap();

        let (all, total) = repo
            .list("user1", &ExerciseFilter::default(), 20, 0)
            .await
            .unwrap();
        assert_eq!(total, 3);
        let names: Vec<_> = all.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Bench Dip", "Bench Press", "Deadlift"]);

        let mine = ExerciseFilter {
            only_mine: true,
            ..Default::default()
        };
        let (own, _) = repo.list("user1", &mine, 20, 0).await.unwrap();
        assert_eq!(own.len(), 1);
        assert!(own.iter().all(|e| e.is_owned_by("user1")));

        let search = ExerciseFilter {
            q: Some("bench".to_string()),
            ..Default::default()
        };
        let (found, total) = repo.list("user1", &search, 1, 0).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(found.len(), 1);

        let cardio = ExerciseFilter {
            exercise_type: Some(ExerciseType::Cardio),
            ..Default::default()
        };
        let (none, total) = repo.list("user1", &cardio, 20, 0).await.unwrap();
        assert!(none.is_empty());
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_update_exercise() {
        let pool = setup_test_db();
        create_test_user(&pool, "user1");
        let repo = ExerciseRepository::new(pool);
        let mut exercise = repo
            .create("user1", input("Plank", ExerciseType::Other))
            .await
            .unwrap();

        exercise.name = "Side Plank".to_string();
        exercise.is_active = false;
        let updated = repo.update(exercise).await.unwrap();

        let stored = repo.find_by_id(&updated.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Side Plank");
        assert!(!stored.is_active);
    }

    #[tokio::test]
    async fn test_delete_in_use_conflicts() {
        let pool = setup_test_db();
        create_test_user(&pool, "user1");
        let repo = ExerciseRepository::new(pool.clone());
        let exercise = repo
            .create("user1", input("Pull Up", ExerciseType::Strength))
            .await
            .unwrap();
        {
            let conn = pool.get().unwrap();
            conn.execute(
                "INSERT INTO workouts (id, user_id, started_at, created_at, updated_at)
                 VALUES ('w1', 'user1', '2024-01-01T00:00:00.000000+00:00',
                         '2024-01-01T00:00:00.000000+00:00', '2024-01-01T00:00:00.000000+00:00')",
                [],
            )
            .unwrap();
            conn.execute(
                "INSERT INTO workout_sets (id, workout_id, exercise_id, set_index, created_at, updated_at)
                 VALUES ('s1', 'w1', ?, 1, '2024-01-01T00:00:00.000000+00:00', '2024-01-01T00:00:00.000000+00:00')",
                [&exercise.id],
            )
            .unwrap();
        }

        assert!(matches!(
            repo.delete(&exercise.id).await,
            Err(AppError::Conflict(_))
        ));

        pool.get()
            .unwrap()
            .execute("DELETE FROM workout_sets", [])
            .unwrap();
        assert!(repo.delete(&exercise.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_seed_shared_is_idempotent() {
        let repo = ExerciseRepository::new(setup_test_db());

        assert_eq!(repo.seed_shared(&SHARED).await.unwrap(), 2);
        assert_eq!(repo.seed_shared(&SHARED).await.unwrap(), 0);

        let deadlift = repo.find_by_id("shared-deadlift").await.unwrap().unwrap();
        assert!(deadlift.is_shared());
    }
}
