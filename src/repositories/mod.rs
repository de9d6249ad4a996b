pub mod body_metric_repo;
pub mod exercise_repo;
pub mod pending_login_repo;
pub mod session_repo;
pub mod todo_repo;
pub mod user_repo;
pub mod workout_repo;

pub use body_metric_repo::BodyMetricRepository;
pub use exercise_repo::{ExerciseRepository, SharedExercise};
pub use pending_login_repo::{PendingLogin, PendingLoginRepository};
pub use session_repo::SessionRepository;
pub use todo_repo::TodoRepository;
pub use user_repo::UserRepository;
pub use workout_repo::WorkoutRepository;

use rusqlite::types::Value;

use crate::db::to_sql_timestamp;
use crate::models::TimeRange;

/// Append `column >= from` / `column < to` conditions for a time range.
fn push_range(column: &str, range: &TimeRange, clauses: &mut Vec<String>, params: &mut Vec<Value>) {
    if let Some(from) = range.from {
        clauses.push(format!("{} >= ?", column));
        params.push(Value::Text(to_sql_timestamp(&from)));
    }
    if let Some(to) = range.to {
        clauses.push(format!("{} < ?", column));
        params.push(Value::Text(to_sql_timestamp(&to)));
    }
}
