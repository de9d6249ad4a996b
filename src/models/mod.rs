pub mod body_metric;
pub mod exercise;
pub mod fields;
pub mod from_row;
pub mod page;
pub mod todo;
pub mod user;
pub mod workout;
pub mod workout_set;

pub use body_metric::{BodyMetric, CreateBodyMetric, UpdateBodyMetric};
pub use exercise::{CreateExercise, Exercise, ExerciseFilter, ExerciseType, UpdateExercise};
pub use from_row::FromSqliteRow;
pub use page::{Page, PageParams};
pub use todo::{Todo, TodoInput};
pub use user::{Me, Profile, User};
pub use workout::{
    CreateWorkout, EndWorkout, RangeQuery, TimeRange, UpdateWorkout, Workout, WorkoutDetail,
};
pub use workout_set::{CreateWorkoutSet, UpdateWorkoutSet, WorkoutSet};
