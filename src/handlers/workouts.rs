use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::db;
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiQuery};
use crate::middleware::AuthUser;
use crate::models::{
    CreateWorkout, CreateWorkoutSet, EndWorkout, Page, RangeQuery, UpdateWorkout,
    UpdateWorkoutSet, Workout, WorkoutDetail, WorkoutSet,
};
use crate::repositories::{ExerciseRepository, WorkoutRepository};

#[derive(Clone)]
pub struct WorkoutsState {
    pub workout_repo: WorkoutRepository,
    pub exercise_repo: ExerciseRepository,
}

async fn find_workout(state: &WorkoutsState, id: &str, user_id: &str) -> Result<Workout> {
    state
        .workout_repo
        .find_by_id_for_user(id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("workout not found".to_string()))
}

async fn find_set(state: &WorkoutsState, id: &str, user_id: &str) -> Result<WorkoutSet> {
    state
        .workout_repo
        .find_set_for_user(id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("set not found".to_string()))
}

/// Sets may only reference shared exercises or the caller's own.
async fn ensure_exercise_visible(state: &WorkoutsState, id: &str, user_id: &str) -> Result<()> {
    let visible = state
        .exercise_repo
        .find_by_id(id)
        .await?
        .is_some_and(|exercise| exercise.is_visible_to(user_id));
    if !visible {
        return Err(AppError::Validation("unknown exerciseId".to_string()));
    }
    Ok(())
}

pub async fn list(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    ApiQuery(query): ApiQuery<RangeQuery>,
) -> Result<Json<Page<Workout>>> {
    let range = query.range();
    range.validate()?;
    let (limit, offset) = query.page().resolve()?;
    let (items, total) = state
        .workout_repo
        .list(&auth_user.id, &range, limit, offset)
        .await?;
    Ok(Json(Page {
        items,
        total,
        limit,
        offset,
    }))
}

pub async fn create(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    ApiJson(input): ApiJson<CreateWorkout>,
) -> Result<(StatusCode, Json<Workout>)> {
    let started_at = input
        .started_at
        .ok_or_else(|| AppError::Validation("startedAt is required".to_string()))?;
    let workout = state
        .workout_repo
        .create(&auth_user.id, started_at, input.note)
        .await?;
    tracing::debug!(workout_id = %workout.id, "Workout started");
    Ok((StatusCode::CREATED, Json(workout)))
}

pub async fn show(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Workout>> {
    Ok(Json(find_workout(&state, &id, &auth_user.id).await?))
}

pub async fn detail(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<WorkoutDetail>> {
    let workout = find_workout(&state, &id, &auth_user.id).await?;
    let sets = state.workout_repo.list_sets(&workout.id).await?;
    Ok(Json(WorkoutDetail { workout, sets }))
}

pub async fn update(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<UpdateWorkout>,
) -> Result<Json<Workout>> {
    let mut workout = find_workout(&state, &id, &auth_user.id).await?;
    patch.apply(&mut workout);
    Ok(Json(state.workout_repo.update(workout).await?))
}

/// The body is optional; without `endedAt` the workout ends now.
pub async fn end(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Workout>> {
    let input: EndWorkout = if body.iter().all(u8::is_ascii_whitespace) {
        EndWorkout::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|_| AppError::BadRequest("invalid body".to_string()))?
    };

    let mut workout = find_workout(&state, &id, &auth_user.id).await?;
    workout.ended_at = Some(input.ended_at.unwrap_or_else(db::now));
    Ok(Json(state.workout_repo.update(workout).await?))
}

pub async fn delete(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    if !state.workout_repo.delete(&id, &auth_user.id).await? {
        return Err(AppError::NotFound("workout not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_set(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Path(workout_id): Path<String>,
    ApiJson(input): ApiJson<CreateWorkoutSet>,
) -> Result<(StatusCode, Json<WorkoutSet>)> {
    let workout = find_workout(&state, &workout_id, &auth_user.id).await?;
    ensure_exercise_visible(&state, &input.exercise_id, &auth_user.id).await?;
    let set = state.workout_repo.create_set(&workout.id, input).await?;
    Ok((StatusCode::CREATED, Json(set)))
}

pub async fn update_set(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<UpdateWorkoutSet>,
) -> Result<Json<WorkoutSet>> {
    let mut set = find_set(&state, &id, &auth_user.id).await?;
    if let Some(exercise_id) = &patch.exercise_id {
        if *exercise_id != set.exercise_id {
            ensure_exercise_visible(&state, exercise_id, &auth_user.id).await?;
        }
    }
    patch.apply(&mut set);
    Ok(Json(state.workout_repo.update_set(set).await?))
}

pub async fn delete_set(
    State(state): State<WorkoutsState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let set = find_set(&state, &id, &auth_user.id).await?;
    state.workout_repo.delete_set(&set.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
