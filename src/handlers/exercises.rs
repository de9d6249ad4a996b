use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiQuery};
use crate::middleware::AuthUser;
use crate::models::{CreateExercise, Exercise, ExerciseFilter, Page, PageParams, UpdateExercise};
use crate::repositories::ExerciseRepository;

#[derive(Clone)]
pub struct ExercisesState {
    pub exercise_repo: ExerciseRepository,
}

async fn find_visible(state: &ExercisesState, id: &str, user_id: &str) -> Result<Exercise> {
    state
        .exercise_repo
        .find_by_id(id)
        .await?
        .filter(|exercise| exercise.is_visible_to(user_id))
        .ok_or_else(|| AppError::NotFound("exercise not found".to_string()))
}

/// Load an exercise the caller may modify: shared entries are read-only and
/// other users' private entries do not exist for the caller.
async fn find_editable(state: &ExercisesState, id: &str, user_id: &str) -> Result<Exercise> {
    let exercise = find_visible(state, id, user_id).await?;
    if exercise.is_shared() {
        return Err(AppError::Forbidden(
            "shared exercises cannot be modified".to_string(),
        ));
    }
    Ok(exercise)
}

pub async fn list(
    State(state): State<ExercisesState>,
    auth_user: AuthUser,
    ApiQuery(filter): ApiQuery<ExerciseFilter>,
) -> Result<Json<Page<Exercise>>> {
    let (limit, offset) = PageParams {
        limit: filter.limit,
        offset: filter.offset,
    }
    .resolve()?;
    let (items, total) = state
        .exercise_repo
        .list(&auth_user.id, &filter, limit, offset)
        .await?;
    Ok(Json(Page {
        items,
        total,
        limit,
        offset,
    }))
}

pub async fn show(
    State(state): State<ExercisesState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Exercise>> {
    Ok(Json(find_visible(&state, &id, &auth_user.id).await?))
}

pub async fn create(
    State(state): State<ExercisesState>,
    auth_user: AuthUser,
    ApiJson(input): ApiJson<CreateExercise>,
) -> Result<(StatusCode, Json<Exercise>)> {
    let exercise = state.exercise_repo.create(&auth_user.id, input).await?;
    Ok((StatusCode::CREATED, Json(exercise)))
}

pub async fn update(
    State(state): State<ExercisesState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<UpdateExercise>,
) -> Result<Json<Exercise>> {
    let mut exercise = find_editable(&state, &id, &auth_user.id).await?;
    patch.apply(&mut exercise);
    let exercise = state.exercise_repo.update(exercise).await?;
    Ok(Json(exercise))
}

pub async fn delete(
    State(state): State<ExercisesState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let exercise = find_editable(&state, &id, &auth_user.id).await?;
    state.exercise_repo.delete(&exercise.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
