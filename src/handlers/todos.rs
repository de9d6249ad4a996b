use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiQuery};
use crate::middleware::AuthUser;
use crate::models::todo::{parse_todo_id, validate_content};
use crate::models::{Page, PageParams, Todo, TodoInput};
use crate::repositories::TodoRepository;

#[derive(Clone)]
pub struct TodosState {
    pub todo_repo: TodoRepository,
}

fn not_found() -> AppError {
    AppError::NotFound("not found".to_string())
}

pub async fn list(
    State(state): State<TodosState>,
    auth_user: AuthUser,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<Page<Todo>>> {
    let (limit, offset) = params.resolve()?;
    let (items, total) = state.todo_repo.list(&auth_user.id, limit, offset).await?;
    Ok(Json(Page {
        items,
        total,
        limit,
        offset,
    }))
}

pub async fn create(
    State(state): State<TodosState>,
    auth_user: AuthUser,
    ApiJson(input): ApiJson<TodoInput>,
) -> Result<(StatusCode, Json<Todo>)> {
    let content = validate_content(&input.content)?;
    let todo = state.todo_repo.create(&auth_user.id, &content).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

pub async fn update(
    State(state): State<TodosState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<TodoInput>,
) -> Result<Json<Todo>> {
    let id = parse_todo_id(&id)?;
    let content = validate_content(&input.content)?;
    let todo = state
        .todo_repo
        .update_content(id, &auth_user.id, &content)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(todo))
}

pub async fn delete(
    State(state): State<TodosState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let id = parse_todo_id(&id)?;
    if !state.todo_repo.delete(id, &auth_user.id).await? {
        return Err(not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}
