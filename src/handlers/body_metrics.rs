use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiQuery};
use crate::middleware::AuthUser;
use crate::models::{BodyMetric, CreateBodyMetric, Page, RangeQuery, UpdateBodyMetric};
use crate::repositories::BodyMetricRepository;

#[derive(Clone)]
pub struct BodyMetricsState {
    pub body_metric_repo: BodyMetricRepository,
}

fn not_found() -> AppError {
    AppError::NotFound("body metric not found".to_string())
}

pub async fn list(
    State(state): State<BodyMetricsState>,
    auth_user: AuthUser,
    ApiQuery(query): ApiQuery<RangeQuery>,
) -> Result<Json<Page<BodyMetric>>> {
    let range = query.range();
    range.validate()?;
    let (limit, offset) = query.page().resolve()?;
    let (items, total) = state
        .body_metric_repo
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
    State(state): State<BodyMetricsState>,
    auth_user: AuthUser,
    ApiJson(input): ApiJson<CreateBodyMetric>,
) -> Result<(StatusCode, Json<BodyMetric>)> {
    let metric = state.body_metric_repo.create(&auth_user.id, input).await?;
    Ok((StatusCode::CREATED, Json(metric)))
}

pub async fn update(
    State(state): State<BodyMetricsState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<UpdateBodyMetric>,
) -> Result<Json<BodyMetric>> {
    let mut metric = state
        .body_metric_repo
        .find_by_id_for_user(&id, &auth_user.id)
        .await?
        .ok_or_else(not_found)?;
    patch.apply(&mut metric);
    Ok(Json(state.body_metric_repo.update(metric).await?))
}

pub async fn delete(
    State(state): State<BodyMetricsState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    if !state.body_metric_repo.delete(&id, &auth_user.id).await? {
        return Err(not_found());
    }
    Ok(StatusCode::NO_CONTENT)
}
