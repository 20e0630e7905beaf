//! Meal and fitness endpoints.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;

use crate::api::dto::{CreateActivityRequest, CreateMealRequest, DayQuery};
use crate::api::error::ApiResult;
use crate::api::extractors::{ApiJson, ApiPath, ApiQuery, CurrentUser};
use crate::api::state::AppState;
use crate::domain::{Activity, ActivityId, Meal, MealId};

pub async fn list_meals(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiQuery(query): ApiQuery<DayQuery>,
) -> ApiResult<Json<Vec<Meal>>> {
    let day = query.day()?;
    Ok(Json(state.service.list_meals(current.user.id, day).await?))
}

pub async fn create_meal(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiJson(request): ApiJson<CreateMealRequest>,
) -> ApiResult<(StatusCode, Json<Meal>)> {
    let meal = state
        .service
        .create_meal(current.user.id, request.into_new(Utc::now()))
        .await?;
    Ok((StatusCode::CREATED, Json(meal)))
}

pub async fn delete_meal(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiPath(id): ApiPath<MealId>,
) -> ApiResult<StatusCode> {
    state.service.delete_meal(current.user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_activities(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiQuery(query): ApiQuery<DayQuery>,
) -> ApiResult<Json<Vec<Activity>>> {
    let day = query.day()?;
    Ok(Json(
        state.service.list_activities(current.user.id, day).await?,
    ))
}

pub async fn create_activity(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiJson(request): ApiJson<CreateActivityRequest>,
) -> ApiResult<(StatusCode, Json<Activity>)> {
    let activity = state
        .service
        .create_activity(current.user.id, request.into_new(Utc::now()))
        .await?;
    Ok((StatusCode::CREATED, Json(activity)))
}

pub async fn delete_activity(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiPath(id): ApiPath<ActivityId>,
) -> ApiResult<StatusCode> {
    state.service.delete_activity(current.user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
