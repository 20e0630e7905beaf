//! Task and calendar event endpoints.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::{
    CreateEventRequest, CreateTaskRequest, EventQuery, TaskQuery, UpdateEventRequest,
    UpdateTaskRequest,
};
use crate::api::error::ApiResult;
use crate::api::extractors::{ApiJson, ApiPath, ApiQuery, CurrentUser};
use crate::api::state::AppState;
use crate::domain::{Event, EventId, Task, TaskId};

pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiQuery(query): ApiQuery<TaskQuery>,
) -> ApiResult<Json<Vec<Task>>> {
    Ok(Json(
        state
            .service
            .list_tasks(current.user.id, query.completed)
            .await?,
    ))
}

pub async fn create_task(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiJson(request): ApiJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let task = state
        .service
        .create_task(current.user.id, request.into())
        .await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiPath(id): ApiPath<TaskId>,
    ApiJson(request): ApiJson<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    let task = state
        .service
        .update_task(current.user.id, id, request.into())
        .await?;
    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiPath(id): ApiPath<TaskId>,
) -> ApiResult<StatusCode> {
    state.service.delete_task(current.user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_events(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiQuery(query): ApiQuery<EventQuery>,
) -> ApiResult<Json<Vec<Event>>> {
    let (from, to) = query.bounds()?;
    Ok(Json(
        state.service.list_events(current.user.id, from, to).await?,
    ))
}

pub async fn create_event(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiJson(request): ApiJson<CreateEventRequest>,
) -> ApiResult<(StatusCode, Json<Event>)> {
    let event = state
        .service
        .create_event(current.user.id, request.into())
        .await?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn update_event(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiPath(id): ApiPath<EventId>,
    ApiJson(request): ApiJson<UpdateEventRequest>,
) -> ApiResult<Json<Event>> {
    let event = state
        .service
        .update_event(current.user.id, id, request.into())
        .await?;
    Ok(Json(event))
}

pub async fn delete_event(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiPath(id): ApiPath<EventId>,
) -> ApiResult<StatusCode> {
    state.service.delete_event(current.user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
