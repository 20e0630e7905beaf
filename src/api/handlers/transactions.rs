use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;

use crate::api::dto::{CreateTransactionRequest, TransactionQuery};
use crate::api::error::ApiResult;
use crate::api::extractors::{ApiJson, ApiPath, ApiQuery, CurrentUser};
use crate::api::state::AppState;
use crate::application::TransactionFilter;
use crate::domain::{Transaction, TransactionId};

pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiQuery(query): ApiQuery<TransactionQuery>,
) -> ApiResult<Json<Vec<Transaction>>> {
    let filter = TransactionFilter::try_from(query)?;
    let transactions = state
        .service
        .list_transactions(current.user.id, filter)
        .await?;
    Ok(Json(transactions))
}

pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiJson(request): ApiJson<CreateTransactionRequest>,
) -> ApiResult<(StatusCode, Json<Transaction>)> {
    let tx = state
        .service
        .create_transaction(current.user.id, request.into_new(Utc::now()))
        .await?;
    Ok((StatusCode::CREATED, Json(tx)))
}

pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiPath(id): ApiPath<TransactionId>,
) -> ApiResult<Json<Transaction>> {
    Ok(Json(
        state.service.get_transaction(current.user.id, id).await?,
    ))
}

pub async fn delete_transaction(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiPath(id): ApiPath<TransactionId>,
) -> ApiResult<StatusCode> {
    state.service.delete_transaction(current.user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
