//! Budget endpoints. Every read reconciles the returned budgets against the
//! owner's transactions.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::{BudgetQuery, CreateBudgetItemRequest, UpdateBudgetItemRequest};
use crate::api::error::ApiResult;
use crate::api::extractors::{ApiJson, ApiPath, ApiQuery, CurrentUser};
use crate::api::state::AppState;
use crate::domain::{Budget, BudgetItemId};

/// `GET /api/budget?month=&year=`
pub async fn list_budgets(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiQuery(query): ApiQuery<BudgetQuery>,
) -> ApiResult<Json<Vec<Budget>>> {
    let budgets = state
        .service
        .list_budgets(current.user.id, query.month, query.year)
        .await?;
    Ok(Json(budgets))
}

/// `POST /api/budget`
pub async fn create_budget_item(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiJson(request): ApiJson<CreateBudgetItemRequest>,
) -> ApiResult<(StatusCode, Json<Budget>)> {
    let budget = state
        .service
        .add_budget_item(current.user.id, request.into())
        .await?;
    Ok((StatusCode::CREATED, Json(budget)))
}

/// `PUT /api/budget/:item_id`
pub async fn update_budget_item(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiPath(item_id): ApiPath<BudgetItemId>,
    ApiJson(request): ApiJson<UpdateBudgetItemRequest>,
) -> ApiResult<Json<Budget>> {
    let budget = state
        .service
        .update_budget_item(current.user.id, item_id, request.budget_amount)
        .await?;
    Ok(Json(budget))
}

/// `DELETE /api/budget/:item_id`
pub async fn delete_budget_item(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiPath(item_id): ApiPath<BudgetItemId>,
) -> ApiResult<Json<Budget>> {
    let budget = state
        .service
        .delete_budget_item(current.user.id, item_id)
        .await?;
    Ok(Json(budget))
}
