use std::sync::Arc;

use axum::{Json, extract::State};
use chrono::Utc;

use crate::api::error::ApiResult;
use crate::api::extractors::CurrentUser;
use crate::api::state::AppState;
use crate::application::DashboardSummary;

pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> ApiResult<Json<DashboardSummary>> {
    Ok(Json(
        state.service.dashboard(current.user.id, Utc::now()).await?,
    ))
}
