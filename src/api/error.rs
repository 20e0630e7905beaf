use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::AppError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Body of every error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Unauthorized => Self::Unauthorized,

            AppError::UserNotFound(_)
            | AppError::BudgetItemNotFound(_)
            | AppError::TransactionNotFound(_)
            | AppError::TaskNotFound(_)
            | AppError::EventNotFound(_)
            | AppError::MealNotFound(_)
            | AppError::ActivityNotFound(_) => Self::NotFound(err.to_string()),

            AppError::InvalidUsername(_)
            | AppError::DuplicateBudgetItem { .. }
            | AppError::InvalidAmount(_)
            | AppError::Validation(_) => Self::Validation(err.to_string()),

            AppError::UserAlreadyExists(_) | AppError::BudgetConflict(_) => {
                Self::Conflict(err.to_string())
            }

            AppError::Database(e) => {
                tracing::error!(error = ?e, "Database error");
                Self::Internal
            }
        }
    }
}
