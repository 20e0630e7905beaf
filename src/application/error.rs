use thiserror::Error;

use crate::domain::{BudgetError, BudgetItemId, TransactionType};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("User already exists: {0}")]
    UserAlreadyExists(String),

    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Missing, unknown or expired session")]
    Unauthorized,

    #[error("Budget item not found: {0}")]
    BudgetItemNotFound(BudgetItemId),

    #[error("A {kind} budget item for category '{category}' already exists for this month")]
    DuplicateBudgetItem {
        category: String,
        kind: TransactionType,
    },

    #[error("Budget {0} was modified concurrently, try again")]
    BudgetConflict(String),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Event not found: {0}")]
    EventNotFound(String),

    #[error("Meal not found: {0}")]
    MealNotFound(String),

    #[error("Activity not found: {0}")]
    ActivityNotFound(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }
}

impl From<BudgetError> for AppError {
    fn from(err: BudgetError) -> Self {
        match err {
            BudgetError::DuplicateItem { category, kind } => {
                AppError::DuplicateBudgetItem { category, kind }
            }
            BudgetError::ItemNotFound(id) => AppError::BudgetItemNotFound(id),
            BudgetError::NegativeAmount(_) | BudgetError::AmountTooLarge(_) => {
                AppError::InvalidAmount(err.to_string())
            }
        }
    }
}
