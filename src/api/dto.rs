//! Request bodies and query strings. Field names follow the JSON the web
//! client sends (camelCase, `type` for the income/expense direction).

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::application::{
    NewActivity, NewBudgetItem, NewEvent, NewMeal, NewTask, NewTransaction, TransactionFilter,
};
use crate::domain::{
    Cents, EventChanges, MealType, Priority, TaskChanges, TransactionType, day_window,
    flexible_date, money, parse_date,
};

use super::error::ApiError;

// =============================================================================
// Budget
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BudgetQuery {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBudgetItemRequest {
    pub category: String,
    #[serde(with = "money::decimal")]
    pub budget_amount: Cents,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub month: u32,
    pub year: i32,
}

impl From<CreateBudgetItemRequest> for NewBudgetItem {
    fn from(req: CreateBudgetItemRequest) -> Self {
        NewBudgetItem {
            category: req.category,
            kind: req.kind,
            budget_cents: req.budget_amount,
            month: req.month,
            year: req.year,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBudgetItemRequest {
    #[serde(with = "money::decimal")]
    pub budget_amount: Cents,
}

// =============================================================================
// Transactions
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(with = "money::decimal")]
    pub amount: Cents,
    #[serde(default)]
    pub description: String,
    pub category: String,
    /// Defaults to now
    #[serde(default, with = "flexible_date::option")]
    pub date: Option<DateTime<Utc>>,
}

impl CreateTransactionRequest {
    pub fn into_new(self, now: DateTime<Utc>) -> NewTransaction {
        NewTransaction {
            kind: self.kind,
            amount_cents: self.amount,
            description: self.description,
            category: self.category,
            date: self.date.unwrap_or(now),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionQuery {
    #[serde(rename = "type")]
    pub kind: Option<TransactionType>,
    pub category: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub limit: Option<usize>,
}

impl TryFrom<TransactionQuery> for TransactionFilter {
    type Error = ApiError;

    fn try_from(query: TransactionQuery) -> Result<Self, Self::Error> {
        Ok(TransactionFilter {
            kind: query.kind,
            category: query.category.filter(|c| !c.trim().is_empty()),
            from_date: lower_bound(query.from.as_deref(), "from")?,
            to_date: upper_bound(query.to.as_deref(), "to")?,
            limit: query.limit,
        })
    }
}

// =============================================================================
// Tasks and events
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskQuery {
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    #[serde(default, with = "flexible_date::option")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: Priority,
}

impl From<CreateTaskRequest> for NewTask {
    fn from(req: CreateTaskRequest) -> Self {
        NewTask {
            title: req.title,
            description: req.description,
            due_date: req.due_date,
            priority: req.priority,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, with = "flexible_date::option")]
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Option<Priority>,
    pub completed: Option<bool>,
}

impl From<UpdateTaskRequest> for TaskChanges {
    fn from(req: UpdateTaskRequest) -> Self {
        TaskChanges {
            title: req.title,
            description: req.description,
            due_date: req.due_date,
            priority: req.priority,
            completed: req.completed,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl EventQuery {
    pub fn bounds(&self) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>), ApiError> {
        Ok((
            lower_bound(self.from.as_deref(), "from")?,
            upper_bound(self.to.as_deref(), "to")?,
        ))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    #[serde(with = "flexible_date")]
    pub start: DateTime<Utc>,
    #[serde(with = "flexible_date")]
    pub end: DateTime<Utc>,
}

impl From<CreateEventRequest> for NewEvent {
    fn from(req: CreateEventRequest) -> Self {
        NewEvent {
            title: req.title,
            description: req.description,
            location: req.location,
            start: req.start,
            end: req.end,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    #[serde(default, with = "flexible_date::option")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, with = "flexible_date::option")]
    pub end: Option<DateTime<Utc>>,
}

impl From<UpdateEventRequest> for EventChanges {
    fn from(req: UpdateEventRequest) -> Self {
        EventChanges {
            title: req.title,
            description: req.description,
            location: req.location,
            start: req.start,
            end: req.end,
        }
    }
}

// =============================================================================
// Meals and fitness
// =============================================================================

/// `?date=YYYY-MM-DD` narrows a listing to one day.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DayQuery {
    pub date: Option<String>,
}

impl DayQuery {
    pub fn day(&self) -> Result<Option<NaiveDate>, ApiError> {
        self.date
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .map(|d| {
                parse_date(d)
                    .map(|dt| dt.date_naive())
                    .ok_or_else(|| ApiError::Validation(format!("invalid date '{}'", d)))
            })
            .transpose()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMealRequest {
    pub name: String,
    pub meal_type: MealType,
    pub calories: i64,
    #[serde(default, with = "flexible_date::option")]
    pub date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl CreateMealRequest {
    pub fn into_new(self, now: DateTime<Utc>) -> NewMeal {
        NewMeal {
            name: self.name,
            meal_type: self.meal_type,
            calories: self.calories,
            date: self.date.unwrap_or(now),
            notes: self.notes,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateActivityRequest {
    pub activity_type: String,
    pub duration_minutes: i64,
    #[serde(default)]
    pub calories_burned: i64,
    #[serde(default, with = "flexible_date::option")]
    pub date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl CreateActivityRequest {
    pub fn into_new(self, now: DateTime<Utc>) -> NewActivity {
        NewActivity {
            activity_type: self.activity_type,
            duration_minutes: self.duration_minutes,
            calories_burned: self.calories_burned,
            date: self.date.unwrap_or(now),
            notes: self.notes,
        }
    }
}

// =============================================================================
// Misc
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

fn lower_bound(raw: Option<&str>, field: &str) -> Result<Option<DateTime<Utc>>, ApiError> {
    raw.filter(|s| !s.trim().is_empty())
        .map(|s| {
            parse_date(s).ok_or_else(|| ApiError::Validation(format!("invalid '{}' date '{}'", field, s)))
        })
        .transpose()
}

/// A plain date as upper bound covers that whole day.
fn upper_bound(raw: Option<&str>, field: &str) -> Result<Option<DateTime<Utc>>, ApiError> {
    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
        return Ok(None);
    };
    if let Ok(date) = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
        let (_, next_day) = day_window(date);
        return Ok(Some(next_day - Duration::microseconds(1)));
    }
    lower_bound(Some(raw), field)
}
