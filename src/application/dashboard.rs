use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{BudgetPeriod, Cents, UserId, day_window, money};

use super::{AppError, JarvisService};

/// How far ahead the dashboard looks for upcoming events.
pub const UPCOMING_EVENTS_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub period: BudgetPeriod,
    pub finance: FinanceSummary,
    pub tasks: TaskSummary,
    pub upcoming_events: i64,
    pub calories: CalorieSummary,
}

/// Actual and planned money flows for the current month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinanceSummary {
    #[serde(with = "money::decimal")]
    pub actual_income: Cents,
    #[serde(with = "money::decimal")]
    pub actual_expenses: Cents,
    #[serde(with = "money::decimal")]
    pub net: Cents,
    #[serde(with = "money::decimal")]
    pub planned_income: Cents,
    #[serde(with = "money::decimal")]
    pub planned_expenses: Cents,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    pub open: i64,
    pub completed: i64,
    pub overdue: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalorieSummary {
    pub eaten: i64,
    pub burned: i64,
    pub net: i64,
}

impl JarvisService {
    /// Summarize the owner's month, tasks, week ahead and day as of `now`.
    ///
    /// Read-only: the month's budget is consulted for planned totals but not
    /// reconciled.
    pub async fn dashboard(
        &self,
        owner: UserId,
        now: DateTime<Utc>,
    ) -> Result<DashboardSummary, AppError> {
        let period = BudgetPeriod::containing(now);
        let (month_start, month_end) = period.window();

        let actuals = self
            .repo
            .sum_transactions(owner, month_start, month_end)
            .await?;
        let (planned_income, planned_expenses) = self
            .repo
            .get_budget_for_period(owner, period)
            .await?
            .map(|b| (b.total_income_budget, b.total_expense_budget))
            .unwrap_or((0, 0));

        let tasks = self.repo.count_tasks(owner, now).await?;
        let upcoming_events = self
            .repo
            .count_events_starting(owner, now, now + Duration::days(UPCOMING_EVENTS_DAYS))
            .await?;

        let (day_start, day_end) = day_window(now.date_naive());
        let (eaten, burned) = self.repo.sum_calories(owner, day_start, day_end).await?;

        Ok(DashboardSummary {
            period,
            finance: FinanceSummary {
                actual_income: actuals.income,
                actual_expenses: actuals.expenses,
                net: actuals.net(),
                planned_income,
                planned_expenses,
            },
            tasks: TaskSummary {
                open: tasks.open,
                completed: tasks.completed,
                overdue: tasks.overdue,
            },
            upcoming_events,
            calories: CalorieSummary {
                eaten,
                burned,
                net: eaten - burned,
            },
        })
    }
}
