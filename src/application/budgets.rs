use tracing::{debug, info, warn};

use crate::domain::{
    Budget, BudgetItemId, BudgetPeriod, Cents, MAX_YEAR, MIN_YEAR, TransactionType, UserId,
    reconcile,
};

use super::{AppError, JarvisService};

/// How many times a budget write is re-applied on a fresh copy after losing
/// a race with another writer.
pub const MAX_BUDGET_WRITE_ATTEMPTS: usize = 3;

/// Input for planning an amount for a category in a given month
#[derive(Debug, Clone)]
pub struct NewBudgetItem {
    pub category: String,
    pub kind: TransactionType,
    pub budget_cents: Cents,
    /// Zero-based month (0 = January)
    pub month: u32,
    pub year: i32,
}

impl JarvisService {
    // ========================
    // Budget operations
    // ========================

    /// List the owner's budgets, reconciled against current transactions.
    pub async fn list_budgets(
        &self,
        owner: UserId,
        month: Option<u32>,
        year: Option<i32>,
    ) -> Result<Vec<Budget>, AppError> {
        if month.is_some_and(|m| m > 11) {
            return Err(AppError::validation("month must be between 0 and 11"));
        }

        let budgets = self.repo.list_budgets(owner, month, year).await?;
        let mut reconciled = Vec::with_capacity(budgets.len());
        for budget in budgets {
            reconciled.push(self.reconcile_budget(budget).await?);
        }
        Ok(reconciled)
    }

    /// The owner's reconciled budget for one month, if any.
    pub async fn get_budget(
        &self,
        owner: UserId,
        period: BudgetPeriod,
    ) -> Result<Option<Budget>, AppError> {
        match self.repo.get_budget_for_period(owner, period).await? {
            Some(budget) => Ok(Some(self.reconcile_budget(budget).await?)),
            None => Ok(None),
        }
    }

    /// Recompute actual totals and per-item spend from the owner's
    /// transactions in the budget's month, and persist them if they changed.
    pub async fn reconcile_budget(&self, mut budget: Budget) -> Result<Budget, AppError> {
        for attempt in 1..=MAX_BUDGET_WRITE_ATTEMPTS {
            let (start, end) = budget.period().window();
            let transactions = self
                .repo
                .list_transactions_in_window(budget.owner, start, end)
                .await?;

            if !reconcile(&mut budget, &transactions) {
                return Ok(budget);
            }
            if self.repo.update_budget(&mut budget).await? {
                debug!(budget = %budget.id, period = %budget.period(), "Reconciled budget");
                return Ok(budget);
            }

            warn!(budget = %budget.id, attempt, "Budget changed during reconciliation");
            budget = self.reload_budget(&budget).await?;
        }
        Err(AppError::BudgetConflict(budget.id.to_string()))
    }

    /// Plan an amount for a category, creating the month's budget if needed.
    pub async fn add_budget_item(
        &self,
        owner: UserId,
        input: NewBudgetItem,
    ) -> Result<Budget, AppError> {
        let period = BudgetPeriod::new(input.month, input.year).ok_or_else(|| {
            AppError::validation(format!(
                "month must be between 0 and 11 and year between {} and {}",
                MIN_YEAR, MAX_YEAR
            ))
        })?;
        let category = input.category.trim().to_string();
        if category.is_empty() {
            return Err(AppError::validation("category is required"));
        }

        let budget = self.get_or_create_budget(owner, period).await?;
        let budget = self
            .modify_budget(budget, |b| {
                b.add_item(&category, input.kind, input.budget_cents)?;
                Ok(())
            })
            .await?;

        info!(budget = %budget.id, period = %period, category = %category, kind = %input.kind, "Added budget item");
        Ok(budget)
    }

    /// Change the planned amount of an item in any of the owner's budgets.
    pub async fn update_budget_item(
        &self,
        owner: UserId,
        item_id: BudgetItemId,
        budget_cents: Cents,
    ) -> Result<Budget, AppError> {
        let budget = self.budget_with_item(owner, item_id).await?;
        let budget = self
            .modify_budget(budget, |b| Ok(b.set_item_amount(item_id, budget_cents)?))
            .await?;

        info!(budget = %budget.id, item = %item_id, "Updated budget item");
        Ok(budget)
    }

    /// Remove an item from whichever of the owner's budgets holds it.
    pub async fn delete_budget_item(
        &self,
        owner: UserId,
        item_id: BudgetItemId,
    ) -> Result<Budget, AppError> {
        let budget = self.budget_with_item(owner, item_id).await?;
        let budget = self
            .modify_budget(budget, |b| {
                b.remove_item(item_id)?;
                Ok(())
            })
            .await?;

        info!(budget = %budget.id, item = %item_id, "Removed budget item");
        Ok(budget)
    }

    async fn budget_with_item(
        &self,
        owner: UserId,
        item_id: BudgetItemId,
    ) -> Result<Budget, AppError> {
        self.repo
            .find_budget_with_item(owner, item_id)
            .await?
            .ok_or(AppError::BudgetItemNotFound(item_id))
    }

    async fn get_or_create_budget(
        &self,
        owner: UserId,
        period: BudgetPeriod,
    ) -> Result<Budget, AppError> {
        if let Some(budget) = self.repo.get_budget_for_period(owner, period).await? {
            return Ok(budget);
        }

        // A concurrent insert for the same month makes ours a no-op.
        if self.repo.insert_budget_if_absent(&Budget::new(owner, period)).await? {
            info!(period = %period, "Created budget");
        }
        self.repo
            .get_budget_for_period(owner, period)
            .await?
            .ok_or_else(|| AppError::BudgetConflict(period.to_string()))
    }

    /// Apply `mutate` and write the result, re-applying on a fresh copy when
    /// another writer got there first. The returned budget is reconciled.
    async fn modify_budget<F>(&self, mut budget: Budget, mut mutate: F) -> Result<Budget, AppError>
    where
        F: FnMut(&mut Budget) -> Result<(), AppError>,
    {
        for attempt in 1..=MAX_BUDGET_WRITE_ATTEMPTS {
            mutate(&mut budget)?;
            if self.repo.update_budget(&mut budget).await? {
                return self.reconcile_budget(budget).await;
            }

            warn!(budget = %budget.id, attempt, "Budget changed during update");
            budget = self.reload_budget(&budget).await?;
        }
        Err(AppError::BudgetConflict(budget.id.to_string()))
    }

    async fn reload_budget(&self, stale: &Budget) -> Result<Budget, AppError> {
        self.repo
            .get_budget(stale.id)
            .await?
            .ok_or_else(|| AppError::BudgetConflict(stale.id.to_string()))
    }
}
