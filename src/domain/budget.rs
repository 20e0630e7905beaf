use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{BudgetPeriod, Cents, MAX_AMOUNT_CENTS, TransactionType, UserId, money};

pub type BudgetId = Uuid;
pub type BudgetItemId = Uuid;

/// Planned amount for one (category, type) pair within a month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetItem {
    pub id: BudgetItemId,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(rename = "budgetAmount", with = "money::decimal")]
    pub budget_cents: Cents,
    /// Derived; overwritten on every reconciliation.
    #[serde(rename = "spentAmount", with = "money::decimal")]
    pub spent_cents: Cents,
}

impl BudgetItem {
    pub fn new(category: impl Into<String>, kind: TransactionType, budget_cents: Cents) -> Self {
        Self {
            id: Uuid::new_v4(),
            category: category.into(),
            kind,
            budget_cents,
            spent_cents: 0,
        }
    }

    pub fn matches(&self, category: &str, kind: TransactionType) -> bool {
        self.kind == kind && self.category == category
    }

    /// Planned minus spent; negative once the plan is exceeded.
    pub fn remaining_cents(&self) -> Cents {
        self.budget_cents.saturating_sub(self.spent_cents)
    }
}

/// Per-owner, per-month plan. Every field except `items`, the identity
/// fields and `version` is derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: BudgetId,
    pub owner: UserId,
    /// Zero-based month (0 = January)
    pub month: u32,
    pub year: i32,
    #[serde(rename = "totalIncomeBudget", with = "money::decimal")]
    pub total_income_budget: Cents,
    #[serde(rename = "totalExpenseBudget", with = "money::decimal")]
    pub total_expense_budget: Cents,
    #[serde(rename = "actualIncome", with = "money::decimal")]
    pub actual_income: Cents,
    #[serde(rename = "actualExpenses", with = "money::decimal")]
    pub actual_expenses: Cents,
    pub items: Vec<BudgetItem>,
    /// Bumped by the repository on every successful write; a write carrying a
    /// stale version is refused.
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    pub fn new(owner: UserId, period: BudgetPeriod) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            month: period.month,
            year: period.year,
            total_income_budget: 0,
            total_expense_budget: 0,
            actual_income: 0,
            actual_expenses: 0,
            items: Vec::new(),
            version: 0,
            updated_at: Utc::now(),
        }
    }

    pub fn period(&self) -> BudgetPeriod {
        BudgetPeriod {
            year: self.year,
            month: self.month,
        }
    }

    pub fn find_item(&self, item_id: BudgetItemId) -> Option<&BudgetItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    /// Add a planned amount for a category. At most one item may exist per
    /// (category, type) pair; on rejection the budget is left untouched.
    pub fn add_item(
        &mut self,
        category: &str,
        kind: TransactionType,
        budget_cents: Cents,
    ) -> Result<BudgetItemId, BudgetError> {
        validate_budget_amount(budget_cents)?;
        if self.items.iter().any(|item| item.matches(category, kind)) {
            return Err(BudgetError::DuplicateItem {
                category: category.to_string(),
                kind,
            });
        }

        let item = BudgetItem::new(category, kind, budget_cents);
        let id = item.id;
        self.items.push(item);
        self.recompute_totals();
        Ok(id)
    }

    /// Overwrite the planned amount of an existing item.
    pub fn set_item_amount(
        &mut self,
        item_id: BudgetItemId,
        budget_cents: Cents,
    ) -> Result<(), BudgetError> {
        validate_budget_amount(budget_cents)?;
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == item_id)
            .ok_or(BudgetError::ItemNotFound(item_id))?;
        item.budget_cents = budget_cents;
        self.recompute_totals();
        Ok(())
    }

    pub fn remove_item(&mut self, item_id: BudgetItemId) -> Result<BudgetItem, BudgetError> {
        let index = self
            .items
            .iter()
            .position(|item| item.id == item_id)
            .ok_or(BudgetError::ItemNotFound(item_id))?;
        let removed = self.items.remove(index);
        self.recompute_totals();
        Ok(removed)
    }

    /// Recompute planned totals from the items.
    pub fn recompute_totals(&mut self) {
        self.total_income_budget = planned_total(&self.items, TransactionType::Income);
        self.total_expense_budget = planned_total(&self.items, TransactionType::Expense);
    }

    /// True when the planned totals agree with the items.
    pub fn totals_consistent(&self) -> bool {
        self.total_income_budget == planned_total(&self.items, TransactionType::Income)
            && self.total_expense_budget == planned_total(&self.items, TransactionType::Expense)
    }
}

fn planned_total(items: &[BudgetItem], kind: TransactionType) -> Cents {
    items
        .iter()
        .filter(|item| item.kind == kind)
        .fold(0, |total: Cents, item| total.saturating_add(item.budget_cents))
}

fn validate_budget_amount(budget_cents: Cents) -> Result<(), BudgetError> {
    if budget_cents < 0 {
        return Err(BudgetError::NegativeAmount(budget_cents));
    }
    if budget_cents > MAX_AMOUNT_CENTS {
        return Err(BudgetError::AmountTooLarge(budget_cents));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BudgetError {
    DuplicateItem {
        category: String,
        kind: TransactionType,
    },
    ItemNotFound(BudgetItemId),
    NegativeAmount(Cents),
    AmountTooLarge(Cents),
}

impl std::fmt::Display for BudgetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BudgetError::DuplicateItem { category, kind } => write!(
                f,
                "A {} budget item for category '{}' already exists for this month",
                kind, category
            ),
            BudgetError::ItemNotFound(id) => write!(f, "Budget item not found: {}", id),
            BudgetError::NegativeAmount(cents) => write!(
                f,
                "Budget amount must not be negative (got {})",
                money::format_cents(*cents)
            ),
            BudgetError::AmountTooLarge(cents) => write!(
                f,
                "Budget amount must not exceed {} (got {})",
                money::format_cents(MAX_AMOUNT_CENTS),
                money::format_cents(*cents)
            ),
        }
    }
}

impl std::error::Error for BudgetError {}
