use std::collections::HashMap;

use super::{Budget, Cents, Transaction, TransactionType};

/// Actual income and expenses over a set of transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Actuals {
    pub income: Cents,
    pub expenses: Cents,
}

impl Actuals {
    pub fn net(&self) -> Cents {
        self.income.saturating_sub(self.expenses)
    }
}

pub fn compute_actuals<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Actuals {
    transactions
        .into_iter()
        .fold(Actuals::default(), |mut actuals, tx| {
            match tx.kind {
                TransactionType::Income => {
                    actuals.income = actuals.income.saturating_add(tx.amount_cents)
                }
                TransactionType::Expense => {
                    actuals.expenses = actuals.expenses.saturating_add(tx.amount_cents)
                }
            }
            actuals
        })
}

/// Sum of amounts per (type, category).
pub fn spend_by_category<'a>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
) -> HashMap<(TransactionType, &'a str), Cents> {
    let mut totals: HashMap<(TransactionType, &str), Cents> = HashMap::new();
    for tx in transactions {
        let total = totals.entry((tx.kind, tx.category.as_str())).or_insert(0);
        *total = total.saturating_add(tx.amount_cents);
    }
    totals
}

/// Recompute a budget's actual totals and per-item spend from transactions.
///
/// Only transactions belonging to the budget's owner and dated inside the
/// budget's month count; callers may pass a wider set. Returns whether any
/// derived field changed, so an unchanged budget need not be written back.
pub fn reconcile(budget: &mut Budget, transactions: &[Transaction]) -> bool {
    let period = budget.period();
    let owner = budget.owner;
    let in_window: Vec<&Transaction> = transactions
        .iter()
        .filter(|tx| tx.owner == owner && period.contains(tx.date))
        .collect();

    let actuals = compute_actuals(in_window.iter().copied());
    let spend = spend_by_category(in_window.iter().copied());

    let mut changed = false;
    if budget.actual_income != actuals.income || budget.actual_expenses != actuals.expenses {
        budget.actual_income = actuals.income;
        budget.actual_expenses = actuals.expenses;
        changed = true;
    }

    for item in &mut budget.items {
        let spent = spend
            .get(&(item.kind, item.category.as_str()))
            .copied()
            .unwrap_or(0);
        if item.spent_cents != spent {
            item.spent_cents = spent;
            changed = true;
        }
    }

    if !budget.totals_consistent() {
        budget.recompute_totals();
        changed = true;
    }

    changed
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::domain::{BudgetPeriod, UserId, parse_date};

    fn expense(owner: UserId, category: &str, amount: Cents, date: &str) -> Transaction {
        Transaction::new(
            owner,
            TransactionType::Expense,
            amount,
            category,
            parse_date(date).unwrap(),
        )
    }

    fn income(owner: UserId, category: &str, amount: Cents, date: &str) -> Transaction {
        Transaction::new(
            owner,
            TransactionType::Income,
            amount,
            category,
            parse_date(date).unwrap(),
        )
    }

    #[test]
    fn test_compute_actuals() {
        let owner = Uuid::new_v4();
        let txs = vec![
            income(owner, "Salary", 300000, "2024-03-01"),
            expense(owner, "Food", 3000, "2024-03-05"),
            expense(owner, "Rent", 90000, "2024-03-02"),
        ];
        let actuals = compute_actuals(&txs);
        assert_eq!(actuals.income, 300000);
        assert_eq!(actuals.expenses, 93000);
        assert_eq!(actuals.net(), 207000);
    }

    #[test]
    fn test_spent_counts_only_month_window() {
        let owner = Uuid::new_v4();
        let mut budget = Budget::new(owner, BudgetPeriod::new(2, 2024).unwrap());
        let food = budget
            .add_item("Food", TransactionType::Expense, 10000)
            .unwrap();

        let txs = vec![
            expense(owner, "Food", 3000, "2024-03-05"),
            expense(owner, "Food", 2000, "2024-03-20"),
            expense(owner, "Food", 5000, "2024-04-01"),
        ];

        assert!(reconcile(&mut budget, &txs));
        assert_eq!(budget.find_item(food).unwrap().spent_cents, 5000);
        assert_eq!(budget.actual_expenses, 5000);
        assert_eq!(budget.actual_income, 0);
    }

    #[test]
    fn test_spent_matches_type_and_category() {
        let owner = Uuid::new_v4();
        let mut budget = Budget::new(owner, BudgetPeriod::new(0, 2024).unwrap());
        let freelance_in = budget
            .add_item("Freelance", TransactionType::Income, 50000)
            .unwrap();
        let freelance_out = budget
            .add_item("Freelance", TransactionType::Expense, 5000)
            .unwrap();
        let fun = budget
            .add_item("Fun", TransactionType::Expense, 5000)
            .unwrap();

        let txs = vec![
            income(owner, "Freelance", 42000, "2024-01-10"),
            expense(owner, "Freelance", 1500, "2024-01-11"),
            expense(owner, "Groceries", 800, "2024-01-12"),
        ];
        reconcile(&mut budget, &txs);

        assert_eq!(budget.find_item(freelance_in).unwrap().spent_cents, 42000);
        assert_eq!(budget.find_item(freelance_out).unwrap().spent_cents, 1500);
        assert_eq!(budget.find_item(fun).unwrap().spent_cents, 0);
        // Uncategorized spending still counts toward the actual totals
        assert_eq!(budget.actual_expenses, 2300);
    }

    #[test]
    fn test_other_owners_ignored() {
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let mut budget = Budget::new(owner, BudgetPeriod::new(2, 2024).unwrap());
        budget
            .add_item("Food", TransactionType::Expense, 10000)
            .unwrap();

        let txs = vec![expense(stranger, "Food", 9999, "2024-03-05")];
        assert!(!reconcile(&mut budget, &txs));
        assert_eq!(budget.actual_expenses, 0);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let owner = Uuid::new_v4();
        let mut budget = Budget::new(owner, BudgetPeriod::new(2, 2024).unwrap());
        budget
            .add_item("Food", TransactionType::Expense, 10000)
            .unwrap();
        let txs = vec![
            expense(owner, "Food", 3000, "2024-03-05"),
            income(owner, "Salary", 100000, "2024-03-28"),
        ];

        assert!(reconcile(&mut budget, &txs));
        let first = budget.clone();
        assert!(!reconcile(&mut budget, &txs));
        assert_eq!(budget, first);
    }

    #[test]
    fn test_stale_spend_is_cleared() {
        let owner = Uuid::new_v4();
        let mut budget = Budget::new(owner, BudgetPeriod::new(2, 2024).unwrap());
        let food = budget
            .add_item("Food", TransactionType::Expense, 10000)
            .unwrap();
        reconcile(&mut budget, &[expense(owner, "Food", 3000, "2024-03-05")]);

        // The transaction was deleted since the last read
        assert!(reconcile(&mut budget, &[]));
        assert_eq!(budget.find_item(food).unwrap().spent_cents, 0);
        assert_eq!(budget.actual_expenses, 0);
    }

    #[test]
    fn test_sums_saturate_instead_of_overflowing() {
        let owner = Uuid::new_v4();
        let mut budget = Budget::new(owner, BudgetPeriod::new(2, 2024).unwrap());
        let food = budget
            .add_item("Food", TransactionType::Expense, 10000)
            .unwrap();
        let huge = i64::MAX / 100 * 100;
        let txs = vec![
            expense(owner, "Food", huge, "2024-03-05"),
            expense(owner, "Food", huge, "2024-03-06"),
        ];

        assert!(reconcile(&mut budget, &txs));
        assert_eq!(budget.actual_expenses, i64::MAX);
        assert_eq!(budget.find_item(food).unwrap().spent_cents, i64::MAX);
    }
}
