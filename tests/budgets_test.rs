mod common;

use anyhow::Result;
use common::{
    TestUser, expense, income, parse_date, second_repository, second_service, test_service,
};
use jarvis::application::{AppError, NewBudgetItem, NewTransaction};
use jarvis::domain::{BudgetPeriod, MAX_AMOUNT_CENTS, TransactionType};

fn item(category: &str, kind: TransactionType, cents: i64, month: u32, year: i32) -> NewBudgetItem {
    NewBudgetItem {
        category: category.to_string(),
        kind,
        budget_cents: cents,
        month,
        year,
    }
}

fn march_2024(category: &str, kind: TransactionType, cents: i64) -> NewBudgetItem {
    item(category, kind, cents, 2, 2024)
}

#[tokio::test]
async fn test_spent_amount_counts_only_the_budget_month() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let ada = TestUser::create(&service, "ada").await?.user;

    expense(&service, &ada, "Food", 3000, "2024-03-05").await?;
    expense(&service, &ada, "Food", 2000, "2024-03-20").await?;
    expense(&service, &ada, "Food", 5000, "2024-04-01").await?;

    service
        .add_budget_item(ada.id, march_2024("Food", TransactionType::Expense, 10000))
        .await?;

    let budgets = service.list_budgets(ada.id, Some(2), Some(2024)).await?;
    assert_eq!(budgets.len(), 1);
    let march = &budgets[0];
    assert_eq!(march.items[0].spent_cents, 5000);
    assert_eq!(march.actual_expenses, 5000);
    assert_eq!(march.actual_income, 0);
    assert_eq!(march.total_expense_budget, 10000);

    Ok(())
}

#[tokio::test]
async fn test_add_returns_reconciled_budget() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let ada = TestUser::create(&service, "ada").await?.user;
    expense(&service, &ada, "Food", 1250, "2024-03-31T23:30:00Z").await?;

    let budget = service
        .add_budget_item(ada.id, march_2024("Food", TransactionType::Expense, 10000))
        .await?;

    // The whole last day of the month is inside the window
    assert_eq!(budget.items[0].spent_cents, 1250);
    assert_eq!(budget.actual_expenses, 1250);

    Ok(())
}

#[tokio::test]
async fn test_items_match_on_type_and_category() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let ada = TestUser::create(&service, "ada").await?.user;

    income(&service, &ada, "Salary", 300000, "2024-03-01").await?;
    expense(&service, &ada, "Salary", 999, "2024-03-02").await?;
    expense(&service, &ada, "Rent", 80000, "2024-03-03").await?;

    service
        .add_budget_item(ada.id, march_2024("Salary", TransactionType::Income, 300000))
        .await?;
    let budget = service
        .add_budget_item(ada.id, march_2024("Rent", TransactionType::Expense, 80000))
        .await?;

    let salary = budget.items.iter().find(|i| i.category == "Salary").unwrap();
    let rent = budget.items.iter().find(|i| i.category == "Rent").unwrap();
    assert_eq!(salary.spent_cents, 300000);
    assert_eq!(rent.spent_cents, 80000);
    assert_eq!(budget.actual_income, 300000);
    assert_eq!(budget.actual_expenses, 80999);

    Ok(())
}

#[tokio::test]
async fn test_duplicate_item_is_rejected_without_mutation() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let ada = TestUser::create(&service, "ada").await?.user;

    let before = service
        .add_budget_item(ada.id, march_2024("Food", TransactionType::Expense, 10000))
        .await?;

    let result = service
        .add_budget_item(ada.id, march_2024("Food", TransactionType::Expense, 5000))
        .await;
    assert!(matches!(result, Err(AppError::DuplicateBudgetItem { .. })));

    let after = service
        .get_budget(ada.id, BudgetPeriod::new(2, 2024).unwrap())
        .await?
        .expect("budget exists");
    assert_eq!(after.items, before.items);
    assert_eq!(after.total_expense_budget, 10000);
    assert_eq!(after.version, before.version);

    // Same category with the other type is a different item
    let with_income = service
        .add_budget_item(ada.id, march_2024("Food", TransactionType::Income, 2000))
        .await?;
    assert_eq!(with_income.items.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_totals_follow_every_change() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let ada = TestUser::create(&service, "ada").await?.user;

    service
        .add_budget_item(ada.id, march_2024("Salary", TransactionType::Income, 300000))
        .await?;
    service
        .add_budget_item(ada.id, march_2024("Food", TransactionType::Expense, 10000))
        .await?;
    let budget = service
        .add_budget_item(ada.id, march_2024("Rent", TransactionType::Expense, 80000))
        .await?;
    assert_eq!(budget.total_income_budget, 300000);
    assert_eq!(budget.total_expense_budget, 90000);

    let food = budget.items.iter().find(|i| i.category == "Food").unwrap().id;
    let rent = budget.items.iter().find(|i| i.category == "Rent").unwrap().id;

    let budget = service.update_budget_item(ada.id, food, 15000).await?;
    assert_eq!(budget.total_expense_budget, 95000);
    assert!(budget.totals_consistent());

    let budget = service.delete_budget_item(ada.id, rent).await?;
    assert_eq!(budget.total_expense_budget, 15000);
    assert_eq!(budget.total_income_budget, 300000);
    assert_eq!(budget.items.len(), 2);
    assert!(budget.totals_consistent());

    Ok(())
}

#[tokio::test]
async fn test_missing_item_is_not_found_and_totals_unchanged() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let ada = TestUser::create(&service, "ada").await?.user;
    let before = service
        .add_budget_item(ada.id, march_2024("Food", TransactionType::Expense, 10000))
        .await?;

    let missing = uuid::Uuid::new_v4();
    let result = service.delete_budget_item(ada.id, missing).await;
    assert!(matches!(result, Err(AppError::BudgetItemNotFound(id)) if id == missing));

    let result = service.update_budget_item(ada.id, missing, 1).await;
    assert!(matches!(result, Err(AppError::BudgetItemNotFound(_))));

    let after = service.list_budgets(ada.id, None, None).await?;
    assert_eq!(after[0].total_expense_budget, before.total_expense_budget);
    assert_eq!(after[0].items.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_invalid_input_is_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let ada = TestUser::create(&service, "ada").await?.user;

    let result = service
        .add_budget_item(ada.id, item("Food", TransactionType::Expense, 100, 12, 2024))
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    let result = service
        .add_budget_item(ada.id, march_2024("   ", TransactionType::Expense, 100))
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    let result = service
        .add_budget_item(ada.id, march_2024("Food", TransactionType::Expense, -1))
        .await;
    assert!(matches!(result, Err(AppError::InvalidAmount(_))));

    let result = service.list_budgets(ada.id, Some(12), None).await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    Ok(())
}

#[tokio::test]
async fn test_reconciliation_is_idempotent() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let ada = TestUser::create(&service, "ada").await?.user;
    service
        .add_budget_item(ada.id, march_2024("Food", TransactionType::Expense, 10000))
        .await?;
    expense(&service, &ada, "Food", 3000, "2024-03-05").await?;

    let first = service.list_budgets(ada.id, None, None).await?;
    let second = service.list_budgets(ada.id, None, None).await?;

    assert_eq!(first, second);
    assert_eq!(second[0].items[0].spent_cents, 3000);

    Ok(())
}

#[tokio::test]
async fn test_reads_pick_up_new_and_deleted_transactions() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let ada = TestUser::create(&service, "ada").await?.user;
    let budget = service
        .add_budget_item(ada.id, march_2024("Food", TransactionType::Expense, 10000))
        .await?;
    assert_eq!(budget.items[0].spent_cents, 0);

    let tx = expense(&service, &ada, "Food", 4200, "2024-03-10").await?;
    let budget = service.list_budgets(ada.id, None, None).await?.remove(0);
    assert_eq!(budget.items[0].spent_cents, 4200);
    let version_with_spend = budget.version;

    service.delete_transaction(ada.id, tx.id).await?;
    let budget = service.list_budgets(ada.id, None, None).await?.remove(0);
    assert_eq!(budget.items[0].spent_cents, 0);
    assert_eq!(budget.actual_expenses, 0);
    assert!(budget.version > version_with_spend);

    Ok(())
}

#[tokio::test]
async fn test_stale_write_is_refused() -> Result<()> {
    let (service, temp) = test_service().await?;
    let other_process = second_repository(&temp).await?;
    let ada = TestUser::create(&service, "ada").await?.user;
    let period = BudgetPeriod::new(2, 2024).unwrap();

    service
        .add_budget_item(ada.id, march_2024("Food", TransactionType::Expense, 10000))
        .await?;
    let mut stale = other_process
        .get_budget_for_period(ada.id, period)
        .await?
        .expect("budget exists");

    // Someone else writes in between
    service
        .add_budget_item(ada.id, march_2024("Rent", TransactionType::Expense, 80000))
        .await?;

    stale.add_item("Travel", TransactionType::Expense, 50000)?;
    assert!(!other_process.update_budget(&mut stale).await?);

    let current = service.get_budget(ada.id, period).await?.unwrap();
    let categories: Vec<&str> = current.items.iter().map(|i| i.category.as_str()).collect();
    assert_eq!(categories, vec!["Food", "Rent"]);
    assert_eq!(current.total_expense_budget, 90000);

    // Re-applied on a fresh copy, the same change goes through
    let mut fresh = other_process.get_budget(current.id).await?.unwrap();
    fresh.add_item("Travel", TransactionType::Expense, 50000)?;
    assert!(other_process.update_budget(&mut fresh).await?);
    assert_eq!(fresh.version, current.version + 1);

    Ok(())
}

#[tokio::test]
async fn test_budgets_are_private_to_their_owner() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let ada = TestUser::create(&service, "ada").await?.user;
    let bob = TestUser::create(&service, "bob").await?.user;

    expense(&service, &bob, "Food", 7000, "2024-03-05").await?;
    let budget = service
        .add_budget_item(ada.id, march_2024("Food", TransactionType::Expense, 10000))
        .await?;
    assert_eq!(budget.items[0].spent_cents, 0);

    let item_id = budget.items[0].id;
    let result = service.update_budget_item(bob.id, item_id, 1).await;
    assert!(matches!(result, Err(AppError::BudgetItemNotFound(_))));
    assert!(service.list_budgets(bob.id, None, None).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_list_filters_by_month_and_year() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let ada = TestUser::create(&service, "ada").await?.user;

    for (month, year) in [(0, 2024), (2, 2024), (2, 2025)] {
        service
            .add_budget_item(ada.id, item("Food", TransactionType::Expense, 100, month, year))
            .await?;
    }

    let all = service.list_budgets(ada.id, None, None).await?;
    let periods: Vec<String> = all.iter().map(|b| b.period().to_string()).collect();
    assert_eq!(periods, vec!["2024-01", "2024-03", "2025-03"]);

    assert_eq!(service.list_budgets(ada.id, Some(2), None).await?.len(), 2);
    assert_eq!(service.list_budgets(ada.id, None, Some(2024)).await?.len(), 2);
    assert_eq!(service.list_budgets(ada.id, Some(0), Some(2025)).await?.len(), 0);

    Ok(())
}

#[tokio::test]
async fn test_concurrent_adds_from_two_servers_both_land() -> Result<()> {
    let (service, temp) = test_service().await?;
    let other_server = second_service(&temp).await?;
    let ada = TestUser::create(&service, "ada").await?.user;
    let period = BudgetPeriod::new(2, 2024).unwrap();

    // The budget exists up front so every round races on the same version
    service
        .add_budget_item(ada.id, march_2024("Food", TransactionType::Expense, 100))
        .await?;

    for round in 0..5 {
        let (left, right) = tokio::join!(
            service.add_budget_item(
                ada.id,
                march_2024(&format!("Left {}", round), TransactionType::Expense, 1000),
            ),
            other_server.add_budget_item(
                ada.id,
                march_2024(&format!("Right {}", round), TransactionType::Income, 500),
            ),
        );
        left?;
        right?;
    }

    let budget = service.get_budget(ada.id, period).await?.unwrap();
    assert_eq!(budget.items.len(), 11);
    assert!(budget.totals_consistent());
    assert_eq!(budget.total_expense_budget, 100 + 5 * 1000);
    assert_eq!(budget.total_income_budget, 5 * 500);
    // One write per item, and nothing else
    assert_eq!(budget.version, 11);

    Ok(())
}

#[tokio::test]
async fn test_reconciliation_retries_on_a_fresh_copy() -> Result<()> {
    let (service, temp) = test_service().await?;
    let other_process = second_repository(&temp).await?;
    let ada = TestUser::create(&service, "ada").await?.user;
    let period = BudgetPeriod::new(2, 2024).unwrap();

    service
        .add_budget_item(ada.id, march_2024("Food", TransactionType::Expense, 10000))
        .await?;
    let stale = other_process
        .get_budget_for_period(ada.id, period)
        .await?
        .unwrap();

    let current = service
        .add_budget_item(ada.id, march_2024("Rent", TransactionType::Expense, 80000))
        .await?;
    expense(&service, &ada, "Food", 3000, "2024-03-05").await?;

    // The stale copy loses its write, is reloaded and reconciled again
    let reconciled = service.reconcile_budget(stale).await?;
    assert_eq!(reconciled.version, current.version + 1);
    assert_eq!(reconciled.items.len(), 2);
    assert_eq!(reconciled.items[0].spent_cents, 3000);
    assert_eq!(reconciled.total_expense_budget, 90000);

    let stored = other_process.get_budget(reconciled.id).await?.unwrap();
    assert_eq!(stored, reconciled);

    Ok(())
}

#[tokio::test]
async fn test_reads_never_see_half_written_budgets() -> Result<()> {
    let (service, temp) = test_service().await?;
    let reader = second_repository(&temp).await?;
    let ada = TestUser::create(&service, "ada").await?.user;
    let period = BudgetPeriod::new(2, 2024).unwrap();
    service
        .add_budget_item(ada.id, march_2024("Item 0", TransactionType::Expense, 100))
        .await?;

    let writes = async {
        for i in 1..=20 {
            service
                .add_budget_item(
                    ada.id,
                    march_2024(&format!("Item {}", i), TransactionType::Expense, 100),
                )
                .await?;
        }
        Ok::<_, anyhow::Error>(())
    };
    let reads = async {
        for _ in 0..40 {
            let budget = reader.get_budget_for_period(ada.id, period).await?.unwrap();
            assert!(budget.totals_consistent(), "torn read: {:?}", budget);
            tokio::task::yield_now().await;
        }
        Ok::<_, anyhow::Error>(())
    };
    let (written, read) = tokio::join!(writes, reads);
    written?;
    read?;

    Ok(())
}

#[tokio::test]
async fn test_amounts_above_cap_are_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let ada = TestUser::create(&service, "ada").await?.user;
    let huge = i64::MAX / 100 * 100;

    let result = service
        .add_budget_item(ada.id, march_2024("Food", TransactionType::Expense, huge))
        .await;
    assert!(matches!(result, Err(AppError::InvalidAmount(_))));

    let result = service
        .create_transaction(
            ada.id,
            NewTransaction {
                kind: TransactionType::Expense,
                amount_cents: MAX_AMOUNT_CENTS + 1,
                description: String::new(),
                category: "Food".to_string(),
                date: parse_date("2024-03-05"),
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::InvalidAmount(_))));

    // The largest accepted amounts still add up exactly
    expense(&service, &ada, "Food", MAX_AMOUNT_CENTS, "2024-03-05").await?;
    expense(&service, &ada, "Food", MAX_AMOUNT_CENTS, "2024-03-06").await?;
    service
        .add_budget_item(ada.id, march_2024("Food", TransactionType::Expense, MAX_AMOUNT_CENTS))
        .await?;
    let budget = service
        .add_budget_item(ada.id, march_2024("Rent", TransactionType::Expense, MAX_AMOUNT_CENTS))
        .await?;

    assert_eq!(budget.actual_expenses, 2 * MAX_AMOUNT_CENTS);
    assert_eq!(budget.items[0].spent_cents, 2 * MAX_AMOUNT_CENTS);
    assert_eq!(budget.total_expense_budget, 2 * MAX_AMOUNT_CENTS);

    Ok(())
}

#[tokio::test]
async fn test_years_outside_four_digits_are_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let ada = TestUser::create(&service, "ada").await?.user;

    for year in [-5, 0, 10000] {
        let result = service
            .add_budget_item(ada.id, item("Food", TransactionType::Expense, 100, 0, year))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))), "year {}", year);
    }
    assert!(service.list_budgets(ada.id, None, None).await?.is_empty());

    Ok(())
}
