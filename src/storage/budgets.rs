use anyhow::{Context, Result};
use chrono::{SubsecRound, Utc};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::{Row, Sqlite};

use crate::domain::{Budget, BudgetId, BudgetItem, BudgetItemId, BudgetPeriod, TransactionType, UserId};

use super::{Repository, decode_id, decode_timestamp, encode_timestamp};

const BUDGET_COLUMNS: &str = "b.id, b.owner_id, b.month, b.year, b.total_income_budget, b.total_expense_budget, b.actual_income, b.actual_expenses, b.version, b.updated_at";

impl Repository {
    // ========================
    // Budget operations
    // ========================

    /// Insert an empty budget unless one already exists for the same owner and
    /// month. Returns whether this call created it.
    pub async fn insert_budget_if_absent(&self, budget: &Budget) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO budgets (id, owner_id, month, year, total_income_budget, total_expense_budget, actual_income, actual_expenses, version, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (owner_id, month, year) DO NOTHING
            "#,
        )
        .bind(budget.id.to_string())
        .bind(budget.owner.to_string())
        .bind(budget.month as i64)
        .bind(budget.year as i64)
        .bind(budget.total_income_budget)
        .bind(budget.total_expense_budget)
        .bind(budget.actual_income)
        .bind(budget.actual_expenses)
        .bind(budget.version)
        .bind(encode_timestamp(budget.updated_at))
        .execute(&self.pool)
        .await
        .context("Failed to insert budget")?;

        Ok(result.rows_affected() > 0)
    }

    /// Write a budget and its items if nobody else wrote it since it was read.
    ///
    /// The update only applies while the stored version equals
    /// `budget.version`. On success the version is bumped both in the database
    /// and on `budget`; on a version mismatch nothing is written and `false` is
    /// returned.
    pub async fn update_budget(&self, budget: &mut Budget) -> Result<bool> {
        // Stored precision, so the caller's copy equals a fresh read
        let updated_at = Utc::now().trunc_subsecs(6);
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin budget write")?;

        let result = sqlx::query(
            r#"
            UPDATE budgets
            SET total_income_budget = ?, total_expense_budget = ?, actual_income = ?, actual_expenses = ?,
                version = version + 1, updated_at = ?
            WHERE id = ? AND version = ?
            "#,
        )
        .bind(budget.total_income_budget)
        .bind(budget.total_expense_budget)
        .bind(budget.actual_income)
        .bind(budget.actual_expenses)
        .bind(encode_timestamp(updated_at))
        .bind(budget.id.to_string())
        .bind(budget.version)
        .execute(&mut *tx)
        .await
        .context("Failed to update budget")?;

        if result.rows_affected() == 0 {
            tx.rollback()
                .await
                .context("Failed to roll back stale budget write")?;
            return Ok(false);
        }

        sqlx::query("DELETE FROM budget_items WHERE budget_id = ?")
            .bind(budget.id.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to clear budget items")?;

        for (position, item) in budget.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO budget_items (id, budget_id, position, category, kind, budget_cents, spent_cents)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(item.id.to_string())
            .bind(budget.id.to_string())
            .bind(position as i64)
            .bind(&item.category)
            .bind(item.kind.as_str())
            .bind(item.budget_cents)
            .bind(item.spent_cents)
            .execute(&mut *tx)
            .await
            .context("Failed to save budget item")?;
        }

        tx.commit().await.context("Failed to commit budget write")?;

        budget.version += 1;
        budget.updated_at = updated_at;
        Ok(true)
    }

    pub async fn get_budget(&self, id: BudgetId) -> Result<Option<Budget>> {
        let mut tx = self.begin_budget_read().await?;
        let row = sqlx::query(&format!("SELECT {} FROM budgets b WHERE b.id = ?", BUDGET_COLUMNS))
            .bind(id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .context("Failed to fetch budget")?;

        let budget = match row {
            Some(row) => Some(Self::load_budget(&mut *tx, &row).await?),
            None => None,
        };
        tx.commit().await.context("Failed to finish budget read")?;
        Ok(budget)
    }

    pub async fn get_budget_for_period(
        &self,
        owner: UserId,
        period: BudgetPeriod,
    ) -> Result<Option<Budget>> {
        let mut tx = self.begin_budget_read().await?;
        let row = sqlx::query(&format!(
            "SELECT {} FROM budgets b WHERE b.owner_id = ? AND b.month = ? AND b.year = ?",
            BUDGET_COLUMNS
        ))
        .bind(owner.to_string())
        .bind(period.month as i64)
        .bind(period.year as i64)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to fetch budget for period")?;

        let budget = match row {
            Some(row) => Some(Self::load_budget(&mut *tx, &row).await?),
            None => None,
        };
        tx.commit().await.context("Failed to finish budget read")?;
        Ok(budget)
    }

    /// List an owner's budgets, optionally narrowed to a month and/or year,
    /// oldest period first.
    pub async fn list_budgets(
        &self,
        owner: UserId,
        month: Option<u32>,
        year: Option<i32>,
    ) -> Result<Vec<Budget>> {
        let mut query = format!("SELECT {} FROM budgets b WHERE b.owner_id = ?", BUDGET_COLUMNS);
        if month.is_some() {
            query.push_str(" AND b.month = ?");
        }
        if year.is_some() {
            query.push_str(" AND b.year = ?");
        }
        query.push_str(" ORDER BY b.year, b.month");

        let mut sql_query = sqlx::query(&query).bind(owner.to_string());
        if let Some(month) = month {
            sql_query = sql_query.bind(month as i64);
        }
        if let Some(year) = year {
            sql_query = sql_query.bind(year as i64);
        }

        let mut tx = self.begin_budget_read().await?;
        let rows = sql_query
            .fetch_all(&mut *tx)
            .await
            .context("Failed to list budgets")?;

        let mut budgets = Vec::with_capacity(rows.len());
        for row in &rows {
            budgets.push(Self::load_budget(&mut *tx, row).await?);
        }
        tx.commit().await.context("Failed to finish budget read")?;
        Ok(budgets)
    }

    /// Find whichever of the owner's budgets holds the item, in any month.
    pub async fn find_budget_with_item(
        &self,
        owner: UserId,
        item_id: BudgetItemId,
    ) -> Result<Option<Budget>> {
        let mut tx = self.begin_budget_read().await?;
        let row = sqlx::query(&format!(
            "SELECT {} FROM budgets b JOIN budget_items i ON i.budget_id = b.id WHERE i.id = ? AND b.owner_id = ?",
            BUDGET_COLUMNS
        ))
        .bind(item_id.to_string())
        .bind(owner.to_string())
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to find budget by item")?;

        let budget = match row {
            Some(row) => Some(Self::load_budget(&mut *tx, &row).await?),
            None => None,
        };
        tx.commit().await.context("Failed to finish budget read")?;
        Ok(budget)
    }

    /// A budget row and its items are always read inside one transaction, so
    /// a concurrent [`update_budget`](Self::update_budget) is seen either
    /// entirely or not at all.
    async fn begin_budget_read(&self) -> Result<sqlx::Transaction<'_, Sqlite>> {
        self.pool
            .begin()
            .await
            .context("Failed to begin budget read")
    }

    async fn load_budget(conn: &mut SqliteConnection, row: &SqliteRow) -> Result<Budget> {
        let mut budget = Self::row_to_budget(row)?;
        budget.items = Self::list_budget_items(conn, budget.id).await?;
        Ok(budget)
    }

    async fn list_budget_items(
        conn: &mut SqliteConnection,
        budget_id: BudgetId,
    ) -> Result<Vec<BudgetItem>> {
        let rows = sqlx::query(
            r#"
            SELECT id, category, kind, budget_cents, spent_cents
            FROM budget_items
            WHERE budget_id = ?
            ORDER BY position
            "#,
        )
        .bind(budget_id.to_string())
        .fetch_all(&mut *conn)
        .await
        .context("Failed to list budget items")?;

        rows.iter()
            .map(|row| {
                let id_str: String = row.get("id");
                let kind_str: String = row.get("kind");
                Ok(BudgetItem {
                    id: decode_id(&id_str, "budget item ID")?,
                    category: row.get("category"),
                    kind: TransactionType::from_str(&kind_str)
                        .ok_or_else(|| anyhow::anyhow!("Invalid budget item type: {}", kind_str))?,
                    budget_cents: row.get("budget_cents"),
                    spent_cents: row.get("spent_cents"),
                })
            })
            .collect()
    }

    fn row_to_budget(row: &SqliteRow) -> Result<Budget> {
        let id_str: String = row.get("id");
        let owner_str: String = row.get("owner_id");
        let updated_at_str: String = row.get("updated_at");
        let month: i64 = row.get("month");
        let year: i64 = row.get("year");

        Ok(Budget {
            id: decode_id(&id_str, "budget ID")?,
            owner: decode_id(&owner_str, "owner ID")?,
            month: u32::try_from(month).context("Invalid budget month")?,
            year: i32::try_from(year).context("Invalid budget year")?,
            total_income_budget: row.get("total_income_budget"),
            total_expense_budget: row.get("total_expense_budget"),
            actual_income: row.get("actual_income"),
            actual_expenses: row.get("actual_expenses"),
            items: Vec::new(),
            version: row.get("version"),
            updated_at: decode_timestamp(&updated_at_str, "updated_at")?,
        })
    }
}
