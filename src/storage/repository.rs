use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use sqlx::{Row, SqlitePool};

use crate::domain::{
    Actuals, Cents, Session, Transaction, TransactionId, TransactionType, User, UserId,
};

use super::{
    MIGRATION_001_INITIAL, MIGRATION_002_BUDGETS, MIGRATION_003_RECORDS, decode_id,
    decode_timestamp, encode_timestamp,
};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Repository for persisting and querying every record the service owns.
/// Operations are grouped per record type across the `storage` modules.
#[derive(Clone)]
pub struct Repository {
    pub(super) pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    ///
    /// WAL lets budget reads proceed while another connection writes, and
    /// writers queue on the busy timeout instead of failing outright.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .context("Invalid database URL")?
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT)
            .foreign_keys(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations. Every statement is idempotent.
    pub async fn migrate(&self) -> Result<()> {
        for (name, sql) in [
            ("001", MIGRATION_001_INITIAL),
            ("002", MIGRATION_002_BUDGETS),
            ("003", MIGRATION_003_RECORDS),
        ] {
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to run migration {}", name))?;
        }
        Ok(())
    }

    /// Initialize a database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Cheap round trip used by the health endpoint.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database ping failed")?;
        Ok(())
    }

    // ========================
    // User operations
    // ========================

    pub async fn save_user(&self, user: &User) -> Result<()> {
        sqlx::query("INSERT INTO users (id, username, created_at) VALUES (?, ?, ?)")
            .bind(user.id.to_string())
            .bind(&user.username)
            .bind(encode_timestamp(user.created_at))
            .execute(&self.pool)
            .await
            .context("Failed to save user")?;
        Ok(())
    }

    pub async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, username, created_at FROM users WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch user")?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    pub async fn get_user_by_name(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, username, created_at FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch user by name")?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        let rows = sqlx::query("SELECT id, username, created_at FROM users ORDER BY username")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list users")?;

        rows.iter().map(Self::row_to_user).collect()
    }

    fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
        let id_str: String = row.get("id");
        let created_at_str: String = row.get("created_at");

        Ok(User {
            id: decode_id(&id_str, "user ID")?,
            username: row.get("username"),
            created_at: decode_timestamp(&created_at_str, "created_at")?,
        })
    }

    // ========================
    // Session operations
    // ========================

    pub async fn save_session(&self, session: &Session) -> Result<()> {
        sqlx::query(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&session.token)
        .bind(session.user_id.to_string())
        .bind(encode_timestamp(session.created_at))
        .bind(encode_timestamp(session.expires_at))
        .execute(&self.pool)
        .await
        .context("Failed to save session")?;
        Ok(())
    }

    pub async fn get_session(&self, token: &str) -> Result<Option<Session>> {
        let row = sqlx::query(
            "SELECT token, user_id, created_at, expires_at FROM sessions WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch session")?;

        match row {
            Some(row) => {
                let user_id_str: String = row.get("user_id");
                let created_at_str: String = row.get("created_at");
                let expires_at_str: String = row.get("expires_at");
                Ok(Some(Session {
                    token: row.get("token"),
                    user_id: decode_id(&user_id_str, "session user ID")?,
                    created_at: decode_timestamp(&created_at_str, "created_at")?,
                    expires_at: decode_timestamp(&expires_at_str, "expires_at")?,
                }))
            }
            None => Ok(None),
        }
    }

    /// Returns false when no session had that token.
    pub async fn delete_session(&self, token: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await
            .context("Failed to delete session")?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(encode_timestamp(now))
            .execute(&self.pool)
            .await
            .context("Failed to purge expired sessions")?;
        Ok(result.rows_affected())
    }

    // ========================
    // Transaction operations
    // ========================

    pub async fn save_transaction(&self, tx: &Transaction) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO transactions (id, owner_id, kind, amount_cents, description, category, date, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(tx.id.to_string())
        .bind(tx.owner.to_string())
        .bind(tx.kind.as_str())
        .bind(tx.amount_cents)
        .bind(&tx.description)
        .bind(&tx.category)
        .bind(encode_timestamp(tx.date))
        .bind(encode_timestamp(tx.created_at))
        .execute(&self.pool)
        .await
        .context("Failed to save transaction")?;
        Ok(())
    }

    /// Get a transaction, scoped to its owner.
    pub async fn get_transaction(
        &self,
        owner: UserId,
        id: TransactionId,
    ) -> Result<Option<Transaction>> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, kind, amount_cents, description, category, date, created_at
            FROM transactions
            WHERE id = ? AND owner_id = ?
            "#,
        )
        .bind(id.to_string())
        .bind(owner.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch transaction")?;

        row.as_ref().map(Self::row_to_transaction).transpose()
    }

    /// List an owner's transactions with optional filters, newest first.
    /// Both date bounds are inclusive.
    pub async fn list_transactions(
        &self,
        owner: UserId,
        kind: Option<TransactionType>,
        category: Option<&str>,
        from_date: Option<DateTime<Utc>>,
        to_date: Option<DateTime<Utc>>,
        limit: Option<usize>,
    ) -> Result<Vec<Transaction>> {
        let mut query = String::from(
            "SELECT id, owner_id, kind, amount_cents, description, category, date, created_at FROM transactions WHERE owner_id = ?",
        );

        let from_date_str = from_date.map(encode_timestamp);
        let to_date_str = to_date.map(encode_timestamp);

        if kind.is_some() {
            query.push_str(" AND kind = ?");
        }
        if category.is_some() {
            query.push_str(" AND category = ?");
        }
        if from_date.is_some() {
            query.push_str(" AND date >= ?");
        }
        if to_date.is_some() {
            query.push_str(" AND date <= ?");
        }

        query.push_str(" ORDER BY date DESC, created_at DESC");

        if let Some(lim) = limit {
            query.push_str(&format!(" LIMIT {}", lim));
        }

        let mut sql_query = sqlx::query(&query).bind(owner.to_string());

        if let Some(kind) = kind {
            sql_query = sql_query.bind(kind.as_str());
        }
        if let Some(cat) = category {
            sql_query = sql_query.bind(cat);
        }
        if let Some(ref fd_str) = from_date_str {
            sql_query = sql_query.bind(fd_str);
        }
        if let Some(ref td_str) = to_date_str {
            sql_query = sql_query.bind(td_str);
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list filtered transactions")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    /// All of an owner's transactions dated in `[start, end)`.
    pub async fn list_transactions_in_window(
        &self,
        owner: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, kind, amount_cents, description, category, date, created_at
            FROM transactions
            WHERE owner_id = ? AND date >= ? AND date < ?
            ORDER BY date
            "#,
        )
        .bind(owner.to_string())
        .bind(encode_timestamp(start))
        .bind(encode_timestamp(end))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list transactions in window")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    /// Income and expense totals over `[start, end)` using SQL aggregation.
    pub async fn sum_transactions(
        &self,
        owner: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Actuals> {
        let row = sqlx::query(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN kind = 'income' THEN amount_cents ELSE 0 END), 0) as income,
                COALESCE(SUM(CASE WHEN kind = 'expense' THEN amount_cents ELSE 0 END), 0) as expenses
            FROM transactions
            WHERE owner_id = ? AND date >= ? AND date < ?
            "#,
        )
        .bind(owner.to_string())
        .bind(encode_timestamp(start))
        .bind(encode_timestamp(end))
        .fetch_one(&self.pool)
        .await
        .context("Failed to sum transactions")?;

        let income: Cents = row.get("income");
        let expenses: Cents = row.get("expenses");
        Ok(Actuals { income, expenses })
    }

    /// Returns false when the owner had no such transaction.
    pub async fn delete_transaction(&self, owner: UserId, id: TransactionId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = ? AND owner_id = ?")
            .bind(id.to_string())
            .bind(owner.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete transaction")?;
        Ok(result.rows_affected() > 0)
    }

    fn row_to_transaction(row: &sqlx::sqlite::SqliteRow) -> Result<Transaction> {
        let id_str: String = row.get("id");
        let owner_str: String = row.get("owner_id");
        let kind_str: String = row.get("kind");
        let date_str: String = row.get("date");
        let created_at_str: String = row.get("created_at");

        Ok(Transaction {
            id: decode_id(&id_str, "transaction ID")?,
            owner: decode_id(&owner_str, "owner ID")?,
            kind: TransactionType::from_str(&kind_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid transaction type: {}", kind_str))?,
            amount_cents: row.get("amount_cents"),
            description: row.get("description"),
            category: row.get("category"),
            date: decode_timestamp(&date_str, "date")?,
            created_at: decode_timestamp(&created_at_str, "created_at")?,
        })
    }
}
