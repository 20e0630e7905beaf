use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::domain::{
    Cents, Session, Transaction, TransactionId, TransactionType, User, UserId, check_amount,
    is_valid_username,
};
use crate::storage::Repository;

use super::AppError;

/// Application service providing every use case of the app.
/// This is the single entry point for the HTTP API and the CLI alike.
#[derive(Clone)]
pub struct JarvisService {
    pub(super) repo: Repository,
}

/// Filter for querying transactions
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub kind: Option<TransactionType>,
    pub category: Option<String>,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

/// Input for recording a transaction
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub kind: TransactionType,
    pub amount_cents: Cents,
    pub description: String,
    pub category: String,
    pub date: DateTime<Utc>,
}

impl JarvisService {
    /// Create a new service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Open (creating if needed) the database at the given path and bring its
    /// schema up to date.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        info!(database = %database_path, "Database ready");
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        Ok(self.repo.ping().await?)
    }

    // ========================
    // User and session operations
    // ========================

    pub async fn create_user(&self, username: &str) -> Result<User, AppError> {
        let username = username.trim();
        if !is_valid_username(username) {
            return Err(AppError::InvalidUsername(username.to_string()));
        }
        if self.repo.get_user_by_name(username).await?.is_some() {
            return Err(AppError::UserAlreadyExists(username.to_string()));
        }

        let user = User::new(username);
        self.repo.save_user(&user).await?;
        info!(user = %user.username, "Created user");
        Ok(user)
    }

    pub async fn get_user(&self, username: &str) -> Result<User, AppError> {
        self.repo
            .get_user_by_name(username)
            .await?
            .ok_or_else(|| AppError::UserNotFound(username.to_string()))
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        Ok(self.repo.list_users().await?)
    }

    /// Issue a new session token for a user.
    pub async fn create_session(&self, username: &str, ttl: Duration) -> Result<Session, AppError> {
        if ttl <= Duration::zero() {
            return Err(AppError::validation("session lifetime must be positive"));
        }
        let user = self.get_user(username).await?;
        let session = Session::new(user.id, ttl);
        self.repo.save_session(&session).await?;
        info!(user = %user.username, expires_at = %session.expires_at, "Issued session");
        Ok(session)
    }

    /// Resolve a session token to its user.
    pub async fn authenticate(&self, token: &str, now: DateTime<Utc>) -> Result<User, AppError> {
        let session = self
            .repo
            .get_session(token)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if session.is_expired(now) {
            debug!("Rejected expired session");
            self.repo.delete_session(token).await?;
            return Err(AppError::Unauthorized);
        }

        self.repo
            .get_user(session.user_id)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Revoke a session. Returns false when the token was unknown.
    pub async fn revoke_session(&self, token: &str) -> Result<bool, AppError> {
        Ok(self.repo.delete_session(token).await?)
    }

    pub async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        Ok(self.repo.delete_expired_sessions(now).await?)
    }

    // ========================
    // Transaction operations
    // ========================

    /// Record a new income or expense.
    pub async fn create_transaction(
        &self,
        owner: UserId,
        input: NewTransaction,
    ) -> Result<Transaction, AppError> {
        if input.amount_cents <= 0 {
            return Err(AppError::InvalidAmount(
                "Amount must be positive".to_string(),
            ));
        }
        check_amount(input.amount_cents).map_err(|e| AppError::InvalidAmount(e.to_string()))?;
        let category = input.category.trim();
        if category.is_empty() {
            return Err(AppError::validation("category is required"));
        }

        let tx = Transaction::new(owner, input.kind, input.amount_cents, category, input.date)
            .with_description(input.description.trim());
        self.repo.save_transaction(&tx).await?;
        debug!(transaction = %tx.id, kind = %tx.kind, category = %tx.category, "Recorded transaction");
        Ok(tx)
    }

    pub async fn get_transaction(
        &self,
        owner: UserId,
        id: TransactionId,
    ) -> Result<Transaction, AppError> {
        self.repo
            .get_transaction(owner, id)
            .await?
            .ok_or_else(|| AppError::TransactionNotFound(id.to_string()))
    }

    /// List transactions with filters.
    pub async fn list_transactions(
        &self,
        owner: UserId,
        filter: TransactionFilter,
    ) -> Result<Vec<Transaction>, AppError> {
        if let (Some(from), Some(to)) = (filter.from_date, filter.to_date) {
            if from > to {
                return Err(AppError::validation("'from' must not be after 'to'"));
            }
        }

        Ok(self
            .repo
            .list_transactions(
                owner,
                filter.kind,
                filter.category.as_deref(),
                filter.from_date,
                filter.to_date,
                filter.limit,
            )
            .await?)
    }

    /// Delete a transaction. Budgets pick the change up on their next read.
    pub async fn delete_transaction(
        &self,
        owner: UserId,
        id: TransactionId,
    ) -> Result<(), AppError> {
        if !self.repo.delete_transaction(owner, id).await? {
            return Err(AppError::TransactionNotFound(id.to_string()));
        }
        debug!(transaction = %id, "Deleted transaction");
        Ok(())
    }
}
