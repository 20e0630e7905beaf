// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use jarvis::application::{JarvisService, NewTransaction};
use jarvis::domain::{Cents, Transaction, TransactionType, User};
use jarvis::storage::Repository;
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(JarvisService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let service = JarvisService::init(db_path(&temp_dir).as_str()).await?;
    Ok((service, temp_dir))
}

/// A second, independent connection to the same database, standing in for
/// another server process.
pub async fn second_repository(temp_dir: &TempDir) -> Result<Repository> {
    Repository::connect(&format!("sqlite:{}", db_path(temp_dir))).await
}

/// A second service on the same database, as a second server process would
/// run it.
pub async fn second_service(temp_dir: &TempDir) -> Result<JarvisService> {
    Ok(JarvisService::connect(db_path(temp_dir).as_str()).await?)
}

fn db_path(temp_dir: &TempDir) -> String {
    temp_dir.path().join("test.db").to_string_lossy().into_owned()
}

/// Helper to parse `YYYY-MM-DD` or RFC 3339 into DateTime<Utc>
pub fn parse_date(date_str: &str) -> DateTime<Utc> {
    jarvis::domain::parse_date(date_str).unwrap()
}

/// Test fixture: a user with a long-lived session
pub struct TestUser {
    pub user: User,
    pub token: String,
}

impl TestUser {
    pub async fn create(service: &JarvisService, username: &str) -> Result<Self> {
        let user = service.create_user(username).await?;
        let session = service.create_session(username, Duration::hours(1)).await?;
        Ok(Self {
            user,
            token: session.token,
        })
    }
}

/// Record an expense with no description
pub async fn expense(
    service: &JarvisService,
    owner: &User,
    category: &str,
    amount_cents: Cents,
    date: &str,
) -> Result<Transaction> {
    record(service, owner, TransactionType::Expense, category, amount_cents, date).await
}

pub async fn income(
    service: &JarvisService,
    owner: &User,
    category: &str,
    amount_cents: Cents,
    date: &str,
) -> Result<Transaction> {
    record(service, owner, TransactionType::Income, category, amount_cents, date).await
}

async fn record(
    service: &JarvisService,
    owner: &User,
    kind: TransactionType,
    category: &str,
    amount_cents: Cents,
    date: &str,
) -> Result<Transaction> {
    Ok(service
        .create_transaction(
            owner.id,
            NewTransaction {
                kind,
                amount_cents,
                description: String::new(),
                category: category.to_string(),
                date: parse_date(date),
            },
        )
        .await?)
}
