mod budgets;
mod records;
mod repository;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

pub use repository::*;

/// SQL migration for users, sessions and transactions
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");

/// SQL migration for budgets and their items
pub const MIGRATION_002_BUDGETS: &str = include_str!("migrations/002_budgets.sql");

/// SQL migration for tasks, events, meals and activities
pub const MIGRATION_003_RECORDS: &str = include_str!("migrations/003_records.sql");

/// Timestamps are stored as fixed-width RFC 3339 so that string comparison in
/// SQL orders them chronologically.
pub(crate) fn encode_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_timestamp(value: &str, column: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .with_context(|| format!("Invalid {} timestamp", column))?
        .with_timezone(&Utc))
}

pub(crate) fn decode_id(value: &str, column: &str) -> Result<Uuid> {
    Uuid::parse_str(value).with_context(|| format!("Invalid {}", column))
}
