use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, UserId, flexible_date, money};

pub type TransactionId = Uuid;

/// Direction of a money movement. Budget items carry the same type so they
/// can be matched against transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "income" => Some(TransactionType::Income),
            "expense" => Some(TransactionType::Expense),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A dated income or expense record. Transactions are never edited; a wrong
/// entry is deleted and recorded again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub owner: UserId,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Always positive
    #[serde(rename = "amount", with = "money::decimal")]
    pub amount_cents: Cents,
    pub description: String,
    pub category: String,
    /// When the money moved in the real world
    #[serde(with = "flexible_date")]
    pub date: DateTime<Utc>,
    /// When it was recorded here
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        owner: UserId,
        kind: TransactionType,
        amount_cents: Cents,
        category: impl Into<String>,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            kind,
            amount_cents,
            description: String::new(),
            category: category.into(),
            date,
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::Income
    }
}
