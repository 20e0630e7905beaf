use std::net::SocketAddr;

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Duration, Utc};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::api;
use crate::application::{JarvisService, NewBudgetItem, NewTransaction, TransactionFilter};
use crate::config::{
    DEFAULT_BIND, DEFAULT_DATABASE, DEFAULT_SESSION_TTL_HOURS, LogFormat, ServerConfig,
};
use crate::domain::{BudgetPeriod, TransactionType, format_cents, parse_cents};

/// Jarvis - personal productivity backend
#[derive(Parser)]
#[command(name = "jarvis")]
#[command(about = "Tasks, budgets, meals, fitness and calendar behind one local API")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, global = true, env = "JARVIS_DATABASE", default_value = DEFAULT_DATABASE)]
    pub database: String,

    /// Log output format
    #[arg(long, global = true, env = "JARVIS_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Run the HTTP API
    Serve {
        /// Address to listen on
        #[arg(long, env = "JARVIS_BIND", default_value = DEFAULT_BIND)]
        bind: SocketAddr,

        /// Reject cross-origin browser requests
        #[arg(long)]
        no_cors: bool,
    },

    /// User management commands
    #[command(subcommand)]
    User(UserCommands),

    /// Issue and revoke API sessions
    #[command(subcommand)]
    Session(SessionCommands),

    /// Monthly budget commands
    #[command(subcommand)]
    Budget(BudgetCommands),

    /// Income and expense commands
    #[command(subcommand)]
    Transaction(TransactionCommands),
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Create a new user
    Add {
        /// Username (must be unique)
        username: String,
    },

    /// List all users
    List,
}

#[derive(Subcommand)]
pub enum SessionCommands {
    /// Issue a session token for a user
    Create {
        /// Username
        username: String,

        /// Session lifetime in hours
        #[arg(long, env = "JARVIS_SESSION_TTL_HOURS", default_value_t = DEFAULT_SESSION_TTL_HOURS)]
        ttl_hours: i64,
    },

    /// Revoke a session token
    Revoke {
        /// Session token
        token: String,
    },
}

#[derive(Subcommand)]
pub enum BudgetCommands {
    /// Show budgets with planned and actual amounts
    List {
        /// Owner username
        #[arg(short, long)]
        user: String,

        /// Month (1-12)
        #[arg(short, long)]
        month: Option<u32>,

        /// Year
        #[arg(short, long)]
        year: Option<i32>,
    },

    /// Plan an amount for a category, replacing any existing plan
    Set {
        /// Owner username
        #[arg(short, long)]
        user: String,

        /// Category to plan for
        category: String,

        /// Planned amount (e.g., "400" or "400.00")
        amount: String,

        /// Type: income or expense
        #[arg(short = 't', long = "type", default_value = "expense")]
        kind: String,

        /// Month (1-12, defaults to the current month)
        #[arg(short, long)]
        month: Option<u32>,

        /// Year (defaults to the current year)
        #[arg(long)]
        year: Option<i32>,
    },

    /// Remove a budget item
    Remove {
        /// Owner username
        #[arg(short, long)]
        user: String,

        /// Budget item ID
        item_id: String,
    },
}

#[derive(Subcommand)]
pub enum TransactionCommands {
    /// Record an income or expense
    Add {
        /// Owner username
        #[arg(short, long)]
        user: String,

        /// Amount (e.g., "50.00" or "50")
        amount: String,

        /// Type: income or expense
        #[arg(short = 't', long = "type", default_value = "expense")]
        kind: String,

        /// Category (e.g., "Food", "Salary")
        #[arg(short, long)]
        category: String,

        /// Description
        #[arg(long)]
        description: Option<String>,

        /// Date (YYYY-MM-DD or RFC 3339, defaults to now)
        #[arg(long)]
        date: Option<String>,
    },

    /// List transactions, newest first
    List {
        /// Owner username
        #[arg(short, long)]
        user: String,

        /// Filter by type: income or expense
        #[arg(short = 't', long = "type")]
        kind: Option<String>,

        /// Filter by category
        #[arg(short, long)]
        category: Option<String>,

        /// Filter from date (YYYY-MM-DD)
        #[arg(long)]
        from_date: Option<String>,

        /// Filter to date (YYYY-MM-DD)
        #[arg(long)]
        to_date: Option<String>,

        /// Maximum number of transactions to show
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                JarvisService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Serve { bind, no_cors } => {
                let service = JarvisService::init(&self.database).await?;
                let config = ServerConfig {
                    bind,
                    enable_cors: !no_cors,
                };
                api::serve(service, &config).await?;
            }

            Commands::User(user_cmd) => {
                let service = JarvisService::connect(&self.database).await?;
                run_user_command(&service, user_cmd).await?;
            }

            Commands::Session(session_cmd) => {
                let service = JarvisService::connect(&self.database).await?;
                run_session_command(&service, session_cmd).await?;
            }

            Commands::Budget(budget_cmd) => {
                let service = JarvisService::connect(&self.database).await?;
                run_budget_command(&service, budget_cmd).await?;
            }

            Commands::Transaction(tx_cmd) => {
                let service = JarvisService::connect(&self.database).await?;
                run_transaction_command(&service, tx_cmd).await?;
            }
        }

        Ok(())
    }
}

async fn run_user_command(service: &JarvisService, cmd: UserCommands) -> Result<()> {
    match cmd {
        UserCommands::Add { username } => {
            let user = service.create_user(&username).await?;
            println!("Created user: {} ({})", user.username, user.id);
        }

        UserCommands::List => {
            let users = service.list_users().await?;
            if users.is_empty() {
                println!("No users found.");
            } else {
                println!("{:<24} {:<38} {:<12}", "USERNAME", "ID", "CREATED");
                println!("{}", "-".repeat(76));
                for user in users {
                    println!(
                        "{:<24} {:<38} {:<12}",
                        truncate(&user.username, 24),
                        user.id,
                        user.created_at.format("%Y-%m-%d")
                    );
                }
            }
        }
    }
    Ok(())
}

async fn run_session_command(service: &JarvisService, cmd: SessionCommands) -> Result<()> {
    match cmd {
        SessionCommands::Create {
            username,
            ttl_hours,
        } => {
            let session = service
                .create_session(&username, Duration::hours(ttl_hours))
                .await?;
            // Token alone on stdout so it can be captured by scripts
            println!("{}", session.token);
            eprintln!(
                "Session for {} expires {}",
                username,
                session.expires_at.format("%Y-%m-%d %H:%M UTC")
            );
        }

        SessionCommands::Revoke { token } => {
            if service.revoke_session(&token).await? {
                println!("Session revoked.");
            } else {
                println!("No such session.");
            }
        }
    }
    Ok(())
}

async fn run_budget_command(service: &JarvisService, cmd: BudgetCommands) -> Result<()> {
    match cmd {
        BudgetCommands::List { user, month, year } => {
            let owner = service.get_user(&user).await?;
            let month0 = month.map(month_index).transpose()?;
            let budgets = service.list_budgets(owner.id, month0, year).await?;

            if budgets.is_empty() {
                println!("No budgets found.");
            }
            for budget in budgets {
                println!("Budget {}", budget.period());
                println!(
                    "  Income:   planned {:>12}  actual {:>12}",
                    format_cents(budget.total_income_budget),
                    format_cents(budget.actual_income)
                );
                println!(
                    "  Expenses: planned {:>12}  actual {:>12}",
                    format_cents(budget.total_expense_budget),
                    format_cents(budget.actual_expenses)
                );
                if !budget.items.is_empty() {
                    println!();
                    println!(
                        "  {:<38} {:<20} {:<8} {:>12} {:>12} {:>12}",
                        "ITEM", "CATEGORY", "TYPE", "PLANNED", "SPENT", "REMAINING"
                    );
                    println!("  {}", "-".repeat(107));
                    for item in &budget.items {
                        println!(
                            "  {:<38} {:<20} {:<8} {:>12} {:>12} {:>12}",
                            item.id,
                            truncate(&item.category, 20),
                            item.kind,
                            format_cents(item.budget_cents),
                            format_cents(item.spent_cents),
                            format_cents(item.remaining_cents())
                        );
                    }
                }
                println!();
            }
        }

        BudgetCommands::Set {
            user,
            category,
            amount,
            kind,
            month,
            year,
        } => {
            let owner = service.get_user(&user).await?;
            let amount_cents =
                parse_cents(&amount).context("Invalid amount format. Use '400.00' or '400'")?;
            let kind = parse_kind(&kind)?;

            let now = Utc::now();
            let month0 = month.map(month_index).transpose()?.unwrap_or(now.month0());
            let year = year.unwrap_or(now.year());
            let period = BudgetPeriod::new(month0, year)
                .ok_or_else(|| anyhow::anyhow!("Invalid month {}/{}", month0 + 1, year))?;

            let existing = service
                .get_budget(owner.id, period)
                .await?
                .and_then(|b| {
                    b.items
                        .iter()
                        .find(|i| i.matches(&category, kind))
                        .map(|i| i.id)
                });

            let budget = match existing {
                Some(item_id) => {
                    service
                        .update_budget_item(owner.id, item_id, amount_cents)
                        .await?
                }
                None => {
                    service
                        .add_budget_item(
                            owner.id,
                            NewBudgetItem {
                                category: category.clone(),
                                kind,
                                budget_cents: amount_cents,
                                month: month0,
                                year,
                            },
                        )
                        .await?
                }
            };

            println!(
                "Planned {} {} for {} in {} (total {} planned: {})",
                format_cents(amount_cents),
                kind,
                category,
                budget.period(),
                kind,
                format_cents(match kind {
                    TransactionType::Income => budget.total_income_budget,
                    TransactionType::Expense => budget.total_expense_budget,
                })
            );
        }

        BudgetCommands::Remove { user, item_id } => {
            let owner = service.get_user(&user).await?;
            let item_id =
                Uuid::parse_str(&item_id).context("Invalid item ID format (expected UUID)")?;
            let budget = service.delete_budget_item(owner.id, item_id).await?;
            println!("Removed budget item from {}", budget.period());
        }
    }

    Ok(())
}

async fn run_transaction_command(service: &JarvisService, cmd: TransactionCommands) -> Result<()> {
    match cmd {
        TransactionCommands::Add {
            user,
            amount,
            kind,
            category,
            description,
            date,
        } => {
            let owner = service.get_user(&user).await?;
            let amount_cents =
                parse_cents(&amount).context("Invalid amount format. Use '50.00' or '50'")?;
            let date = match date {
                Some(date_str) => parse_date(&date_str)?,
                None => Utc::now(),
            };

            let tx = service
                .create_transaction(
                    owner.id,
                    NewTransaction {
                        kind: parse_kind(&kind)?,
                        amount_cents,
                        description: description.unwrap_or_default(),
                        category,
                        date,
                    },
                )
                .await?;

            println!(
                "Recorded {}: {} {} on {} ({})",
                tx.kind,
                format_cents(tx.amount_cents),
                tx.category,
                tx.date.format("%Y-%m-%d"),
                tx.id
            );
        }

        TransactionCommands::List {
            user,
            kind,
            category,
            from_date,
            to_date,
            limit,
        } => {
            let owner = service.get_user(&user).await?;
            let filter = TransactionFilter {
                kind: kind.as_deref().map(parse_kind).transpose()?,
                category,
                from_date: from_date
                    .map(|s| parse_date(&s))
                    .transpose()
                    .context("Invalid from-date")?,
                to_date: to_date
                    .map(|s| parse_date(&s))
                    .transpose()
                    .context("Invalid to-date")?,
                limit,
            };

            let transactions = service.list_transactions(owner.id, filter).await?;
            if transactions.is_empty() {
                println!("No transactions found.");
            } else {
                println!(
                    "{:<12} {:<8} {:>12} {:<20} DESCRIPTION",
                    "DATE", "TYPE", "AMOUNT", "CATEGORY"
                );
                println!("{}", "-".repeat(75));
                for tx in transactions {
                    println!(
                        "{:<12} {:<8} {:>12} {:<20} {}",
                        tx.date.format("%Y-%m-%d"),
                        tx.kind,
                        format_cents(tx.amount_cents),
                        truncate(&tx.category, 20),
                        truncate(&tx.description, 30)
                    );
                }
            }
        }
    }
    Ok(())
}

fn parse_kind(kind: &str) -> Result<TransactionType> {
    TransactionType::from_str(kind).ok_or_else(|| {
        anyhow::anyhow!("Invalid type '{}'. Valid types: income, expense", kind)
    })
}

/// Calendar month (1-12) to the zero-based index budgets use.
fn month_index(month: u32) -> Result<u32> {
    if !(1..=12).contains(&month) {
        anyhow::bail!("Month must be between 1 and 12, got {}", month);
    }
    Ok(month - 1)
}

fn parse_date(date_str: &str) -> Result<DateTime<Utc>> {
    crate::domain::parse_date(date_str).with_context(|| {
        format!("Invalid date format '{}'. Use YYYY-MM-DD", date_str)
    })
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
