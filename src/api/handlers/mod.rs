pub mod auth;
pub mod budget;
pub mod dashboard;
pub mod health;
pub mod planner;
pub mod transactions;
pub mod wellness;
