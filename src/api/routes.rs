use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use super::handlers;
use super::state::AppState;

/// Everything mounted under `/api`. All of it requires a session.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/budget",
            get(handlers::budget::list_budgets).post(handlers::budget::create_budget_item),
        )
        .route(
            "/budget/:item_id",
            put(handlers::budget::update_budget_item).delete(handlers::budget::delete_budget_item),
        )
        .route(
            "/transactions",
            get(handlers::transactions::list_transactions)
                .post(handlers::transactions::create_transaction),
        )
        .route(
            "/transactions/:id",
            get(handlers::transactions::get_transaction)
                .delete(handlers::transactions::delete_transaction),
        )
        .route(
            "/tasks",
            get(handlers::planner::list_tasks).post(handlers::planner::create_task),
        )
        .route(
            "/tasks/:id",
            put(handlers::planner::update_task).delete(handlers::planner::delete_task),
        )
        .route(
            "/events",
            get(handlers::planner::list_events).post(handlers::planner::create_event),
        )
        .route(
            "/events/:id",
            put(handlers::planner::update_event).delete(handlers::planner::delete_event),
        )
        .route(
            "/meals",
            get(handlers::wellness::list_meals).post(handlers::wellness::create_meal),
        )
        .route("/meals/:id", delete(handlers::wellness::delete_meal))
        .route(
            "/fitness",
            get(handlers::wellness::list_activities).post(handlers::wellness::create_activity),
        )
        .route("/fitness/:id", delete(handlers::wellness::delete_activity))
        .route("/dashboard", get(handlers::dashboard::get_dashboard))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/me", get(handlers::auth::me))
}

