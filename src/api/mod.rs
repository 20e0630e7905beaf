//! JSON REST API
//!
//! ```text
//! /health              - liveness and database check (public)
//! /api/
//! ├── /budget          - monthly budgets, reconciled on read
//! ├── /transactions    - income and expenses
//! ├── /tasks           - to-do items
//! ├── /events          - calendar
//! ├── /meals           - food log
//! ├── /fitness         - workouts
//! ├── /dashboard       - summary of all of the above
//! ├── /me              - the signed-in user
//! └── /auth/logout
//! ```
//!
//! Requests authenticate with the `jarvis_session` cookie or an
//! `Authorization: Bearer` header carrying a session token.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod routes;
pub mod state;

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use chrono::Utc;
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::application::JarvisService;
use crate::config::ServerConfig;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Allow cross-origin browser clients
    pub enable_cors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { enable_cors: true }
    }
}

/// Create the router with all middleware.
pub fn create_router(state: Arc<AppState>, config: ApiConfig) -> Router {
    let mut router = Router::new()
        .nest("/api", routes::api_routes())
        .route("/health", axum::routing::get(handlers::health::health_check))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        );

    if config.enable_cors {
        router = router.layer(CorsLayer::permissive());
    }

    router
}

/// Serve the API until Ctrl+C or SIGTERM.
pub async fn serve(service: JarvisService, config: &ServerConfig) -> anyhow::Result<()> {
    let purged = service.purge_expired_sessions(Utc::now()).await?;
    if purged > 0 {
        tracing::info!(count = purged, "Purged expired sessions");
    }

    let state = Arc::new(AppState::new(service));
    let app = create_router(
        state,
        ApiConfig {
            enable_cors: config.enable_cors,
        },
    );

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    tracing::info!(addr = %config.bind, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
