//! Router configuration.

use crate::handlers::{admin, demo, health, operator};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::path::Path;
use tower_http::{services::ServeDir, trace::TraceLayer};

/// Build the complete Axum router.
///
/// Every mutating route answers `303 See Other`:
///
/// | Route | Handler |
/// |---|---|
/// | `GET /`, `POST /` | demo page, increment/decrement |
/// | `POST /reset` | clear live counts |
/// | `POST /login` | set operator cookies |
/// | `GET /main`, `POST /main` | exchange desk, increment/decrement |
/// | `POST /main/reset` | checkout |
/// | `POST /main/logout` | archive and log out |
/// | `GET /main/reset_DBS` | zero persisted counts |
/// | `GET /main/clear_SOS` | delete the session ledger |
///
/// plus `/health`, `/ready`, `/metrics` and static files under `/static`.
pub fn build_router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route("/", get(demo::show).post(demo::update))
        .route("/reset", post(demo::reset))
        .route("/login", post(operator::login))
        .route("/main", get(operator::show).post(operator::update))
        .route("/main/reset", post(operator::checkout))
        .route("/main/logout", post(operator::logout))
        .route("/main/reset_DBS", get(admin::reset_counts))
        .route("/main/clear_SOS", get(admin::clear_sessions))
        // Health checks
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
