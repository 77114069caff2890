//! Maintenance routes.
//!
//! Both bypass the checkout and logout flow and archive nothing.

use crate::{state::AppState, WebResult};
use axum::{extract::State, response::Redirect};

/// `GET /main/reset_DBS`: zero every persisted count.
///
/// # Errors
///
/// Returns [`AppError`](crate::AppError) if the document store fails.
pub async fn reset_counts(State(state): State<AppState>) -> WebResult<Redirect> {
    state.service.admin_reset().await?;
    Ok(Redirect::to("/main"))
}

/// `GET /main/clear_SOS`: delete the session ledger.
///
/// # Errors
///
/// Returns [`AppError`](crate::AppError) if the document store fails.
pub async fn clear_sessions(State(state): State<AppState>) -> WebResult<Redirect> {
    state.service.clear_sessions().await?;
    Ok(Redirect::to("/main"))
}
