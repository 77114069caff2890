//! Exchange desk used by the event operator.

use super::{apply_form, ItemForm};
use crate::{
    error::AppError,
    extractors::{remove_cookie, set_cookie, OperatorCookies, USER_NAME_COOKIE, WELCOME_MESSAGE_COOKIE},
    state::AppState,
};
use axum::{
    extract::State,
    http::header::SET_COOKIE,
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
    Form,
};
use co2_tracker_core::{
    Category, CumulativeTotals, Equivalents, LedgerPhase, LogoutOutcome, RankedItem,
};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct OperatorPage<'a> {
    categories: &'a [Category],
    total_co2: f64,
    equivalents: Equivalents,
    totals: &'a CumulativeTotals,
    phase: LedgerPhase,
    ranked_items: &'a [RankedItem],
    user_name: Option<&'a str>,
    welcome_message: Option<&'a str>,
    form_action: &'static str,
}

/// `GET /main`: live counts plus the event's cumulative totals and ranking.
///
/// A welcome message cookie is shown once and then cleared.
///
/// # Errors
///
/// Returns [`AppError`] if the ledger cannot be read or the page fails to render.
pub async fn show(State(state): State<AppState>, cookies: OperatorCookies) -> Result<Response, AppError> {
    let view = state.service.dashboard().await?;

    let html = state.templates.render(
        "main.html",
        OperatorPage {
            categories: &view.live.categories,
            total_co2: view.live.total_co2,
            equivalents: view.live.equivalents,
            totals: &view.ledger.totals,
            phase: view.ledger.totals.phase(),
            ranked_items: &view.ledger.ranked_items,
            user_name: cookies.user_name.as_deref(),
            welcome_message: cookies.welcome_message.as_deref(),
            form_action: "/main",
        },
    )?;

    let clear_welcome = cookies
        .welcome_message
        .is_some()
        .then(|| (SET_COOKIE, remove_cookie(WELCOME_MESSAGE_COOKIE)));

    Ok((AppendHeaders(clear_welcome), Html(html)).into_response())
}

/// `POST /main`: increment or decrement one item.
///
/// # Errors
///
/// Returns [`AppError`] if the tracker fails.
pub async fn update(
    State(state): State<AppState>,
    Form(form): Form<ItemForm>,
) -> Result<Redirect, AppError> {
    apply_form(&state.service, &form).await?;
    Ok(Redirect::to("/main"))
}

/// `POST /main/reset`: check out the current counts as one session.
///
/// # Errors
///
/// Returns [`AppError`] if the checkout could not be persisted; the counts
/// stay on screen so the operator can retry.
pub async fn checkout(State(state): State<AppState>) -> Result<Redirect, AppError> {
    let outcome = state.service.commit().await?;
    tracing::debug!(
        items_updated = outcome.items_updated,
        recorded = outcome.session.is_some(),
        "Checkout complete"
    );
    Ok(Redirect::to("/main"))
}

/// Form posted from the demo page to start an event.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    /// Operator name
    pub user_name: String,
}

/// `POST /login`: remember the operator and greet them once.
///
/// # Errors
///
/// Returns [`AppError`] if the name is blank.
pub async fn login(Form(form): Form<LoginForm>) -> Result<Response, AppError> {
    let user_name = form.user_name.trim();
    if user_name.is_empty() {
        return Err(AppError::bad_request("user_name must not be empty"));
    }

    tracing::info!(user_name, "Operator logged in");

    let welcome = format!("Welcome, {user_name}!");
    Ok((
        AppendHeaders([
            (SET_COOKIE, set_cookie(USER_NAME_COOKIE, user_name)),
            (SET_COOKIE, set_cookie(WELCOME_MESSAGE_COOKIE, &welcome)),
        ]),
        Redirect::to("/main"),
    )
        .into_response())
}

/// `POST /main/logout`: archive the event and forget the operator.
///
/// # Errors
///
/// Returns [`AppError`] if archiving fails; the cookie is then kept.
pub async fn logout(State(state): State<AppState>, cookies: OperatorCookies) -> Result<Response, AppError> {
    let outcome = state.service.logout(cookies.user_name.as_deref()).await?;
    if let LogoutOutcome::Archived(entry) = &outcome {
        tracing::debug!(sessions = entry.session_count, "Event archived at logout");
    }

    Ok((
        AppendHeaders([(SET_COOKIE, remove_cookie(USER_NAME_COOKIE))]),
        Redirect::to("/"),
    )
        .into_response())
}
