//! Public demo page: counts only, nothing is persisted.

use super::{apply_form, ItemForm};
use crate::{error::AppError, state::AppState};
use axum::{
    extract::State,
    response::{Html, Redirect},
    Form,
};
use co2_tracker_core::{Category, Equivalents};
use serde::Serialize;

#[derive(Serialize)]
struct DemoPage<'a> {
    categories: &'a [Category],
    total_co2: f64,
    equivalents: Equivalents,
    form_action: &'static str,
}

/// `GET /`: items with the live total and its equivalents.
///
/// # Errors
///
/// Returns [`AppError`] if the page fails to render.
pub async fn show(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let live = state.service.live_view().await;

    let html = state.templates.render(
        "demo.html",
        DemoPage {
            categories: &live.categories,
            total_co2: live.total_co2,
            equivalents: live.equivalents,
            form_action: "/",
        },
    )?;
    Ok(Html(html))
}

/// `POST /`: increment or decrement one item.
///
/// # Errors
///
/// Returns [`AppError`] if the tracker fails.
pub async fn update(
    State(state): State<AppState>,
    Form(form): Form<ItemForm>,
) -> Result<Redirect, AppError> {
    apply_form(&state.service, &form).await?;
    Ok(Redirect::to("/"))
}

/// `POST /reset`: clear the live counts.
pub async fn reset(State(state): State<AppState>) -> Redirect {
    state.service.reset_local().await;
    Redirect::to("/")
}
