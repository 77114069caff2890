//! HTTP request handlers.
//!
//! - [`demo`]: public demo page, counts only
//! - [`operator`]: exchange desk with checkout, login and logout
//! - [`admin`]: maintenance routes that bypass the checkout flow
//! - [`health`]: liveness, readiness and metrics

pub mod admin;
pub mod demo;
pub mod health;
pub mod operator;

pub use health::health_check;

use crate::error::AppError;
use co2_tracker_core::{ItemAction, TrackerService};
use serde::Deserialize;

/// Form posted by the increment/decrement buttons.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemForm {
    /// `increment` or `decrement`
    pub action: String,
    /// Item the button belongs to
    pub item_name: String,
}

/// Applies a button press to the item table.
///
/// Unknown actions and unknown items change nothing and are only logged.
///
/// # Errors
///
/// Returns [`AppError`] only if the tracker fails for another reason.
pub async fn apply_form(service: &TrackerService, form: &ItemForm) -> Result<(), AppError> {
    let Some(action) = ItemAction::parse(&form.action, &form.item_name) else {
        tracing::debug!(action = %form.action, item_name = %form.item_name, "Ignoring unknown action");
        return Ok(());
    };

    match service.apply(&action).await {
        Ok(()) => Ok(()),
        Err(err) if err.is_ignorable() => {
            tracing::debug!(item_name = %form.item_name, error = %err, "Ignoring unknown item");
            Ok(())
        },
        Err(err) => Err(err.into()),
    }
}
