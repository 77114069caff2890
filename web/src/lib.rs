//! Axum front end for the CO2 exchange tracker.
//!
//! Two pages share one in-memory item table:
//!
//! - `/` is a public demo: counts go up and down and can be reset, nothing
//!   is persisted.
//! - `/main` is the exchange desk: a checkout records the counts as one
//!   session, a logout folds the sessions into the archive.
//!
//! # Request Flow
//!
//! 1. **HTTP Request** arrives at an Axum handler
//! 2. **Extract** the form and operator cookies
//! 3. **Call** the [`TrackerService`](co2_tracker_core::TrackerService)
//! 4. **Redirect** (`303 See Other`) or render a template
//!
//! # Example
//!
//! ```no_run
//! use co2_tracker_web::{build_router, AppState};
//! # use std::sync::Arc;
//!
//! # async fn example(service: Arc<co2_tracker_core::TrackerService>) -> anyhow::Result<()> {
//! let state = AppState::new(service)?;
//! let app = build_router(state, std::path::Path::new("static"));
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod render;
pub mod routes;
pub mod state;
pub mod telemetry;

// Re-export key types for convenience
pub use config::Config;
pub use error::AppError;
pub use extractors::OperatorCookies;
pub use routes::build_router;
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
