//! Tracing and metrics setup for the binary.

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "co2_tracker=info,tower_http=info,sqlx=warn";

/// Installs the global `tracing` subscriber.
///
/// # Errors
///
/// Returns an error if a subscriber is already installed.
pub fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;
    Ok(())
}

/// Installs the Prometheus recorder and describes the tracker's metrics.
///
/// # Errors
///
/// Returns an error if a recorder is already installed.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    describe_metrics();
    Ok(handle)
}

fn describe_metrics() {
    describe_counter!("co2_tracker_commits_total", "Checkouts accepted by the document store");
    describe_counter!(
        "co2_tracker_sessions_recorded_total",
        "Checkouts with a positive total, recorded as sessions"
    );
    describe_counter!(
        "co2_tracker_logouts_archived_total",
        "Logouts that folded the session ledger into the archive"
    );
    describe_counter!(
        "co2_tracker_commit_failures_total",
        "Checkouts rejected by the document store"
    );
    describe_histogram!(
        "co2_tracker_co2_committed_kg",
        "CO2 saved per recorded session, in kilograms"
    );
}
