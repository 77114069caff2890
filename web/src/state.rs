//! Application state shared by every handler.

use crate::render::Templates;
use co2_tracker_core::TrackerService;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Cheap to clone: everything sits behind an `Arc` or is a handle.
#[derive(Clone)]
pub struct AppState {
    /// Item table plus reconciler
    pub service: Arc<TrackerService>,
    /// Compiled page templates
    pub templates: Arc<Templates>,
    /// Prometheus recorder handle, if one is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Builds the state around a loaded service.
    ///
    /// # Errors
    ///
    /// Returns a [`minijinja::Error`] if the bundled templates fail to compile.
    pub fn new(service: Arc<TrackerService>) -> Result<Self, minijinja::Error> {
        Ok(Self {
            service,
            templates: Arc::new(Templates::new()?),
            metrics: None,
        })
    }

    /// Attaches a Prometheus handle so `/metrics` can render it.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_is_clone() {
        // Axum requires Clone state
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }
}
