//! CO2 exchange tracker HTTP server.

use anyhow::Context;
use co2_tracker_core::{environment::SystemClock, Reconciler, TrackerService};
use co2_tracker_postgres::{connect_pool, migrate, PostgresCatalog, PostgresDocumentStore};
use co2_tracker_web::{build_router, telemetry, AppState, Config};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if present)
    let _ = dotenvy::dotenv();

    telemetry::init_tracing()?;
    let metrics = telemetry::init_metrics()?;

    info!("Starting CO2 exchange tracker");

    let config = Config::from_env();
    info!(
        address = %config.bind_address(),
        separate_catalog = config.separate_catalog(),
        static_dir = %config.static_dir.display(),
        "Configuration loaded"
    );

    // Document store (items, sessions, archive)
    let database = &config.database;
    let documents_pool = connect_pool(&database.url, database.max_connections, database.connect_timeout())
        .await
        .context("Failed to connect to the document store")?;
    if database.run_migrations {
        migrate(&documents_pool).await?;
    }

    // Catalog, on its own database if configured
    let catalog_pool = if config.separate_catalog() {
        let pool = connect_pool(&database.catalog_url, database.max_connections, database.connect_timeout())
            .await
            .context("Failed to connect to the catalog")?;
        if database.run_migrations {
            migrate(&pool).await?;
        }
        pool
    } else {
        documents_pool.clone()
    };
    info!("Databases connected");

    let reconciler = Reconciler::new(
        Arc::new(PostgresDocumentStore::from_pool(documents_pool)),
        Arc::new(SystemClock),
        config.factors,
    );
    let service = TrackerService::load(&PostgresCatalog::from_pool(catalog_pool), reconciler)
        .await
        .context("Failed to load the item catalog")?;

    let state = AppState::new(Arc::new(service))?.with_metrics(metrics);
    let app = build_router(state, &config.static_dir);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    info!(address = %config.bind_address(), "Server listening");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    tokio::select! {
        result = &mut server => {
            result??;
            warn!("Server stopped without a shutdown signal");
            return Ok(());
        },
        () = shutdown_signal() => {},
    }

    let _ = shutdown_tx.send(());
    let timeout = config.server.shutdown_timeout();
    match tokio::time::timeout(timeout, server).await {
        Ok(result) => result??,
        Err(_) => warn!(timeout_secs = timeout.as_secs(), "Graceful shutdown timed out"),
    }

    info!("Server stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            },
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
