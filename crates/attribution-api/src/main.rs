//! Attribution Platform API Server
//!
//! Binary entry point: loads settings, boots the singleton chain (§9), and
//! serves the HTTP surface until SIGINT/SIGTERM.

use anyhow::Result;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use attribution_api::app;

/// Wait for shutdown signal (SIGINT or SIGTERM).
///
/// Cross-platform signal handling:
/// - SIGINT (Ctrl+C): available on all platforms via `tokio::signal::ctrl_c()`
/// - SIGTERM: Unix-only via `tokio::signal::unix::signal()`
async fn shutdown_signal() -> Result<()> {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut terminate =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

        tokio::select! {
            _ = ctrl_c => {
                info!("Received Ctrl+C (SIGINT), initiating graceful shutdown...");
                Ok(())
            }
            _ = terminate.recv() => {
                info!("Received SIGTERM, initiating graceful shutdown...");
                Ok(())
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await?;
        info!("Received Ctrl+C (SIGINT), initiating graceful shutdown...");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,attribution_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Attribution Platform API Server");

    let settings = attribution_config::Settings::from_env()?;
    let addr = settings.server_addr();
    let shutdown_drain = Duration::from_secs(settings.ingestion.shutdown_drain_secs);

    info!("Listening on: http://{addr}");

    let (app, state) = app::create_app(settings).await?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        shutdown_drain_secs = shutdown_drain.as_secs(),
        "Starting server with graceful shutdown"
    );

    let shutdown_result = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let shutdown_start = Instant::now();

            // §5 scopes the 30s bound to the drain (IngestionPipeline::stop),
            // not to how long the server idles before a signal arrives.
            match shutdown_signal().await {
                Ok(()) => {
                    info!("Shutdown signal received, initiating graceful shutdown...");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Error waiting for shutdown signal");
                }
            }

            state.cancellation.cancel();
            state.shutdown().await;

            let shutdown_duration = shutdown_start.elapsed();
            info!(
                shutdown_duration_ms = shutdown_duration.as_millis(),
                "Graceful shutdown completed"
            );
        })
        .await;

    match shutdown_result {
        Ok(()) => {
            info!("Server shut down successfully");
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "Error during server shutdown");
            Err(anyhow::anyhow!("Server shutdown error: {e}"))
        }
    }
}
