//! # Askboard Server
//!
//! Main entry point for the Askboard Q&A backend.

use askboard_config::{ConfigLoader, ObservabilityConfig};
use askboard_core::{AskError, AskResult};
use askboard_rest::{create_router, AppState};
use askboard_server::{di, startup, telemetry};
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        telemetry::init_logging(&ObservabilityConfig::default());
        error!("Application error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> AskResult<()> {
    let config_loader = ConfigLoader::from_default_location()?;
    let config = config_loader.get().await;

    telemetry::init_logging(&config.observability);
    startup::print_banner();

    info!("Starting Askboard server...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Environment: {}", config.app.environment);

    let metrics = telemetry::install_metrics(&config.observability)?;

    let components = di::build_components(&config).await?;

    let state = AppState::new(components.question_service.clone())
        .with_database(components.database.clone());
    let mut router = create_router(state, &config.server);

    let metrics_path = metrics.as_ref().map(|_| config.observability.metrics_path.as_str());
    if let Some(handle) = metrics.clone() {
        router = router.merge(telemetry::metrics_router(
            handle,
            &config.observability.metrics_path,
        ));
    }

    let addr = config.server.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AskError::Internal(format!("Failed to bind {}: {}", addr, e)))?;

    startup::print_startup_info(&addr, metrics_path);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| AskError::Internal(format!("Server error: {}", e)))?;

    components.database.close().await;
    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        () = terminate => {
            info!("Received terminate signal, initiating graceful shutdown...");
        }
    }
}
