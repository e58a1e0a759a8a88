//! Logging and metrics setup.

use askboard_config::ObservabilityConfig;
use askboard_core::{AskError, AskResult};
use axum::{routing::get, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Builds the default filter directive for a configured level.
fn default_directive(level: &str) -> String {
    format!("{level},askboard=debug,tower_http=debug")
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` overrides the configured level. Calling this twice is a no-op.
pub fn init_logging(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(&config.log_level)));

    let registry = tracing_subscriber::registry().with(filter);

    let _ = if config.is_json() {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()
    };
}

/// Installs the Prometheus recorder when metrics are enabled.
pub fn install_metrics(config: &ObservabilityConfig) -> AskResult<Option<PrometheusHandle>> {
    if !config.metrics_enabled {
        info!("Metrics disabled");
        return Ok(None);
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| AskError::Configuration(format!("Failed to install metrics recorder: {}", e)))?;

    askboard_service::metrics::register_metrics();
    info!("Prometheus metrics recorder installed");

    Ok(Some(handle))
}

/// Router serving the Prometheus text format at `path`.
pub fn metrics_router(handle: PrometheusHandle, path: &str) -> Router {
    Router::new().route(path, get(move || std::future::ready(handle.render())))
}
