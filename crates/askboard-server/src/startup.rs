//! Server startup utilities.

use tracing::info;

/// Prints the startup banner.
pub fn print_banner() {
    info!(
        r#"
    _        _    _                       _
   / \   ___| | _| |__   ___   __ _ _ __ __| |
  / _ \ / __| |/ / '_ \ / _ \ / _` | '__/ _` |
 / ___ \\__ \   <| |_) | (_) | (_| | | | (_| |
/_/   \_\___/_|\_\_.__/ \___/ \__,_|_|  \__,_|
    "#
    );
}

/// Prints server startup information.
pub fn print_startup_info(addr: &str, metrics_path: Option<&str>) {
    let separator = "=".repeat(60);
    info!("{}", separator);
    info!("REST API:  http://{}/api/v1/questions", addr);
    info!("Health:    http://{}/health", addr);
    if let Some(path) = metrics_path {
        info!("Metrics:   http://{}{}", addr, path);
    }
    info!("{}", separator);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_banner_does_not_panic() {
        let _ = tracing_subscriber::fmt::try_init();
        print_banner();
    }

    #[test]
    fn test_print_startup_info_does_not_panic() {
        let _ = tracing_subscriber::fmt::try_init();
        print_startup_info("0.0.0.0:8080", Some("/metrics"));
        print_startup_info("127.0.0.1:3000", None);
    }
}
