//! Startup orchestration.
//!
//! # Responsibilities
//! - Start optional subsystems (metrics exporter)
//! - Bind the listener
//!
//! # Design Decisions
//! - Optional subsystems never abort startup
//! - The listener is bound last, once everything else is ready

use std::net::SocketAddr;

use axum::http::header::InvalidHeaderName;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{ObservabilityConfig, SiteConfig};
use crate::observability::metrics;

/// Errors that stop the server from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid user agent rule: {0}")]
    UserAgentRules(#[from] regex::Error),

    #[error("failed to build upstream HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("invalid CSRF header name: {0}")]
    CsrfHeader(#[from] InvalidHeaderName),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Start the metrics exporter if enabled. Returns whether it is running.
pub fn start_metrics(config: &ObservabilityConfig) -> bool {
    if !config.metrics_enabled {
        return false;
    }

    let addr: SocketAddr = match config.metrics_address.parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!(
                metrics_address = %config.metrics_address,
                error = %e,
                "Failed to parse metrics address, continuing without metrics"
            );
            return false;
        }
    };

    match metrics::init_metrics(addr) {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(error = %e, "Metrics exporter failed to start, continuing without metrics");
            false
        }
    }
}

/// Bind the site listener.
pub async fn bind_listener(config: &SiteConfig) -> Result<TcpListener, StartupError> {
    let address = config.bind_address();
    TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_disabled() {
        assert!(!start_metrics(&ObservabilityConfig::default()));
    }

    #[tokio::test]
    async fn test_bad_metrics_address_is_not_fatal() {
        let config = ObservabilityConfig {
            metrics_enabled: true,
            metrics_address: "not an address".into(),
            ..Default::default()
        };
        assert!(!start_metrics(&config));
    }

    #[tokio::test]
    async fn test_bind_ephemeral_port() {
        let mut config = SiteConfig::default();
        config.listener.host = "127.0.0.1".into();
        config.listener.port = 0;
        let listener = bind_listener(&config).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }
}
