//! Marketing site web server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request id ─▶ trace ─▶ cache policy ─▶ timeout ─▶ body limit
//!                                                                          │
//!                                                                          ▼
//!                                                              dispatch (route table)
//!                                                                          │
//!                     ┌───────────────┬──────────────┬─────────────┬───────┴────────┐
//!                     ▼               ▼              ▼             ▼                ▼
//!                static files     redirects     /api/purge   /api/mailchimp    /api/crumb
//!                (public/)     (/bo, download)    (Fastly)     (Mailchimp)
//! ```
//!
//! Configuration comes from an optional TOML file, then `PORT`,
//! `FASTLY_API_KEY`, `FASTLY_SERVICE_ID`, `MAILCHIMP_API_KEY` and
//! `MAILCHIMP_LIST_ID`, then command-line flags.

use std::path::PathBuf;

use clap::Parser;

use site_server::config::{self, SiteConfig};
use site_server::lifecycle::{signals, startup, Shutdown};
use site_server::observability::logging;
use site_server::HttpServer;

#[derive(Parser)]
#[command(name = "site-server")]
#[command(about = "Serves the marketing site and its small API", long_about = None)]
struct Args {
    /// TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen port (overrides config and PORT).
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory of static assets (overrides config).
    #[arg(long)]
    static_root: Option<PathBuf>,
}

fn load(args: &Args) -> Result<SiteConfig, config::ConfigError> {
    config::load_config_with(args.config.as_deref(), |config| {
        if let Some(port) = args.port {
            config.listener.port = port;
        }
        if let Some(root) = &args.static_root {
            config.static_files.root = root.clone();
        }
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match load(&args) {
        Ok(config) => config,
        Err(e) => {
            logging::init_logging(&Default::default());
            tracing::error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };
    logging::init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.bind_address(),
        static_root = %config.static_files.root.display(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    startup::start_metrics(&config.observability);

    let server = HttpServer::new(config.clone())?;
    let listener = startup::bind_listener(&config).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    signals::spawn_signal_handler(shutdown);

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
