//! Calendar server entry point.

use std::sync::Arc;

use calendar_server::{create_storage, run_http, ApiState, CalendarService, Config};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Calendar HTTP server
#[derive(Parser, Debug)]
#[command(name = "calendar-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// HTTP port (overrides config file and PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Interface to bind
    #[arg(long)]
    host: Option<String>,

    /// Enable JSON logging format
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(config: &Config, json_logs: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    if json_logs || config.logging.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = if let Some(path) = &args.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };
    init_tracing(&config, args.json_logs);

    config.apply_env();
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host {
        config.server.host = host;
    }
    config.validate()?;

    tracing::info!("Starting calendar server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        cors = config.server.enable_cors,
        "Configuration loaded"
    );

    let service = Arc::new(CalendarService::new(create_storage()));
    let state = Arc::new(
        ApiState::new(service)?.with_request_timeout(config.server.request_timeout()),
    );

    run_http(&config.server, state).await?;
    Ok(())
}
