use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use confstream_leg_core::{CallFlowController, LegRegistry, VoiceApiGateway};
use confstream_webhook_server::logging::{log_welcome, parse_log_level, setup_logging, LoggingConfig};
use confstream_webhook_server::sweeper::spawn_stale_sweeper;
use confstream_webhook_server::{create_router, AppState, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "confstream", version, about = "Conference call orchestration with per-participant audio streaming")]
struct Args {
    /// Configuration file (TOML); missing files are ignored
    #[arg(short, long, default_value = "confstream.toml")]
    config: PathBuf,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Log as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::load(&args.config)
        .with_context(|| format!("loading configuration from {}", args.config.display()))?;
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let mut logging = LoggingConfig::from_settings(&config.logging)?;
    if let Some(level) = &args.log_level {
        logging.level = parse_log_level(level)?;
    }
    if args.json_logs {
        logging = logging.with_json();
    }
    let app_name = logging.app_name.clone();
    setup_logging(logging)?;
    log_welcome(&app_name, env!("CARGO_PKG_VERSION"));

    config.validate()?;
    let addr = config.server.socket_addr()?;

    let gateway = Arc::new(VoiceApiGateway::new(config.gateway.clone()).context("creating voice API gateway")?);
    let registry = Arc::new(LegRegistry::new());
    let controller = Arc::new(CallFlowController::new(gateway, registry, config.flow.clone()));
    let sweeper = spawn_stale_sweeper(
        controller.clone(),
        config.server.sweep_interval(),
        config.server.stale_after(),
    );
    let app = create_router(AppState::new(controller, config.server.public_host.clone()));

    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {}", listener.local_addr()?);
    if let Some(host) = &config.server.public_host {
        info!("Callbacks advertised on {}://{}", config.flow.callback_scheme, host);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
