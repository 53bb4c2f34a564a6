use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use faunaguard_api::{router, AppState};
use faunaguard_core::{LogDispatcher, Settings};
use faunaguard_detect::{build_detector, RemoteDetector};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str =
    "faunaguard=info,faunaguard_api=info,faunaguard_core=info,faunaguard_detect=info,tower_http=info";

#[derive(Parser, Debug)]
#[command(author, version, about = "Dangerous-animal alert backend for camera traps", long_about = None)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP API server
    Serve(ServeArgs),
    /// Check that the inference service answers its health endpoint
    Probe,
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Listen address, overriding BIND_ADDR
    #[arg(long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let settings = Settings::from_env().context("invalid configuration")?;

    match cli.command {
        Command::Serve(args) => serve(settings, args).await,
        Command::Probe => probe(&settings).await,
    }
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn serve(settings: Settings, args: ServeArgs) -> Result<()> {
    if settings.uses_default_secret() {
        warn!("CAMERA_SECRET is not set; camera registration accepts the built-in default secret");
    }

    let detector = build_detector(&settings.detector).context("failed to build detector")?;
    let state = AppState::new(&settings, detector, Arc::new(LogDispatcher));

    info!(
        detector = state.engine.detector_name(),
        dangerous = ?settings.dangerous_animals.iter().collect::<Vec<_>>(),
        enforce_threshold = settings.enforce_confidence_threshold,
        "alert engine configured"
    );

    let bind = args.bind.unwrap_or(settings.bind_addr);
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn probe(settings: &Settings) -> Result<()> {
    let detector = RemoteDetector::with_timeout(settings.detector.url.clone(), settings.detector.timeout)?;
    if !detector.health_check().await {
        bail!("inference service at {} is not healthy", detector.base_url());
    }
    info!(url = detector.base_url(), "inference service is healthy");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
