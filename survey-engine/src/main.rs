//! survey-engine - survey ingestion and analytics service
//!
//! Configuration resolution: CLI argument, then environment variable, then
//! the TOML file in the platform config directory, then built-in defaults.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use survey_common::config::{load_toml, resolve_config_path, resolve_database_path};
use survey_common::db::init_database;
use survey_engine::config::TomlConfig;
use survey_engine::{build_router, AppState};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for survey-engine
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// SQLite database file (overrides SURVEY_DATABASE and the config file)
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "SURVEY_PORT")]
    port: Option<u16>,

    /// Interface to bind
    #[arg(short, long, env = "SURVEY_BIND")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Loaded before tracing so the configured level applies from the start
    let config_path = resolve_config_path(args.config.as_deref());
    let config: TomlConfig =
        load_toml(config_path.as_deref()).context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting survey-engine v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match &config_path {
        Some(path) => info!("Config file: {}", path.display()),
        None => info!("No config file found, using defaults"),
    }

    let db_path = resolve_database_path(args.database.as_deref(), config.database_path.as_deref());
    info!("Database path: {}", db_path.display());

    let pool = match init_database(&db_path).await {
        Ok(pool) => {
            info!("✓ Database ready");
            pool
        }
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e.into());
        }
    };

    info!(
        surveys = config.ingestion.survey_count,
        questions = config.ingestion.questions_per_survey,
        channel = %config.ingestion.channel,
        mode = ?config.ingestion.unit_write_mode,
        "Ingestion policy"
    );

    config
        .ingestion
        .check()
        .context("Invalid ingestion policy")?;

    let bind = args.bind.unwrap_or_else(|| config.bind_address.clone());
    let port = args.port.unwrap_or(config.port);
    let addr: SocketAddr = format!("{}:{}", bind, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", bind, port))?;

    let app = build_router(AppState::new(pool, config.ingestion));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("survey-engine listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
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
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
