//! MediaVault API - Main entry point
//!
//! Private media vault backend: PIN login, guest invitations, and the
//! video/audio catalog, served over HTTP together with the frontend
//! bundle and the uploaded blobs.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mediavault_api::services::{spawn_mailer, MediaStore};
use mediavault_api::AppState;
use mediavault_common::auth::TokenService;
use mediavault_common::config::AppConfig;
use mediavault_common::db::init::init_database;
use mediavault_common::settings::SettingsStore;

/// Command-line arguments for mediavault-api
#[derive(Parser, Debug)]
#[command(name = "mediavault-api")]
#[command(about = "Private media vault backend")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8000", env = "MEDIAVAULT_PORT")]
    port: u16,

    /// Vault root folder (database, static bundle, uploads)
    #[arg(short, long, env = "MEDIAVAULT_ROOT_FOLDER")]
    root_folder: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "mediavault_api=debug,mediavault_common=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command-line arguments
    let args = Args::parse();

    info!(
        "Starting MediaVault API v{} ({} {} built {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_PROFILE"),
        env!("BUILD_TIMESTAMP"),
    );

    let config = AppConfig::load(args.root_folder.as_deref())?;
    info!("Vault root: {}", config.root_folder.display());

    std::fs::create_dir_all(&config.root_folder)
        .context("Failed to create vault root folder")?;

    let db = init_database(&config.db_path())
        .await
        .context("Failed to open database")?;
    info!("Database: {}", config.db_path().display());

    let settings = SettingsStore::init(db.clone())
        .await
        .context("Failed to initialize system settings")?;

    let tokens = TokenService::new(&config.secret_key, config.token_ttl_minutes);

    let store =
        MediaStore::init(config.upload_dir()).context("Failed to initialize media store")?;

    let mailer = spawn_mailer(settings.clone(), config.smtp.clone());

    let state = AppState::new(db, config, settings, tokens, store, mailer);
    let app = mediavault_api::build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
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
