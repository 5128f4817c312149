//! shici-server - classical Chinese poetry API

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Duration;
use clap::Parser;
use shici_common::config::{self, Backend, TomlConfig};
use shici_common::db::init_database;
use shici_server::account::{AccountService, Argon2Hasher, JwtIssuer, UserRepository};
use shici_server::query::QueryService;
use shici_server::{build_router, open_store, AppState};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for shici-server
#[derive(Parser, Debug)]
#[command(name = "shici-server")]
#[command(about = "Classical Chinese poetry content API")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "SHICI_PORT")]
    port: Option<u16>,

    /// Root of the chinese-poetry source tree (memory backend)
    #[arg(short, long, env = "SHICI_DATA_PATH")]
    data_path: Option<PathBuf>,

    /// SQLite database holding the corpus and user accounts
    #[arg(long, env = "SHICI_DB_PATH")]
    db_path: Option<PathBuf>,

    /// Corpus store: memory or sqlite
    #[arg(short, long, env = "SHICI_BACKEND")]
    backend: Option<String>,

    /// Credential signing secret
    #[arg(long, env = "SHICI_JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// TOML configuration file
    #[arg(short, long, env = "SHICI_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let toml = TomlConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "shici_server={0},shici_ingest={0},shici_common={0},tower_http={0}",
                    toml.logging.level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port = config::resolve(args.port, toml.port, config::DEFAULT_PORT);
    let data_path = config::resolve(args.data_path, toml.data_path, PathBuf::from(config::DEFAULT_DATA_PATH));
    let db_path = config::resolve(args.db_path, toml.database_path, PathBuf::from(config::DEFAULT_DB_PATH));
    let backend: Backend = config::resolve(args.backend, toml.backend, Backend::Sqlite.to_string())
        .parse()
        .context("Invalid backend")?;

    info!("Starting shici-server on port {} ({} backend)", port, backend);
    info!("Database path: {}", db_path.display());
    if backend == Backend::Memory {
        info!("Data path: {}", data_path.display());
    }

    // Accounts always live in SQLite, whichever backend serves the corpus
    let pool = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    let store = open_store(backend, data_path, pool.clone())
        .await
        .context("Failed to open corpus store")?;

    let secret = match args.jwt_secret.or(toml.auth.secret.clone()) {
        Some(secret) => secret,
        None => {
            warn!("No JWT secret configured; using the development secret");
            config::DEV_JWT_SECRET.to_string()
        }
    };
    let issuer = JwtIssuer::new(
        secret,
        Duration::hours(toml.auth.token_ttl_hours),
        Duration::minutes(toml.auth.refresh_window_minutes),
    )
    .context("Invalid credential settings")?;

    let accounts = AccountService::new(
        UserRepository::new(pool.clone()),
        Arc::new(Argon2Hasher),
        Arc::new(issuer),
    );
    let app = build_router(AppState::new(QueryService::new(store), accounts));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    pool.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
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
                error!("Failed to install signal handler: {}", e);
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
