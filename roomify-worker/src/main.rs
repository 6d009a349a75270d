//! roomify-worker - project persistence service
//!
//! Resolves configuration (CLI -> ENV -> TOML -> defaults), opens the
//! project store, and serves the save/get/list API.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use roomify_common::config::{load_toml_config, WorkerSettings};
use roomify_worker::api::{RemoteSessions, SessionResolver, StaticSessions};
use roomify_worker::store::{KvStore, MemoryStore, SqliteStore};
use roomify_worker::{build_router, AppState};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for roomify-worker
#[derive(Parser, Debug)]
#[command(name = "roomify-worker")]
#[command(about = "Project persistence API for Roomify")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// SQLite database file (in-memory store when omitted)
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Config file (default: <config dir>/roomify/roomify.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let toml_config = load_toml_config(args.config.as_deref())?;

    // Initialize tracing (RUST_LOG wins over the TOML level)
    let default_filter = format!(
        "roomify_worker={level},tower_http={level}",
        level = toml_config.logging.level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting roomify-worker v{}", env!("CARGO_PKG_VERSION"));

    let settings = WorkerSettings::resolve(args.port, args.database.as_deref(), &toml_config)?;

    let store: Arc<dyn KvStore> = match &settings.database_path {
        Some(path) => Arc::new(
            SqliteStore::open(path)
                .await
                .with_context(|| format!("Failed to open database {}", path.display()))?,
        ),
        None => {
            warn!("No database configured; projects are kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    let sessions: Arc<dyn SessionResolver> = match &settings.auth_url {
        Some(auth_url) => {
            info!("Resolving sessions via {}", auth_url);
            Arc::new(RemoteSessions::new(auth_url).context("Failed to build auth client")?)
        }
        None => {
            let sessions = StaticSessions::new(&settings.sessions);
            if sessions.is_empty() {
                warn!("No auth provider or static sessions configured; every request will be rejected");
            } else {
                info!("Loaded {} static session(s)", sessions.len());
            }
            Arc::new(sessions)
        }
    };

    let app = build_router(AppState::new(store, sessions));

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("roomify-worker listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

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
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
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
                warn!("Failed to install SIGTERM handler: {}", e);
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
