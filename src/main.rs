//! Rocket Crous - food ordering API server
//! Mission: Serve the dish catalog and turn carts into delivered orders

use anyhow::{Context, Result};
use clap::Parser;
use rocket_crous_backend::{router, AppState, Config};
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line overrides for the environment configuration
#[derive(Debug, Parser)]
#[command(name = "rocket-crous", version, about = "Food ordering API server")]
struct Cli {
    /// Port to listen on
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// SQLite database file
    #[arg(long, env = "DATABASE_PATH")]
    database_path: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let mut config = Config::from_env();
    let cli = Cli::parse();
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(path) = cli.database_path {
        config.database_path = path;
    }

    info!("🚀 Rocket Crous starting");

    let state = AppState::from_config(&config)?;
    info!("📊 Database initialized at: {}", config.database_path);

    let app = router(state);

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("🎯 API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// Initialize tracing
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "rocket_crous_backend=debug,rocket_crous=debug,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
