use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use nutri_api::config::AppConfig;
use nutri_api::database::DatabaseManager;
use nutri_api::storage::CloudinaryStore;
use nutri_api::{app, AppState};

#[derive(Parser)]
#[command(name = "nutri-api")]
#[command(about = "Nutri API - recipes, articles and nutritionist profiles over HTTP")]
#[command(version)]
struct Cli {
    #[arg(long, env = "HOST", default_value = "0.0.0.0", help = "Address to bind")]
    host: String,

    #[arg(long, env = "PORT", default_value_t = 3000, help = "Port to listen on")]
    port: u16,

    #[arg(long, help = "Start without applying pending migrations")]
    skip_migrations: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, secrets, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("nutri_api=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();

    let config = AppConfig::from_env();
    config.validate().context("invalid configuration")?;
    tracing::info!("Starting Nutri API in {:?} mode", config.environment);

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to database")?;

    if cli.skip_migrations {
        tracing::warn!("Skipping database migrations");
    } else {
        DatabaseManager::migrate(&pool)
            .await
            .context("failed to run migrations")?;
    }

    let images = Arc::new(CloudinaryStore::new(config.storage.clone()));
    let state = AppState::new(pool.clone(), images, config);

    let bind_addr = format!("{}:{}", cli.host, cli.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("Nutri API listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    DatabaseManager::close(pool).await;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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
    tracing::info!("Shutdown signal received");
}
