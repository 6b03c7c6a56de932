#![cfg_attr(test, allow(clippy::disallowed_methods))]
// Forbid unwrap() in production code to prevent panics from corrupt data.
// Test code is allowed to use unwrap() for convenience.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
use std::net::SocketAddr;
use std::sync::Arc;

use lostfound_server::auth::TokenCodec;
use lostfound_server::config::ServerConfig;
use lostfound_server::images::ImageStore;
use lostfound_server::storage::Database;
use lostfound_server::{AppState, router};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lostfound_server=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // A missing .env file is fine; real environment variables still apply.
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("no .env file loaded: {e}");
    }

    // Load configuration from environment variables
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Loaded configuration: data_directory={}, upload_directory={}, listen_port={}",
        config.data_directory.display(),
        config.upload_directory.display(),
        config.listen_port
    );

    // Pre-condition: both directories are valid paths.
    // Post-condition: they exist and are accessible.
    for directory in [&config.data_directory, &config.upload_directory] {
        if let Err(e) = std::fs::create_dir_all(directory) {
            tracing::error!("Failed to create directory {}: {e}", directory.display());
            std::process::exit(1);
        }
    }

    let database = match Database::open(&config.snapshot_path()) {
        Ok(database) => database,
        Err(e) => {
            tracing::error!("Failed to open database: {e}");
            std::process::exit(1);
        }
    };

    let state = AppState {
        database: Arc::new(database),
        tokens: Arc::new(TokenCodec::new(&config.jwt_secret)),
        images: Arc::new(ImageStore::new(
            config.upload_directory.clone(),
            &config.public_url,
        )),
    };
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.listen_port));
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to bind: {e}");
            std::process::exit(1);
        });

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Server error: {e}");
            std::process::exit(1);
        });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
