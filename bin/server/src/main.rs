mod config;
mod constants;
mod handlers;
mod state;

use actix_web::{web, App, HttpServer};
use config::ServerConfig;
use state::AppState;
use storage::FileStore;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Filter out actix-server worker shutdown messages
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("info")
            .add_directive("actix_server::worker=warn".parse()?)
            .add_directive("actix_server::accept=warn".parse()?),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting file server (PID: {})", std::process::id());

    let config = ServerConfig::load().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;
    info!("Configuration loaded: {:?}", config);

    let store = FileStore::open(&config.storage_dir).map_err(|e| {
        error!("Failed to initialize storage: {}", e);
        e
    })?;
    info!("Using storage directory: {:?}", store.root());

    std::fs::create_dir_all(&config.spool_dir).map_err(|e| {
        error!("Failed to create spool directory {:?}: {}", config.spool_dir, e);
        e
    })?;

    let state = web::Data::new(AppState::from_config(&config, store));
    let bind_address = config.bind_address();

    info!("Starting server on http://{}", bind_address);
    info!(
        "Maximum upload size: {} bytes, upload endpoint: {}",
        config.max_upload_size,
        common::UPLOAD_ENDPOINT
    );

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(handlers::configure)
    })
    .bind(&bind_address)
    .map_err(|e| {
        error!("Failed to bind to {}: {}", bind_address, e);
        e
    })?;

    info!("Server bound successfully to http://{}", bind_address);

    // Runs until the server receives a shutdown signal
    server.run().await?;

    info!("Server stopped");
    Ok(())
}
