//! Tollgate server entry point.

mod app;
mod config;
mod error;

use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::config::ServerConfig;
use crate::error::ServerError;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tollgate=info"));
    tracing_subscriber::fmt().with_env_filter(filter).json().init();

    tracing::info!("Starting Tollgate server...");

    if let Err(e) = run().await {
        tracing::error!(error = %e, "Tollgate server failed");
        std::process::exit(1);
    }

    tracing::info!("Tollgate server stopped.");
}

async fn run() -> Result<(), ServerError> {
    let config = ServerConfig::load()?;

    let db = tollgate_db::DbManager::connect(&config.database).await?;
    db.migrate().await?;

    let app = App::build(db.client(), &config)?;
    app.sync_scopes(&config.scope_groups, &config.scopes).await?;

    tracing::info!("Tollgate server ready");
    tokio::signal::ctrl_c().await.map_err(ServerError::Signal)?;
    tracing::info!("Shutdown signal received");
    Ok(())
}
