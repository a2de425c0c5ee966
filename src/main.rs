//! SHIELD API server

use std::net::SocketAddr;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use shield_api::{config::LogFormat, create_router, store::CredentialStore, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shield_api=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    tracing::info!("SHIELD API starting ({})...", config.environment);
    tracing::info!("Model: {:?} (retrain -> {:?})", config.model_path, config.new_model_path);
    if config.refresh_command.is_none() {
        tracing::warn!("SHIELD_REFRESH_COMMAND not set, /update_data will fail");
    }

    let store = CredentialStore::load(&config.users_db_path)
        .await
        .context("Failed to load credential store")?;
    tracing::info!("Credential store: {:?}", store.path());

    let state = AppState::new(config.clone(), store);
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
