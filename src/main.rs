mod api;
mod app;
mod auth;
mod config;
mod db;
mod domain;
mod error;
mod lifecycle;
mod logging;
mod middleware;
mod routes;
mod services;
mod store;

use anyhow::{Context, Result};
use std::sync::Arc;

use auth::JwtIdentityProvider;
use config::{Settings, StorageBackend};
use lifecycle::ProcurementManager;
use services::UrlDocumentStore;
use store::{MemoryStore, PgStore, ProcurementStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = Settings::from_env()?;

    // Initialize logging
    logging::init_logging(&settings.env);

    tracing::info!(
        env = ?settings.env,
        server_addr = %settings.server_addr,
        storage = ?settings.storage_backend,
        "Starting tender desk"
    );

    let store = build_store(&settings).await?;

    let documents = UrlDocumentStore::new(&settings.document_base_url)
        .context("Invalid DOCUMENT_BASE_URL")?;
    let procurement = ProcurementManager::new(store, Arc::new(documents));
    let identity = Arc::new(JwtIdentityProvider::new(&settings.jwt_secret));

    // Create application state
    let state = app::AppState::new(settings.clone(), procurement, identity);

    // Build application
    let app = app::create_app(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&settings.server_addr).await?;
    tracing::info!("Listening on {}", settings.server_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_store(settings: &Settings) -> Result<Arc<dyn ProcurementStore>> {
    match settings.storage_backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::Postgres => {
            let database_url = settings
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set")?;
            let pool = db::create_pool(settings, database_url).await?;
            if settings.run_migrations {
                db::run_migrations(&pool).await?;
            }
            Ok(Arc::new(PgStore::new(pool)))
        }
    }
}
