use anyhow::Result;
use dotenv::dotenv;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use onionpost_api::api::{self, AppState};
use onionpost_api::auth::AuthKeys;
use onionpost_api::config::Config;
use onionpost_api::db::init_database;
use onionpost_api::onion::VisibilityEngine;
use onionpost_api::social_graph::SocialGraph;
use onionpost_api::storage::postgres::PgProfileStore;
use onionpost_api::storage::ProfileStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if present
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,onionpost_api=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::init()?;
    info!("Initialized configuration");

    // Initialize database
    let db = Arc::new(init_database(&config.database).await?);
    info!("Connected to database");

    // Wire the profile store, visibility engine and social graph
    let profiles: Arc<dyn ProfileStore> = Arc::new(PgProfileStore::new(db.clone()));
    let engine = VisibilityEngine::new(config.visibility.fallback_policy.clone());
    let graph = Arc::new(SocialGraph::new(profiles.clone(), engine));
    let auth = Arc::new(AuthKeys::from_config(&config.auth));

    let state = AppState {
        db,
        profiles,
        graph,
        auth,
        config,
    };

    api::start_api_server(state).await?;

    info!("OnionPost API shutdown complete");
    Ok(())
}
