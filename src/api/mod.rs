mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::auth::AuthKeys;
use crate::config::Config;
use crate::db::Database;
use crate::social_graph::SocialGraph;
use crate::storage::ProfileStore;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub profiles: Arc<dyn ProfileStore>,
    pub graph: Arc<SocialGraph>,
    pub auth: Arc<AuthKeys>,
    pub config: &'static Config,
}

/// Start the API server
pub async fn start_api_server(state: AppState) -> Result<()> {
    let config = state.config;

    // Set up CORS
    let cors = if config.server.enable_cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::permissive()
    };

    // Create router with all routes
    let app = Router::new()
        // General routes
        .route("/health", get(handlers::health::health_check))
        // Auth routes
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        // Profile routes
        .route("/api/profiles", post(handlers::profiles::create_profile))
        .route("/api/profiles/me", get(handlers::profiles::get_my_profiles))
        .route(
            "/api/profiles/current",
            get(handlers::profiles::get_current_profile),
        )
        .route(
            "/api/profiles/switch/:id",
            post(handlers::profiles::switch_profile),
        )
        .route(
            "/api/profiles/username/:username",
            get(handlers::profiles::get_profile_by_username),
        )
        .route(
            "/api/profiles/:id",
            get(handlers::profiles::get_profile).put(handlers::profiles::update_profile),
        )
        // Friend routes
        .route("/api/friends", get(handlers::friends::get_relationships))
        .route(
            "/api/friends/follow/:id",
            post(handlers::friends::follow_profile),
        )
        .route(
            "/api/friends/unfollow/:id",
            post(handlers::friends::unfollow_profile),
        )
        .route(
            "/api/friends/close/:id",
            post(handlers::friends::add_close_friend),
        )
        .route(
            "/api/friends/unclose/:id",
            post(handlers::friends::remove_close_friend),
        )
        // Post routes
        .route(
            "/api/posts",
            post(handlers::posts::create_post).get(handlers::posts::get_posts),
        )
        .route("/api/posts/:id/vote", post(handlers::posts::vote_post))
        .route(
            "/api/posts/:id/comments",
            get(handlers::comments::get_post_comments),
        )
        // Comment routes
        .route("/api/comments", post(handlers::comments::add_comment))
        // Community routes
        .route(
            "/api/communities",
            post(handlers::communities::create_community)
                .get(handlers::communities::get_communities),
        )
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Get bind address
    let addr = format!("{}:{}", config.server.host, config.server.port).parse::<SocketAddr>()?;

    // Start server
    info!("Starting API server on {}", addr);
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received, stopping API server");
}
