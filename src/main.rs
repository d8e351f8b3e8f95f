use axum::http::HeaderValue;
use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod constants;
mod db;
mod error;
mod models;
mod services;
mod utils;

use config::Config;
use constants::API_VERSION;
use db::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tycoon_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!("Starting Tycoon Backend Server");
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("API Version: {}", API_VERSION);

    // Initialize database
    let db = Database::new(&config).await?;

    // Run migrations
    tracing::info!("Running database migrations...");
    db.run_migrations().await?;

    // Initialize Redis
    let redis = redis::Client::open(config.redis_url.clone())?;
    let redis_manager = redis::aio::ConnectionManager::new(redis).await?;

    let app_state = api::AppState {
        db: db.clone(),
        redis: redis_manager,
        config: config.clone(),
    };

    // Build router
    let app = build_router(app_state);

    // Start background services
    tokio::spawn(services::start_background_services(db.clone()));

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Invalid address");

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: api::AppState) -> Router {
    // CORS configuration
    let cors = cors_from_config(&state.config);

    Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        // Authentication
        .route("/api/v1/auth/register", post(api::auth::register))
        .route("/api/v1/auth/login", post(api::auth::login))
        .route("/api/v1/auth/refresh", post(api::auth::refresh_token))
        .route("/api/v1/auth/logout", post(api::auth::logout))
        // Users
        .route("/api/v1/users", post(api::users::create))
        .route("/api/v1/users", get(api::users::list))
        .route("/api/v1/users/{id}", get(api::users::get_one))
        .route("/api/v1/users/{id}", patch(api::users::update))
        .route("/api/v1/users/{id}", delete(api::users::remove))
        // Properties
        .route("/api/v1/properties", post(api::properties::create))
        .route("/api/v1/properties", get(api::properties::list))
        .route("/api/v1/properties/{id}", get(api::properties::get_one))
        .route(
            "/api/v1/properties/{id}/mortgage",
            patch(api::properties::toggle_mortgage),
        )
        .route(
            "/api/v1/properties/{id}/rent",
            patch(api::properties::update_rent_structure),
        )
        // Chance deck
        .route("/api/v1/chances", get(api::chance::list))
        .route("/api/v1/chances", post(api::chance::create))
        .route("/api/v1/chances/draw", get(api::chance::draw))
        // Community Chest deck
        .route("/api/v1/community-chest", get(api::community_chest::list))
        .route("/api/v1/community-chest", post(api::community_chest::create))
        .route(
            "/api/v1/community-chest/draw",
            get(api::community_chest::draw),
        )
        .route(
            "/api/v1/community-chest/{id}",
            get(api::community_chest::get_one),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_from_config(config: &Config) -> CorsLayer {
    let raw = config.cors_allowed_origins.trim();
    if raw.is_empty() || raw == "*" {
        return CorsLayer::very_permissive();
    }

    let allowed: Vec<HeaderValue> = raw
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<HeaderValue>().ok())
        .collect();

    if allowed.is_empty() {
        tracing::warn!("No valid CORS origins parsed; falling back to permissive");
        return CorsLayer::very_permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}
