pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, ReviewSettings};
use crate::db::Database;
use crate::services::sessions::SessionRegistry;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub sessions: Arc<SessionRegistry>,
    pub review: Arc<ReviewSettings>,
}

impl AppState {
    pub fn new(db: Database, review: ReviewSettings, sessions: SessionRegistry) -> Self {
        Self {
            db: Arc::new(db),
            sessions: Arc::new(sessions),
            review: Arc::new(review),
        }
    }
}

/// Build the API router
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Word routes
        .route(
            "/api/users/:user_id/words",
            get(routes::words::list).post(routes::words::add),
        )
        .route(
            "/api/users/:user_id/words/:word_id",
            get(routes::words::get).delete(routes::words::remove),
        )
        // Flashcard routes
        .route(
            "/api/users/:user_id/flashcards/due",
            get(routes::flashcards::due),
        )
        .route(
            "/api/users/:user_id/flashcards/review",
            post(routes::flashcards::review),
        )
        // Stats routes
        .route(
            "/api/users/:user_id/vocabulary/stats",
            get(routes::stats::vocabulary),
        )
        // Session routes
        .route("/api/users/:user_id/sessions", post(routes::sessions::start))
        .route(
            "/api/sessions/:session_id",
            get(routes::sessions::get).delete(routes::sessions::end),
        )
        .route(
            "/api/sessions/:session_id/review",
            post(routes::sessions::review),
        );

    Router::new()
        .route("/health", get(health_check))
        .merge(api_routes)
        .with_state(state)
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url).await?;

    tracing::info!("Running migrations...");
    db.run_migrations().await?;

    let state = AppState::new(
        db,
        config.review.clone(),
        SessionRegistry::with_ttl(config.session_ttl),
    );

    let app = build_router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = config.bind_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
