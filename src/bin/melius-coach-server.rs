// ABOUTME: Server binary wiring configuration, storage, provider, and routes together
// ABOUTME: Composition root; all services are constructed once here and shared behind Arc
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Melius Coach Server Binary
//!
//! Starts the recovery-coach HTTP API: loads environment configuration,
//! opens the sqlite database, constructs the completion provider and coach
//! orchestrator, and serves the axum router until shutdown.

use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use melius_coach::auth::AuthManager;
use melius_coach::coach::{CoachService, JournalAnalyzer};
use melius_coach::config::ServerConfig;
use melius_coach::database::{init_schema, ConversationStore, SqliteConversationStore};
use melius_coach::llm::{CompletionProvider, OpenRouterProvider};
use melius_coach::logging::LoggingConfig;
use melius_coach::routes::{CoachRoutes, HealthRoutes, ServerResources};

#[tokio::main]
async fn main() -> Result<()> {
    LoggingConfig::from_env().init()?;

    let config = ServerConfig::from_env()?;

    let connect_options =
        SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(connect_options)
        .await?;
    init_schema(&pool).await?;
    info!("Database ready at {}", config.database_url);

    let provider: Arc<dyn CompletionProvider> =
        Arc::new(OpenRouterProvider::new(config.open_router.clone())?);
    let store: Arc<dyn ConversationStore> = Arc::new(SqliteConversationStore::new(pool));

    let coach = CoachService::new(
        Arc::clone(&provider),
        Arc::clone(&store),
        JournalAnalyzer::default(),
        config.open_router.generation.clone(),
        config.open_router.crisis_timeout_secs,
    );
    let auth = AuthManager::new(&config.jwt_secret);
    let resources = Arc::new(ServerResources::new(coach, store, provider, auth));

    let app = Router::new()
        .merge(HealthRoutes::routes())
        .merge(CoachRoutes::routes(resources))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.http_port)).await?;
    info!(
        "Melius coach server listening on port {} ({})",
        config.http_port, config.environment
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
}
