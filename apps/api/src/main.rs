mod board;
mod config;
mod courses;
mod dashboard;
mod db;
mod errors;
mod llm_client;
mod models;
mod report;
mod routes;
mod state;
mod trends;
mod users;
mod wizard;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::{LlmClient, MemoizedModel};
use crate::routes::build_router;
use crate::state::AppState;
use crate::trends::TrendsClient;
use crate::wizard::session::SessionStore;

const TRENDS_TIMEOUT: Duration = Duration::from_secs(15);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting SkillPath API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize SQLite
    let db = create_pool(&config.database_url).await?;

    // Initialize the model client, memoized by prompt
    let llm = LlmClient::new(
        config.gemini_api_url.clone(),
        config.gemini_api_key.clone(),
        Duration::from_secs(config.llm_timeout_secs),
    )
    .context("Failed to build LLM client")?;
    info!("LLM client initialized (timeout: {}s)", config.llm_timeout_secs);

    let trends = TrendsClient::new(
        config.trends_api_url.clone(),
        config.trends_bearer_token.clone(),
        TRENDS_TIMEOUT,
    )
    .context("Failed to build trends client")?;
    if trends.is_live() {
        info!("Trends lookup enabled");
    } else {
        info!("TRENDS_BEARER_TOKEN not set, trends lookup will serve sample data");
    }

    let state = AppState {
        db,
        model: Arc::new(MemoizedModel::new(llm)),
        trends,
        sessions: SessionStore::new(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
