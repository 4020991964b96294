mod config;
mod errors;
mod layout;
mod lessons;
mod llm_client;
mod models;
mod routes;
mod state;
mod wizard;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::{GeminiClient, GenerativeModel};
use crate::routes::build_router;
use crate::state::AppState;
use crate::wizard::SessionStore;

/// Upper bound on how often idle sessions are swept.
const SWEEP_PERIOD: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging. The tracing target uses the crate name,
    // which has `_` where the package name has `-`.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Lesson API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the generative model
    let model = GeminiClient::new(
        config.gemini_api_key.clone(),
        config.gemini_api_base.clone(),
        config.gemini_model.clone(),
        Duration::from_secs(config.llm_timeout_secs),
    )?;
    info!(
        "LLM client initialized (model: {}, timeout: {}s)",
        model.model_name(),
        config.llm_timeout_secs
    );

    // Initialize the session store and its idle sweeper
    let session_ttl = Duration::from_secs(config.session_ttl_secs);
    let sessions = SessionStore::with_ttl(session_ttl);
    sessions.spawn_sweeper(session_ttl.clamp(Duration::from_secs(1), SWEEP_PERIOD));
    info!("Sessions expire after {}s idle", config.session_ttl_secs);

    // Build app state
    let state = AppState {
        model: Arc::new(model),
        sessions,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
