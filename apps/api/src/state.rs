use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::GenerativeModel;
use crate::wizard::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Generative model backend. Gemini in production, scripted in tests.
    pub model: Arc<dyn GenerativeModel>,
    pub sessions: SessionStore,
    pub config: Config,
}
