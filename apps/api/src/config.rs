use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_api_base: String,
    pub llm_timeout_secs: u64,
    /// Idle time after which an in-memory session is dropped.
    pub session_ttl_secs: u64,
    /// Language the grading feedback is written in (the teachers' own language).
    pub feedback_language: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            gemini_model: env_or("GEMINI_MODEL", "gemini-2.5-flash"),
            gemini_api_base: env_or(
                "GEMINI_API_BASE",
                "https://generativelanguage.googleapis.com/v1beta",
            ),
            llm_timeout_secs: env_or("LLM_TIMEOUT_SECS", "120")
                .parse::<u64>()
                .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?,
            session_ttl_secs: env_or("SESSION_TTL_SECS", "3600")
                .parse::<u64>()
                .context("SESSION_TTL_SECS must be a whole number of seconds")?,
            feedback_language: env_or("FEEDBACK_LANGUAGE", "Dutch"),
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
impl Config {
    /// Configuration used by handler tests; never talks to a real endpoint.
    pub fn for_tests() -> Self {
        Config {
            gemini_api_key: "test-key".to_string(),
            gemini_model: "gemini-test".to_string(),
            gemini_api_base: "http://127.0.0.1:9".to_string(),
            llm_timeout_secs: 1,
            session_ttl_secs: 60,
            feedback_language: "Dutch".to_string(),
            port: 0,
            rust_log: "debug".to_string(),
        }
    }
}
