use anyhow::{Context, Result};

const DEFAULT_GEMINI_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";
const DEFAULT_TRENDS_API_URL: &str = "https://api.twitter.com/2/tweets/search/recent";
const DEFAULT_DATABASE_URL: &str = "sqlite://skillpath.db?mode=rwc";

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_api_url: String,
    pub llm_timeout_secs: u64,
    pub database_url: String,
    pub trends_api_url: String,
    /// Absent means the trends lookup serves the built-in sample report.
    pub trends_bearer_token: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            gemini_api_url: env_or("GEMINI_API_URL", DEFAULT_GEMINI_API_URL),
            llm_timeout_secs: env_or("LLM_TIMEOUT_SECS", "120")
                .parse::<u64>()
                .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?,
            database_url: env_or("DATABASE_URL", DEFAULT_DATABASE_URL),
            trends_api_url: env_or("TRENDS_API_URL", DEFAULT_TRENDS_API_URL),
            trends_bearer_token: std::env::var("TRENDS_BEARER_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
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
