use anyhow::{Context, Result};

const DEFAULT_FIRECRAWL_API_URL: &str = "https://api.firecrawl.dev";

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub firecrawl_api_key: String,
    pub firecrawl_api_url: String,
    /// Base URL of the external auth provider (sessions, sign-out).
    pub auth_url: String,
    pub login_path: String,
    pub extract_country: String,
    pub extract_languages: Vec<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            firecrawl_api_key: require_env("FIRECRAWL_API_KEY")?,
            firecrawl_api_url: std::env::var("FIRECRAWL_API_URL")
                .unwrap_or_else(|_| DEFAULT_FIRECRAWL_API_URL.to_string()),
            auth_url: require_env("AUTH_URL")?,
            login_path: std::env::var("LOGIN_PATH").unwrap_or_else(|_| "/login".to_string()),
            extract_country: std::env::var("EXTRACT_COUNTRY").unwrap_or_else(|_| "IN".to_string()),
            extract_languages: parse_languages(
                &std::env::var("EXTRACT_LANGUAGES").unwrap_or_else(|_| "en".to_string()),
            ),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Splits a comma-separated language list, dropping blanks. Falls back to `en`.
fn parse_languages(raw: &str) -> Vec<String> {
    let languages: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect();
    if languages.is_empty() {
        vec!["en".to_string()]
    } else {
        languages
    }
}
