use anyhow::{bail, Context, Result};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: String,

    // OpenAI
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_api_url: String,
    pub openai_temperature: f32,

    // Provider limits
    pub provider_max_concurrency: usize,
    pub provider_timeout: Duration,

    // Storage (in-memory when unset)
    pub database_url: Option<String>,

    // HTTP
    pub api_key: Option<String>,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let provider_max_concurrency: usize = parse_var("PROVIDER_MAX_CONCURRENCY", 8)?;
        if provider_max_concurrency == 0 {
            bail!("PROVIDER_MAX_CONCURRENCY must be at least 1");
        }

        Ok(Self {
            environment: std::env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),

            // OpenAI
            openai_api_key: std::env::var("OPENAI_API_KEY")
                .context("OPENAI_API_KEY not set")?,
            openai_model: std::env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            openai_api_url: std::env::var("OPENAI_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1/chat/completions".to_string()),
            openai_temperature: parse_var("OPENAI_TEMPERATURE", 0.3)?,

            // Provider limits
            provider_max_concurrency,
            provider_timeout: Duration::from_secs(parse_var("PROVIDER_TIMEOUT_SECS", 20)?),

            // Storage
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),

            // HTTP
            api_key: std::env::var("API_KEY").ok().filter(|key| !key.is_empty()),
            port: parse_var("PORT", 8080)?,
        })
    }
}

/// Read an optional variable, falling back to `default` when unset.
/// A value that is set but unparsable is an error.
fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid {} value '{}': {}", name, raw, e)),
        Err(_) => Ok(default),
    }
}
