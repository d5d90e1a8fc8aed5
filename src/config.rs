use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// Batch translation endpoint URL
    pub translate_api_url: String,

    /// Optional bearer token for the translation service
    pub translate_api_key: Option<String>,

    /// Language code selected when the caller provides none
    pub default_language: String,

    /// Timeout applied to each batch request, in seconds
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            translate_api_url: std::env::var("TRANSLATE_API_URL")
                .context("TRANSLATE_API_URL not set")?,
            translate_api_key: std::env::var("TRANSLATE_API_KEY").ok(),
            default_language: std::env::var("DEFAULT_LANGUAGE")
                .unwrap_or_else(|_| "en".to_string()),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
        })
    }
}
