use anyhow::{Context, Result};

use crate::pipeline::BandThresholds;

/// Application configuration loaded from environment variables.
/// Panics at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub data_dir: String,
    pub port: u16,
    pub rust_log: String,
    /// Density-band boundaries for the shaping pipeline; overridable because
    /// they are tuned to one template's metrics, not invariants.
    pub band_thresholds: BandThresholds,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = BandThresholds::default();
        Ok(Config {
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "data/versions".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            band_thresholds: BandThresholds {
                short_below: optional_usize("BAND_SHORT_BELOW", defaults.short_below)?,
                long_at: optional_usize("BAND_LONG_AT", defaults.long_at)?,
            },
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_usize(key: &str, default: usize) -> Result<usize> {
    match std::env::var(key) {
        Ok(v) => v
            .parse::<usize>()
            .with_context(|| format!("'{key}' must be a non-negative integer")),
        Err(_) => Ok(default),
    }
}
