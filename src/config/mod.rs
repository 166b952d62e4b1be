//! Configuration management for TapeReplay
//!
//! Loads defaults, optional config files and environment variables via .env

mod types;

pub use types::*;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub instrument: InstrumentConfig,
    pub data: DataConfig,
    pub replay: ReplayConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let config = Self::builder()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (TAPEREPLAY__REPLAY__TICK_INTERVAL_MS=...)
            .add_source(
                Environment::with_prefix("TAPEREPLAY")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .context("Failed to build configuration")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        Ok(app_config)
    }

    /// Built-in defaults only, ignoring files and environment
    pub fn defaults() -> Result<Self> {
        Self::builder()?
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        Ok(Config::builder()
            // Instrument defaults
            .set_default("instrument.ticker", "005930.KS")?
            .set_default("instrument.lookback_days", 30)?
            // Data defaults
            .set_default("data.provider", "yahoo")?
            .set_default("data.yahoo_url", "https://query1.finance.yahoo.com")?
            .set_default("data.csv_path", "./data/bars.csv")?
            .set_default("data.request_timeout_ms", 10_000)?
            // Replay defaults
            .set_default("replay.upsample_factor", 8)?
            .set_default("replay.tick_interval_ms", 10)?
            .set_default("replay.render_every", 1)?
            .set_default("replay.truncate_prices", true)?
            .set_default("replay.auto_start", false)?
            // Display defaults
            .set_default("display.currency", "KRW")?
            .set_default("display.chart_width", 60)?
            // Logging defaults
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?)
    }

    /// Reject settings the replay cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.instrument.ticker.trim().is_empty() {
            bail!("instrument.ticker must not be empty");
        }
        if self.instrument.lookback_days < 2 {
            bail!("instrument.lookback_days must be at least 2");
        }
        if self.replay.upsample_factor < 1 {
            bail!("replay.upsample_factor must be at least 1");
        }
        if self.replay.render_every < 1 {
            bail!("replay.render_every must be at least 1");
        }
        if self.replay.tick_interval_ms == 0 {
            bail!("replay.tick_interval_ms must be greater than 0");
        }
        match self.data.provider.to_ascii_lowercase().as_str() {
            "yahoo" | "csv" => {}
            other => bail!("data.provider must be yahoo or csv, got {}", other),
        }
        Ok(())
    }

    /// One-line summary for logging
    pub fn digest(&self) -> String {
        format!(
            "ticker={} days={} provider={} upsample=x{} tick={}ms render_every={} truncate={}",
            self.instrument.ticker,
            self.instrument.lookback_days,
            self.data.provider,
            self.replay.upsample_factor,
            self.replay.tick_interval_ms,
            self.replay.render_every,
            self.replay.truncate_prices
        )
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}
