//! Configuration section types

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct InstrumentConfig {
    /// Ticker passed to the data provider (e.g. 005930.KS)
    pub ticker: String,
    /// Number of most recent daily bars to replay
    pub lookback_days: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// "yahoo" or "csv"
    pub provider: String,
    /// Yahoo Finance API base URL
    pub yahoo_url: String,
    /// Bar file used by the csv provider
    pub csv_path: String,
    /// HTTP request timeout in milliseconds
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplayConfig {
    /// Interpolated ticks per raw OHLC sample
    pub upsample_factor: usize,
    /// Wall-clock delay between ticks in milliseconds
    pub tick_interval_ms: u64,
    /// Publish a snapshot every Nth tick
    pub render_every: u64,
    /// Truncate tape prices to whole currency units
    pub truncate_prices: bool,
    /// Start replaying without waiting for a reset command
    pub auto_start: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    /// Currency label appended to prices
    pub currency: String,
    /// Number of recent prices drawn in the sparkline
    pub chart_width: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    pub level: String,
    /// Emit JSON log lines
    pub json: bool,
}
