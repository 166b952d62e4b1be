//! Market data - daily bar sources for building the replay tape
//!
//! Bars are fetched once per session from Yahoo Finance or a local CSV file
//! and turned into a price tape. Fetch failures are reported, never retried.

mod csv_file;
mod yahoo;

pub use csv_file::{parse_bars, CsvBarSource};
pub use yahoo::{bars_from_chart, ChartResponse, YahooChartClient};

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::DataConfig;
use crate::error::{ReplayError, ReplayResult};
use crate::tape::{build_tape, PriceTape};
use crate::types::Bar;

/// Trait for daily bar providers
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BarSource: Send + Sync {
    /// Get the source name
    fn name(&self) -> &'static str;

    /// Fetch up to `lookback_days` most recent daily bars, oldest first
    async fn fetch_daily_bars(&self, ticker: &str, lookback_days: usize) -> Result<Vec<Bar>>;
}

/// Create the bar source selected by `data.provider`
pub fn source_from_config(cfg: &DataConfig) -> Result<Box<dyn BarSource>> {
    match cfg.provider.to_ascii_lowercase().as_str() {
        "yahoo" => Ok(Box::new(YahooChartClient::new(
            &cfg.yahoo_url,
            Duration::from_millis(cfg.request_timeout_ms),
        )?)),
        "csv" => Ok(Box::new(CsvBarSource::new(&cfg.csv_path))),
        other => bail!("Unknown data provider: {}", other),
    }
}

/// Fetch bars and build the session tape
pub async fn load_tape(
    source: &dyn BarSource,
    ticker: &str,
    lookback_days: usize,
    upsample_factor: usize,
) -> ReplayResult<PriceTape> {
    let bars = source
        .fetch_daily_bars(ticker, lookback_days)
        .await
        .map_err(|e| {
            warn!("{} fetch for {} failed: {:#}", source.name(), ticker, e);
            ReplayError::DataUnavailable(format!("{}: {:#}", source.name(), e))
        })?;

    info!(
        "📊 {} bars for {} from {} ({} → {})",
        bars.len(),
        ticker,
        source.name(),
        bars.first().map(|b| b.date.to_string()).unwrap_or_default(),
        bars.last().map(|b| b.date.to_string()).unwrap_or_default(),
    );

    let tape = build_tape(&bars, upsample_factor)?;
    info!(
        "🎞️ Tape built: {} ticks (x{} upsample)",
        tape.len(),
        upsample_factor
    );
    Ok(tape)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bars(n: u32) -> Vec<Bar> {
        (1..=n)
            .map(|d| {
                let base = 100.0 + d as f64;
                Bar::new(
                    NaiveDate::from_ymd_opt(2024, 5, d).unwrap(),
                    base,
                    base + 5.0,
                    base - 5.0,
                    base + 1.0,
                )
            })
            .collect()
    }

    #[test]
    fn test_load_tape_builds_from_source() {
        let mut source = MockBarSource::new();
        source.expect_name().return_const("mock");
        source
            .expect_fetch_daily_bars()
            .withf(|ticker, lookback| ticker == "005930.KS" && *lookback == 30)
            .times(1)
            .returning(|_, _| Ok(bars(3)));

        let tape = tokio_test::block_on(load_tape(&source, "005930.KS", 30, 8)).unwrap();
        assert_eq!(tape.len(), 3 * 4 * 8);
        assert_eq!(tape.get(0), Some(101.0));
        assert_eq!(tape.last(), Some(104.0));
    }

    #[test]
    fn test_fetch_failure_is_data_unavailable() {
        let mut source = MockBarSource::new();
        source.expect_name().return_const("mock");
        source
            .expect_fetch_daily_bars()
            .returning(|_, _| Err(anyhow::anyhow!("connection refused")));

        let err = tokio_test::block_on(load_tape(&source, "AAPL", 30, 8)).unwrap_err();
        match err {
            ReplayError::DataUnavailable(msg) => assert!(msg.contains("connection refused")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_single_bar_is_data_unavailable() {
        let mut source = MockBarSource::new();
        source.expect_name().return_const("mock");
        source
            .expect_fetch_daily_bars()
            .returning(|_, _| Ok(bars(1)));

        let err = tokio_test::block_on(load_tape(&source, "AAPL", 30, 8)).unwrap_err();
        assert!(matches!(err, ReplayError::DataUnavailable(_)));
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let cfg = DataConfig {
            provider: "bloomberg".to_string(),
            yahoo_url: "http://localhost".to_string(),
            csv_path: "bars.csv".to_string(),
            request_timeout_ms: 1000,
        };
        assert!(source_from_config(&cfg).is_err());
    }
}
