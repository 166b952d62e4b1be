//! Yahoo Finance chart client
//!
//! Pulls daily OHLC bars from the public v8 chart endpoint.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::BarSource;
use crate::types::Bar;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; tapereplay/0.1)";

/// Client for `/v8/finance/chart/{ticker}`
pub struct YahooChartClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartResponse {
    pub chart: ChartEnvelope,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartEnvelope {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<ChartError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartError {
    pub code: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartResult {
    /// Bar timestamps in seconds
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: ChartIndicators,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartIndicators {
    pub quote: Vec<QuoteSeries>,
}

/// Parallel OHLC arrays; `null` on days without trading
#[derive(Debug, Clone, Deserialize, Default)]
pub struct QuoteSeries {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
}

impl YahooChartClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl BarSource for YahooChartClient {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch_daily_bars(&self, ticker: &str, lookback_days: usize) -> Result<Vec<Bar>> {
        // Calendar window wide enough to cover weekends and holidays
        let now = Utc::now();
        let from = now - ChronoDuration::days(lookback_days as i64 * 2 + 10);
        let url = format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d",
            self.base_url,
            ticker,
            from.timestamp(),
            now.timestamp()
        );
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("Yahoo chart API returned {} for {}", status, ticker);
        }

        let chart: ChartResponse = response
            .json()
            .await
            .context("Failed to decode chart response")?;

        bars_from_chart(&chart, lookback_days)
    }
}

/// Extract complete daily bars from a chart response, keeping the last `lookback_days`
pub fn bars_from_chart(chart: &ChartResponse, lookback_days: usize) -> Result<Vec<Bar>> {
    if let Some(err) = &chart.chart.error {
        bail!("Yahoo chart error {}: {}", err.code, err.description);
    }

    let result = chart
        .chart
        .result
        .as_ref()
        .and_then(|r| r.first())
        .context("Chart response has no result")?;
    let quote = result
        .indicators
        .quote
        .first()
        .context("Chart response has no quote series")?;

    let mut bars: Vec<Bar> = result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, ts)| {
            let date = DateTime::<Utc>::from_timestamp(*ts, 0)?.date_naive();
            Some(Bar::new(
                date,
                (*quote.open.get(i)?)?,
                (*quote.high.get(i)?)?,
                (*quote.low.get(i)?)?,
                (*quote.close.get(i)?)?,
            ))
        })
        .collect();

    if bars.len() > lookback_days {
        bars.drain(..bars.len() - lookback_days);
    }
    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHART_JSON: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"symbol": "005930.KS", "currency": "KRW"},
                "timestamp": [1709510400, 1709596800, 1709683200, 1709769600],
                "indicators": {
                    "quote": [{
                        "open":  [73000.0, 73500.0, null, 72800.0],
                        "high":  [74000.0, 74100.0, null, 73900.0],
                        "low":   [72500.0, 73000.0, null, 72100.0],
                        "close": [73400.0, 73600.0, null, 73100.0],
                        "volume": [1, 2, null, 3]
                    }]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn test_skips_days_with_missing_prices() {
        let chart: ChartResponse = serde_json::from_str(CHART_JSON).unwrap();
        let bars = bars_from_chart(&chart, 30).unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].open, 73000.0);
        assert_eq!(bars[2].close, 73100.0);
        assert_eq!(bars[0].date.to_string(), "2024-03-04");
    }

    #[test]
    fn test_keeps_most_recent_bars() {
        let chart: ChartResponse = serde_json::from_str(CHART_JSON).unwrap();
        let bars = bars_from_chart(&chart, 2).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].open, 73500.0);
        assert_eq!(bars[1].open, 72800.0);
    }

    #[test]
    fn test_surfaces_api_error() {
        let json = r#"{"chart": {"result": null,
            "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}}"#;
        let chart: ChartResponse = serde_json::from_str(json).unwrap();
        let err = bars_from_chart(&chart, 30).unwrap_err();
        assert!(err.to_string().contains("Not Found"));
    }
}
