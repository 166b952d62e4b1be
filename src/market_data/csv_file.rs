//! Local CSV bar source
//!
//! Expects a header row with at least `date,open,high,low,close`
//! (extra columns such as volume are ignored).

use anyhow::{Context, Result};
use async_trait::async_trait;
use csv::ReaderBuilder;
use std::io::Read;
use std::path::PathBuf;

use super::BarSource;
use crate::types::Bar;

pub struct CsvBarSource {
    path: PathBuf,
}

impl CsvBarSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl BarSource for CsvBarSource {
    fn name(&self) -> &'static str {
        "csv"
    }

    /// The ticker is informational; the file holds a single instrument
    async fn fetch_daily_bars(&self, _ticker: &str, lookback_days: usize) -> Result<Vec<Bar>> {
        let data = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("Failed to read {}", self.path.display()))?;

        let mut bars = parse_bars(data.as_slice())?;
        if bars.len() > lookback_days {
            bars.drain(..bars.len() - lookback_days);
        }
        Ok(bars)
    }
}

/// Parse bars from CSV, sorted by date
pub fn parse_bars<R: Read>(reader: R) -> Result<Vec<Bar>> {
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut bars = Vec::new();
    for (line, record) in rdr.deserialize::<Bar>().enumerate() {
        // +2: header row and 1-based numbering
        let bar = record.with_context(|| format!("Invalid bar on line {}", line + 2))?;
        bars.push(bar);
    }
    bars.sort_by_key(|b| b.date);

    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_and_sorts_rows() {
        let csv = "date,open,high,low,close,volume\n\
                   2024-03-05,73500,74100,73000,73600,100\n\
                   2024-03-04,73000,74000,72500,73400,200\n";
        let bars = parse_bars(csv.as_bytes()).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date.to_string(), "2024-03-04");
        assert_eq!(bars[0].high, 74000.0);
        assert_eq!(bars[1].close, 73600.0);
    }

    #[test]
    fn test_reports_bad_rows() {
        let csv = "date,open,high,low,close\n2024-03-04,abc,1,1,1\n";
        let err = parse_bars(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let source = CsvBarSource::new("/nonexistent/bars.csv");
        let res = tokio_test::block_on(source.fetch_daily_bars("X", 30));
        assert!(res.is_err());
    }
}
