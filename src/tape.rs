//! Price Tape Builder - turns daily bars into a dense tick tape
//!
//! Each bar is flattened to four samples (open, high, low, close) and the
//! resulting series is resampled with piecewise-linear interpolation so a
//! month of daily data replays as a smooth intraday-looking stream.

use crate::error::{ReplayError, ReplayResult};
use crate::types::Bar;

/// Immutable, chronologically ordered tick prices
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceTape {
    prices: Vec<f64>,
}

impl PriceTape {
    /// Wrap an already built price sequence
    pub fn from_prices(prices: Vec<f64>) -> Self {
        Self { prices }
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.prices.get(index).copied()
    }

    pub fn last(&self) -> Option<f64> {
        self.prices.last().copied()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.prices
    }

    /// Truncate every price toward zero to whole currency units.
    ///
    /// Fails if a price drops to zero, which happens for instruments quoted
    /// below one unit; such a tape has no valid entry price.
    pub fn truncated(self) -> ReplayResult<Self> {
        let prices: Vec<f64> = self.prices.into_iter().map(f64::trunc).collect();
        if let Some(i) = prices.iter().position(|p| !(*p > 0.0)) {
            return Err(ReplayError::DataUnavailable(format!(
                "truncating to whole units zeroes tick {}; disable replay.truncate_prices",
                i
            )));
        }
        Ok(Self { prices })
    }
}

/// Flatten bars to `open, high, low, close` per bar, in bar order
pub fn flatten_bars(bars: &[Bar]) -> Vec<f64> {
    bars.iter().flat_map(|b| b.samples()).collect()
}

/// Build the tick tape from at least two bars.
///
/// The output has `4 * bars.len() * upsample_factor` points evenly spaced over
/// the raw sample positions `[0, M-1]`; the first and last points equal the
/// first open and the last close exactly.
pub fn build_tape(bars: &[Bar], upsample_factor: usize) -> ReplayResult<PriceTape> {
    if upsample_factor == 0 {
        return Err(ReplayError::InvalidState(
            "upsample factor must be at least 1".to_string(),
        ));
    }
    if bars.len() < 2 {
        return Err(ReplayError::DataUnavailable(format!(
            "need at least 2 bars to interpolate, got {}",
            bars.len()
        )));
    }
    if let Some((i, bar)) = bars.iter().enumerate().find(|(_, b)| !b.is_valid()) {
        return Err(ReplayError::DataUnavailable(format!(
            "bar {} ({}) has a non-positive or non-finite price",
            i, bar.date
        )));
    }

    let raw = flatten_bars(bars);
    Ok(PriceTape::from_prices(interpolate(
        &raw,
        raw.len() * upsample_factor,
    )))
}

/// Resample `raw` at `points` evenly spaced positions over `[0, raw.len()-1]`
fn interpolate(raw: &[f64], points: usize) -> Vec<f64> {
    let last = raw.len() - 1;
    if points == 1 {
        return vec![raw[0]];
    }

    (0..points)
        .map(|k| {
            // k * last is an exact integer, so the final point lands on `last` exactly
            let x = (k * last) as f64 / (points - 1) as f64;
            let i = x.floor() as usize;
            if i >= last {
                return raw[last];
            }
            let frac = x - i as f64;
            raw[i] + (raw[i + 1] - raw[i]) * frac
        })
        .collect()
}
