//! Console dashboard and command input
//!
//! Renders replay snapshots as log lines (price, position, returns and a
//! sparkline of recent prices) and turns stdin lines into commands.

use std::io::BufRead;
use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};

use crate::config::DisplayConfig;
use crate::types::{Command, Position, Snapshot};

const SPARK_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

pub struct ConsoleRenderer {
    currency: String,
    chart_width: usize,
    snapshots: broadcast::Receiver<Snapshot>,
}

impl ConsoleRenderer {
    pub fn new(cfg: &DisplayConfig, snapshots: broadcast::Receiver<Snapshot>) -> Self {
        Self {
            currency: cfg.currency.clone(),
            chart_width: cfg.chart_width,
            snapshots,
        }
    }

    /// Render until the driver drops the snapshot channel
    pub async fn run(mut self) {
        loop {
            match self.snapshots.recv().await {
                Ok(snapshot) => info!(target: "dashboard", "{}", self.render(&snapshot)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Renderer lagging, skipped {} snapshots", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    /// One dashboard line for a snapshot
    pub fn render(&self, s: &Snapshot) -> String {
        let status = match s.position {
            Position::Flat => format!("{} 0.00%", s.position_label),
            Position::Open { .. } => {
                format!("{} {:+.2}%", s.position_label, s.unrealized_return_pct)
            }
        };
        let mut line = format!(
            "💹 {} {} | {} | Σ {:+.2}% | {}/{}",
            format_price(s.current_price),
            self.currency,
            status,
            s.cumulative_return_pct,
            s.cursor,
            s.length
        );
        let chart = sparkline(&s.tape_prefix, self.chart_width);
        if !chart.is_empty() {
            line.push_str(" | ");
            line.push_str(&chart);
        }
        if s.finished {
            line.push_str(" | END");
        }
        line
    }
}

/// Price with thousands separators; decimals only when the price has a fraction
pub fn format_price(price: f64) -> String {
    let negative = price < 0.0;
    let abs = price.abs();
    let text = if abs.fract() == 0.0 {
        format!("{:.0}", abs)
    } else {
        format!("{:.2}", abs)
    };
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3 + 4);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(f) = frac_part {
        grouped.push('.');
        grouped.push_str(f);
    }
    if negative {
        grouped.insert(0, '-');
    }
    grouped
}

/// Unicode sparkline of the last `width` prices
pub fn sparkline(prices: &[f64], width: usize) -> String {
    if width == 0 || prices.is_empty() {
        return String::new();
    }
    let window = &prices[prices.len().saturating_sub(width)..];
    let min = window.iter().copied().fold(f64::INFINITY, f64::min);
    let max = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;

    window
        .iter()
        .map(|p| {
            if span <= 0.0 {
                SPARK_CHARS[SPARK_CHARS.len() / 2]
            } else {
                let level = ((p - min) / span * (SPARK_CHARS.len() - 1) as f64).round() as usize;
                SPARK_CHARS[level.min(SPARK_CHARS.len() - 1)]
            }
        })
        .collect()
}

/// Forward parsed commands from `input` until EOF or the driver stops.
///
/// Blocking; run it on a dedicated thread, never inside the runtime.
pub fn forward_commands<R: BufRead>(
    input: R,
    commands: mpsc::Sender<Command>,
) -> std::io::Result<()> {
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<Command>() {
            Ok(cmd) => {
                if commands.blocking_send(cmd).is_err() {
                    break;
                }
            }
            Err(e) => warn!("{} (try long, short, close, reset)", e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Side;

    fn renderer() -> ConsoleRenderer {
        let (_tx, rx) = broadcast::channel(1);
        ConsoleRenderer::new(
            &DisplayConfig {
                currency: "KRW".to_string(),
                chart_width: 4,
            },
            rx,
        )
    }

    #[test]
    fn test_formats_thousands() {
        assert_eq!(format_price(73400.0), "73,400");
        assert_eq!(format_price(1234567.0), "1,234,567");
        assert_eq!(format_price(999.0), "999");
        assert_eq!(format_price(1234.5), "1,234.50");
    }

    #[test]
    fn test_sparkline_spans_range() {
        assert_eq!(sparkline(&[1.0, 2.0, 3.0, 8.0], 4), "▁▂▃█");
        assert_eq!(sparkline(&[5.0, 5.0], 4), "▅▅");
        assert_eq!(sparkline(&[0.0, 1.0, 2.0, 3.0, 4.0], 2), "▁█");
        assert_eq!(sparkline(&[], 4), "");
    }

    #[test]
    fn test_renders_waiting_and_open_positions() {
        let r = renderer();
        let mut snap = Snapshot {
            cursor: 3,
            length: 960,
            current_price: 73400.0,
            position: Position::Flat,
            position_label: Position::Flat.label().to_string(),
            unrealized_return_pct: 0.0,
            cumulative_return_pct: 1.5,
            tape_prefix: vec![1.0, 2.0, 3.0],
            finished: false,
        };
        let line = r.render(&snap);
        assert!(line.contains("73,400 KRW"));
        assert!(line.contains("WAITING 0.00%"));
        assert!(line.contains("+1.50%"));
        assert!(line.contains("3/960"));

        snap.position = Position::Open {
            side: Side::Short,
            entry_price: 71800.0,
        };
        snap.position_label = snap.position.label().to_string();
        snap.unrealized_return_pct = -2.25;
        snap.finished = true;
        let line = r.render(&snap);
        assert!(line.contains("SHORT -2.25%"));
        assert!(line.ends_with("END"));
    }

    #[test]
    fn test_forwards_known_commands() {
        let (tx, mut rx) = mpsc::channel(8);
        let input: &[u8] = b"long\n\nbogus\nCLOSE\nr\n";
        forward_commands(input, tx).unwrap();

        assert_eq!(rx.try_recv().unwrap(), Command::OpenLong);
        assert_eq!(rx.try_recv().unwrap(), Command::Close);
        assert_eq!(rx.try_recv().unwrap(), Command::Reset);
        assert!(rx.try_recv().is_err());
    }
}
