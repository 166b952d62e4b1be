//! Core types used throughout TapeReplay
//!
//! Defines bars, position sides, user commands, closed trades and the
//! per-tick snapshot handed to the presentation layer.

use chrono::NaiveDate;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// One trading day of OHLC prices
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Bar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
        }
    }

    /// Prices in tape order: open, high, low, close
    pub fn samples(&self) -> [f64; 4] {
        [self.open, self.high, self.low, self.close]
    }

    /// All four prices are finite and strictly positive
    pub fn is_valid(&self) -> bool {
        self.samples().iter().all(|p| p.is_finite() && *p > 0.0)
    }
}

/// Trading direction of an open position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// Percentage return of a trade on this side.
    ///
    /// A short flips the sign so a falling price is a profit.
    pub fn return_pct(&self, entry_price: f64, exit_price: f64) -> f64 {
        let diff = exit_price - entry_price;
        match self {
            Side::Long => diff / entry_price * 100.0,
            Side::Short => -diff / entry_price * 100.0,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "LONG"),
            Side::Short => write!(f, "SHORT"),
        }
    }
}

/// The single position a session may hold
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Position {
    #[default]
    Flat,
    Open { side: Side, entry_price: f64 },
}

impl Position {
    pub fn side(&self) -> Option<Side> {
        match self {
            Position::Flat => None,
            Position::Open { side, .. } => Some(*side),
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Position::Open { .. })
    }

    /// Label shown by the dashboard
    pub fn label(&self) -> &'static str {
        match self {
            Position::Flat => "WAITING",
            Position::Open {
                side: Side::Long, ..
            } => "LONG",
            Position::Open {
                side: Side::Short,
                ..
            } => "SHORT",
        }
    }
}

/// User-triggered commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    OpenLong,
    OpenShort,
    Close,
    /// Rewind the tape, clear the position and start replaying
    Reset,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "long" | "l" | "buy" => Ok(Command::OpenLong),
            "short" | "s" | "sell" => Ok(Command::OpenShort),
            "close" | "c" | "flat" => Ok(Command::Close),
            "reset" | "r" | "start" => Ok(Command::Reset),
            other => anyhow::bail!("Unknown command: {:?}", other),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::OpenLong => write!(f, "LONG"),
            Command::OpenShort => write!(f, "SHORT"),
            Command::Close => write!(f, "CLOSE"),
            Command::Reset => write!(f, "RESET"),
        }
    }
}

/// A trade realized by an explicit or implicit close
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosedTrade {
    pub side: Side,
    pub entry_price: f64,
    pub exit_price: f64,
    /// Signed percentage return added to the cumulative total
    pub return_pct: f64,
    /// Tape index at which the trade closed
    pub cursor: usize,
}

/// State pushed to the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub cursor: usize,
    pub length: usize,
    pub current_price: f64,
    pub position: Position,
    pub position_label: String,
    pub unrealized_return_pct: f64,
    pub cumulative_return_pct: f64,
    /// Prices replayed so far (`tape[..cursor]`)
    pub tape_prefix: Vec<f64>,
    /// Replay reached the end of the tape
    pub finished: bool,
}
