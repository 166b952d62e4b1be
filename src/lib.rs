//! TapeReplay Library
//!
//! Replays a month of daily OHLC bars as an accelerated tick tape and
//! simulates switching long/short positions against it

pub mod config;
pub mod console;
pub mod engine;
pub mod error;
pub mod market_data;
pub mod replay;
pub mod tape;
pub mod types;

pub use engine::{ReplayEngine, TickOutcome};
pub use error::{ReplayError, ReplayResult};
pub use tape::{build_tape, PriceTape};
