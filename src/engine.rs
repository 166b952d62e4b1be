//! Replay & Position Engine
//!
//! Holds a cursor into the price tape, the single open position and the
//! cumulative realized return. Opening a side while another is open closes
//! the existing one first (switching, never stacking).
//!
//! Every operation computes everything that can fail before it mutates, so a
//! failed call leaves the engine exactly as it was.

use tracing::{debug, info};

use crate::error::{ReplayError, ReplayResult};
use crate::tape::PriceTape;
use crate::types::{ClosedTrade, Position, Side, Snapshot};

/// Result of a single `tick()`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Cursor advanced past `price`
    Advanced { price: f64 },
    /// Running flag is off; nothing moved
    Paused,
    /// Cursor already at the end of the tape
    EndOfTape,
}

/// Session state for one replay
#[derive(Debug, Clone)]
pub struct ReplayEngine {
    tape: PriceTape,
    cursor: usize,
    position: Position,
    cumulative_return: f64,
    running: bool,
}

impl ReplayEngine {
    pub fn new(tape: PriceTape) -> Self {
        Self {
            tape,
            cursor: 0,
            position: Position::Flat,
            cumulative_return: 0.0,
            running: false,
        }
    }

    pub fn tape(&self) -> &PriceTape {
        &self.tape
    }

    pub fn len(&self) -> usize {
        self.tape.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Sum of percentage returns of all closed trades
    pub fn cumulative_return(&self) -> f64 {
        self.cumulative_return
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.tape.len()
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Advance the cursor by one tick
    pub fn tick(&mut self) -> ReplayResult<TickOutcome> {
        if self.tape.is_empty() {
            return Err(ReplayError::InvalidState(
                "cannot tick an empty tape".to_string(),
            ));
        }
        if !self.running {
            return Ok(TickOutcome::Paused);
        }
        match self.tape.get(self.cursor) {
            Some(price) => {
                self.cursor += 1;
                Ok(TickOutcome::Advanced { price })
            }
            None => Ok(TickOutcome::EndOfTape),
        }
    }

    /// Price at the cursor, or the last price once the tape is exhausted
    pub fn current_price(&self) -> ReplayResult<f64> {
        self.tape
            .get(self.cursor)
            .or_else(|| self.tape.last())
            .ok_or_else(|| ReplayError::InvalidState("price tape is empty".to_string()))
    }

    /// Percentage return of the open position at the current price
    pub fn unrealized_return(&self) -> ReplayResult<f64> {
        match self.position {
            Position::Flat => Ok(0.0),
            Position::Open { side, entry_price } => {
                Self::trade_return(side, entry_price, self.current_price()?)
            }
        }
    }

    /// Open `side` at the current price, closing any open position first
    pub fn open(&mut self, side: Side) -> ReplayResult<Option<ClosedTrade>> {
        let price = self.current_price()?;
        if !(price > 0.0) {
            return Err(ReplayError::InvalidState(format!(
                "cannot open {} at non-positive price {}",
                side, price
            )));
        }
        let realized = self.realize(price)?;

        if let Some(trade) = realized {
            self.cumulative_return += trade.return_pct;
            info!(
                "🔁 Switch {} → {} @ {:.2} | realized {:+.2}% | total {:+.2}%",
                trade.side, side, price, trade.return_pct, self.cumulative_return
            );
        }
        self.position = Position::Open {
            side,
            entry_price: price,
        };
        debug!("Opened {} @ {:.2} (cursor {})", side, price, self.cursor);

        Ok(realized)
    }

    /// Close the open position at the current price; no-op when flat
    pub fn close(&mut self) -> ReplayResult<Option<ClosedTrade>> {
        if !self.position.is_open() {
            return Ok(None);
        }
        let price = self.current_price()?;
        let realized = self.realize(price)?;

        if let Some(trade) = realized {
            self.cumulative_return += trade.return_pct;
            self.position = Position::Flat;
            info!(
                "✅ Closed {} {:.2} → {:.2} | {:+.2}% | total {:+.2}%",
                trade.side, trade.entry_price, trade.exit_price, trade.return_pct,
                self.cumulative_return
            );
        }

        Ok(realized)
    }

    /// Rewind to the start of the tape and clear all trading state.
    /// The tape itself is kept.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.position = Position::Flat;
        self.cumulative_return = 0.0;
    }

    /// Snapshot for the presentation layer
    pub fn snapshot(&self) -> ReplayResult<Snapshot> {
        let seen = self.cursor.min(self.tape.len());
        Ok(Snapshot {
            cursor: self.cursor,
            length: self.tape.len(),
            current_price: self.current_price()?,
            position: self.position,
            position_label: self.position.label().to_string(),
            unrealized_return_pct: self.unrealized_return()?,
            cumulative_return_pct: self.cumulative_return,
            tape_prefix: self.tape.as_slice()[..seen].to_vec(),
            finished: self.is_finished(),
        })
    }

    /// Trade that closing at `exit_price` would realize, without mutating
    fn realize(&self, exit_price: f64) -> ReplayResult<Option<ClosedTrade>> {
        match self.position {
            Position::Flat => Ok(None),
            Position::Open { side, entry_price } => Ok(Some(ClosedTrade {
                side,
                entry_price,
                exit_price,
                return_pct: Self::trade_return(side, entry_price, exit_price)?,
                cursor: self.cursor,
            })),
        }
    }

    fn trade_return(side: Side, entry_price: f64, exit_price: f64) -> ReplayResult<f64> {
        if !(entry_price > 0.0) {
            return Err(ReplayError::InvalidState(format!(
                "entry price must be positive, got {}",
                entry_price
            )));
        }
        Ok(side.return_pct(entry_price, exit_price))
    }
}
