//! Error types for tape building and replay

use thiserror::Error;

/// Failures surfaced by the tape builder and the replay engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReplayError {
    /// Bars could not be fetched, or too few usable bars came back.
    /// Fatal to session start; never retried here.
    #[error("market data unavailable: {0}")]
    DataUnavailable(String),

    /// A precondition was violated by the caller (empty tape, zero entry price, ...)
    #[error("invalid engine state: {0}")]
    InvalidState(String),
}

pub type ReplayResult<T> = std::result::Result<T, ReplayError>;
