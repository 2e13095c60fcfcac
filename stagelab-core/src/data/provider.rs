//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over data sources (CSV directories,
//! synthetic generators, anything else bolted on later) so the engine and
//! tests never care where bars came from. A fetch returns the complete
//! requested series or an explicit error - providers never silently
//! truncate.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Bar;

/// Whether a series' source timestamps carried timezone qualification.
///
/// The engine works in naive dates only; this tag exists so ingestion can
/// detect a universe where some sources are tz-qualified and some are not,
/// which would silently misalign days if mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampKind {
    Naive,
    Utc,
}

impl TimestampKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimestampKind::Naive => "naive",
            TimestampKind::Utc => "utc",
        }
    }
}

/// A fetched series plus the timezone qualification of its source.
#[derive(Debug, Clone)]
pub struct TaggedSeries {
    pub symbol: String,
    pub bars: Vec<Bar>,
    pub timestamps: TimestampKind,
}

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("series unavailable for '{symbol}': {reason}")]
    Unavailable { symbol: String, reason: String },

    #[error("malformed series for '{symbol}': {reason}")]
    Malformed { symbol: String, reason: String },

    #[error(
        "timezone qualification mismatch: '{first_symbol}' is {first_kind} \
         but '{symbol}' is {kind}"
    )]
    TimezoneMismatch {
        first_symbol: String,
        first_kind: &'static str,
        symbol: String,
        kind: &'static str,
    },

    #[error("dates out of order in '{symbol}' at {date}")]
    UnorderedDates { symbol: String, date: NaiveDate },
}

/// Trait for daily-bar data sources.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily OHLCV bars for a symbol over a date range (inclusive).
    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<TaggedSeries, DataError>;
}
