//! Open position record and exit taxonomy.
//!
//! A position is born OPEN (there is no half-built state: constructing one
//! requires entry date, entry price, share count and stop). Closing attaches
//! a `PositionExit` - the exit fields are all-or-nothing by construction.
//! The ledger archives a closed position as a `TradeRecord` and drops the
//! `Position`; re-entry into the same symbol creates a fresh one.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Why a position was closed. Ordering here mirrors same-day evaluation
/// priority: a bar that trips both the stop and the trend break records
/// `StopLoss`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TrendBreak,
    TargetReached,
    EndOfPeriod,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::StopLoss => "stop_loss",
            ExitReason::TrendBreak => "trend_break",
            ExitReason::TargetReached => "target_reached",
            ExitReason::EndOfPeriod => "end_of_period",
        }
    }
}

/// Exit block attached to a position when it closes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionExit {
    pub date: NaiveDate,
    pub price: f64,
    pub reason: ExitReason,
}

/// A live holding in one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub shares: u64,
    pub stop_price: f64,
    pub target_price: Option<f64>,
    exit: Option<PositionExit>,
}

impl Position {
    pub fn open(
        symbol: impl Into<String>,
        entry_date: NaiveDate,
        entry_price: f64,
        shares: u64,
        stop_price: f64,
        target_price: Option<f64>,
    ) -> Self {
        debug_assert!(shares > 0);
        debug_assert!(entry_price > 0.0);
        Self {
            symbol: symbol.into(),
            entry_date,
            entry_price,
            shares,
            stop_price,
            target_price,
            exit: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.exit.is_none()
    }

    pub fn exit(&self) -> Option<&PositionExit> {
        self.exit.as_ref()
    }

    /// Mark the position closed. A second close is a logic error and is
    /// ignored in release builds (the ledger never calls this twice).
    pub(crate) fn mark_closed(&mut self, date: NaiveDate, price: f64, reason: ExitReason) {
        debug_assert!(self.exit.is_none(), "position closed twice");
        self.exit = Some(PositionExit {
            date,
            price,
            reason,
        });
    }

    /// Current value at the given price.
    pub fn market_value(&self, price: f64) -> f64 {
        self.shares as f64 * price
    }

    /// Capital at risk per the initial stop, as a fraction of entry.
    pub fn initial_risk_pct(&self) -> f64 {
        (self.entry_price - self.stop_price) / self.entry_price
    }
}
