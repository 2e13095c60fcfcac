//! Completed trade record - the archived form of a closed position.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::position::ExitReason;

/// One closed round trip. Produced by the ledger when a position exits;
/// immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub symbol: String,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub exit_date: NaiveDate,
    pub exit_price: f64,
    pub shares: u64,
    pub exit_reason: ExitReason,
    /// Net of commission on both legs.
    pub realized_pnl: f64,
    pub realized_pnl_pct: f64,
    pub holding_days: i64,
}

impl TradeRecord {
    pub fn is_winner(&self) -> bool {
        self.realized_pnl > 0.0
    }
}
