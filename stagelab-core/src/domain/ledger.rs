//! Portfolio ledger - cash, open positions, equity curve.
//!
//! The ledger is the single owner of portfolio state. Expected, non-fatal
//! entry rejections (`OpenRejection`) are a different type from invariant
//! breaches (`LedgerError`): the first is normal trading flow, the second
//! means the caller has a bug and the run must stop.
//!
//! Invariants held at all times:
//! - open position count ≤ `max_positions`
//! - cash never goes negative
//! - at every recorded equity point, equity == cash + Σ shares × price

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use super::position::{ExitReason, Position};
use super::trade::TradeRecord;

/// Fatal accounting errors. Any of these aborts the run that produced it.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("no open position in '{symbol}' to close on {date}")]
    UnknownPosition { symbol: String, date: NaiveDate },

    #[error("duplicate open in '{symbol}' on {date}: position already held")]
    DuplicatePosition { symbol: String, date: NaiveDate },

    #[error("cash went negative ({cash:.2}) closing '{symbol}' on {date}")]
    NegativeCash {
        symbol: String,
        date: NaiveDate,
        cash: f64,
    },
}

/// Expected reasons an entry does not happen. These are counted in
/// diagnostics, never propagated as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenRejection {
    /// Book already holds `max_positions`.
    AtCapacity,
    /// Cost of the entry exceeds available cash.
    InsufficientCash,
    /// Sizing produced zero shares.
    ZeroShares,
}

/// One point on the equity curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

/// Portfolio state for one simulation run.
#[derive(Debug, Clone)]
pub struct Ledger {
    cash: f64,
    initial_capital: f64,
    max_positions: usize,
    /// Commission rate applied to notional on both entry and exit.
    commission: f64,
    /// BTreeMap so iteration over holdings is always lexicographic.
    open_positions: BTreeMap<String, Position>,
    closed_trades: Vec<TradeRecord>,
    equity_curve: Vec<EquityPoint>,
}

impl Ledger {
    pub fn new(initial_capital: f64, max_positions: usize, commission: f64) -> Self {
        Self {
            cash: initial_capital,
            initial_capital,
            max_positions,
            commission,
            open_positions: BTreeMap::new(),
            closed_trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    pub fn open_count(&self) -> usize {
        self.open_positions.len()
    }

    pub fn capacity_available(&self) -> bool {
        self.open_positions.len() < self.max_positions
    }

    pub fn has_position(&self, symbol: &str) -> bool {
        self.open_positions.contains_key(symbol)
    }

    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.open_positions.get(symbol)
    }

    /// Symbols currently held, in lexicographic order.
    pub fn held_symbols(&self) -> Vec<String> {
        self.open_positions.keys().cloned().collect()
    }

    pub fn closed_trades(&self) -> &[TradeRecord] {
        &self.closed_trades
    }

    pub fn equity_curve(&self) -> &[EquityPoint] {
        &self.equity_curve
    }

    /// Shares for a fixed-fractional-risk entry:
    /// floor(equity × risk_fraction / (entry − stop)). Returns `None` when
    /// entry ≤ stop (the candidate must be rejected before touching cash).
    pub fn shares_for_risk(
        equity: f64,
        risk_fraction: f64,
        entry_price: f64,
        stop_price: f64,
    ) -> Option<u64> {
        let per_share_risk = entry_price - stop_price;
        if per_share_risk <= 0.0 || entry_price <= 0.0 {
            return None;
        }
        let risk_amount = equity * risk_fraction;
        Some((risk_amount / per_share_risk).floor() as u64)
    }

    /// Open a new position, debiting cash (cost plus entry commission).
    pub fn open(
        &mut self,
        symbol: &str,
        date: NaiveDate,
        entry_price: f64,
        shares: u64,
        stop_price: f64,
        target_price: Option<f64>,
    ) -> Result<Result<(), OpenRejection>, LedgerError> {
        if self.open_positions.contains_key(symbol) {
            return Err(LedgerError::DuplicatePosition {
                symbol: symbol.to_string(),
                date,
            });
        }
        if !self.capacity_available() {
            return Ok(Err(OpenRejection::AtCapacity));
        }
        if shares == 0 {
            return Ok(Err(OpenRejection::ZeroShares));
        }

        let cost = shares as f64 * entry_price * (1.0 + self.commission);
        if cost > self.cash {
            return Ok(Err(OpenRejection::InsufficientCash));
        }

        self.cash -= cost;
        self.open_positions.insert(
            symbol.to_string(),
            Position::open(symbol, date, entry_price, shares, stop_price, target_price),
        );
        Ok(Ok(()))
    }

    /// Close an open position at the given price, crediting cash (proceeds
    /// minus exit commission) and archiving the trade.
    pub fn close(
        &mut self,
        symbol: &str,
        date: NaiveDate,
        price: f64,
        reason: ExitReason,
    ) -> Result<TradeRecord, LedgerError> {
        let mut position =
            self.open_positions
                .remove(symbol)
                .ok_or_else(|| LedgerError::UnknownPosition {
                    symbol: symbol.to_string(),
                    date,
                })?;

        position.mark_closed(date, price, reason);

        let proceeds = position.shares as f64 * price * (1.0 - self.commission);
        self.cash += proceeds;
        if self.cash < 0.0 {
            return Err(LedgerError::NegativeCash {
                symbol: symbol.to_string(),
                date,
                cash: self.cash,
            });
        }

        let entry_notional = position.shares as f64 * position.entry_price;
        let cost = entry_notional * (1.0 + self.commission);
        let realized_pnl = proceeds - cost;
        let trade = TradeRecord {
            symbol: position.symbol.clone(),
            entry_date: position.entry_date,
            entry_price: position.entry_price,
            exit_date: date,
            exit_price: price,
            shares: position.shares,
            exit_reason: reason,
            realized_pnl,
            realized_pnl_pct: realized_pnl / cost,
            holding_days: (date - position.entry_date).num_days(),
        };
        self.closed_trades.push(trade.clone());
        Ok(trade)
    }

    /// Total equity at the given prices: cash plus marked value of every
    /// open position. Missing prices fall back to entry price (the engine
    /// passes a carry-forward price map, so this only happens on the very
    /// first day of a gap-ridden series).
    pub fn mark_to_market(&self, prices: &BTreeMap<String, f64>) -> f64 {
        let positions_value: f64 = self
            .open_positions
            .values()
            .map(|p| p.market_value(*prices.get(&p.symbol).unwrap_or(&p.entry_price)))
            .sum();
        self.cash + positions_value
    }

    /// Append one equity point for the day.
    pub fn record_equity(&mut self, date: NaiveDate, prices: &BTreeMap<String, f64>) {
        let equity = self.mark_to_market(prices);
        debug_assert!(
            {
                let positions: f64 = self
                    .open_positions
                    .values()
                    .map(|p| p.market_value(*prices.get(&p.symbol).unwrap_or(&p.entry_price)))
                    .sum();
                (equity - (self.cash + positions)).abs() <= 1e-6 * equity.abs().max(1.0)
            },
            "equity identity violated on {date}"
        );
        self.equity_curve.push(EquityPoint { date, equity });
    }
}
