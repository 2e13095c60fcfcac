//! The day-by-day simulation loop.
//!
//! One pass over the union trading calendar. Each day, in order:
//!
//! 1. exits for every open position (stop > trend break > target),
//! 2. entries for flat symbols while capacity remains, lexicographically,
//! 3. one mark-to-market equity point.
//!
//! A symbol with no bar on the evaluation date is skipped for that day
//! only. The cancellation token is checked once per day; cancellation (and
//! normal end of period) force-closes everything at the last available
//! close. The loop itself is strictly single-threaded and touches no
//! shared state - two runs over the same inputs produce identical output.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::{EquityPoint, ExitReason, Ledger, OpenRejection, TradeRecord};
use crate::gate::{check_breakout, GateConfig, GateMode, TrendTemplate};
use crate::indicators::IndicatorSeries;

use super::calendar::trading_calendar;
use super::cancel::CancelToken;
use super::diagnostics::Diagnostics;
use super::exit::evaluate_exit;

/// Engine parameters for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub initial_capital: f64,
    pub max_positions: usize,
    /// Fraction of equity risked per trade.
    pub risk_per_trade: f64,
    /// Commission rate per leg.
    pub commission: f64,
    /// Profit target as a multiple of entry price. `None` disables the
    /// target exit entirely.
    pub target_multiple: Option<f64>,
    pub gate: GateConfig,
    pub mode: GateMode,
}

impl SimConfig {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            initial_capital: 100_000.0,
            max_positions: 5,
            risk_per_trade: 0.01,
            commission: 0.0,
            target_multiple: Some(1.25),
            gate: GateConfig::default(),
            mode: GateMode::Strict,
        }
    }
}

/// Everything a finished (or interrupted) run produced.
#[derive(Debug, Clone, Serialize)]
pub struct SimReport {
    /// Closed trades in close order.
    pub trades: Vec<TradeRecord>,
    /// One point per calendar day processed.
    pub equity_curve: Vec<EquityPoint>,
    pub diagnostics: Diagnostics,
    pub final_equity: f64,
    /// True when the run stopped early via the cancellation token.
    pub cancelled: bool,
    /// Set when a ledger invariant breach stopped the run. The trades,
    /// curve and diagnostics above are whatever had accumulated by then.
    pub aborted: Option<String>,
}

impl SimReport {
    pub fn is_partial(&self) -> bool {
        self.cancelled || self.aborted.is_some()
    }
}

/// Run the simulation over prepared series. `series` maps symbol to its
/// augmented series; `benchmark_dates` extends the calendar when a
/// benchmark is in play.
pub fn run_simulation(
    config: &SimConfig,
    series: &BTreeMap<String, IndicatorSeries>,
    benchmark_dates: &[NaiveDate],
    cancel: &CancelToken,
) -> SimReport {
    let mut diagnostics = Diagnostics::new();

    // Symbols too short to ever clear the history condition never enter
    // the loop.
    let mut active: BTreeMap<&str, &IndicatorSeries> = BTreeMap::new();
    for (symbol, s) in series {
        if s.len() < config.gate.min_history {
            diagnostics.record_exclusion(
                symbol.clone(),
                format!("insufficient history: {} bars, need {}", s.len(), config.gate.min_history),
            );
        } else {
            active.insert(symbol.as_str(), s);
        }
    }

    let calendar = trading_calendar(
        active.values().copied(),
        benchmark_dates,
        config.start,
        config.end,
    );

    let gate = TrendTemplate::new(config.gate.clone(), config.mode);
    let mut ledger = Ledger::new(config.initial_capital, config.max_positions, config.commission);
    let mut last_close: BTreeMap<String, f64> = BTreeMap::new();
    let mut cancelled = false;
    let mut aborted: Option<String> = None;
    let mut last_processed: Option<NaiveDate> = None;

    'days: for &date in &calendar {
        if cancel.is_cancelled() {
            cancelled = true;
            break;
        }

        // Phase 1: exits.
        for symbol in ledger.held_symbols() {
            let s = active[symbol.as_str()];
            let Some(t) = s.date_index(date) else {
                diagnostics.data_gap_skips += 1;
                continue;
            };
            let position = ledger
                .position(&symbol)
                .cloned();
            let Some(position) = position else { continue };
            if let Some(reason) = evaluate_exit(&position, s, t) {
                match ledger.close(&symbol, date, s.bars[t].close, reason) {
                    Ok(_) => diagnostics.trades_closed += 1,
                    Err(e) => {
                        aborted = Some(e.to_string());
                        break 'days;
                    }
                }
            }
        }

        // Phase 2: refresh carry-forward closes for marking and sizing.
        for (symbol, s) in &active {
            if let Some(t) = s.date_index(date) {
                last_close.insert((*symbol).to_string(), s.bars[t].close);
            }
        }
        let equity = ledger.mark_to_market(&last_close);

        // Phase 3: entries, lexicographic over flat symbols.
        let mut blocked_by_capacity = false;
        for (&symbol, &s) in &active {
            if ledger.has_position(symbol) {
                continue;
            }
            let Some(t) = s.date_index(date) else {
                diagnostics.data_gap_skips += 1;
                continue;
            };
            if !ledger.capacity_available() {
                blocked_by_capacity = true;
                continue;
            }

            let verdict = gate.evaluate(s, t);
            diagnostics.record_verdict(&verdict);
            if !verdict.eligible() {
                continue;
            }

            let Some(breakout) = check_breakout(s, t, &config.gate) else {
                diagnostics.breakout_rejections += 1;
                continue;
            };

            let entry_price = s.bars[t].close;
            let Some(shares) = Ledger::shares_for_risk(
                equity,
                config.risk_per_trade,
                entry_price,
                breakout.stop_price,
            ) else {
                diagnostics.invalid_risk += 1;
                continue;
            };
            if shares == 0 {
                diagnostics.insufficient_capital += 1;
                continue;
            }

            let target = config.target_multiple.map(|m| entry_price * m);
            match ledger.open(symbol, date, entry_price, shares, breakout.stop_price, target) {
                Ok(Ok(())) => diagnostics.trades_opened += 1,
                Ok(Err(OpenRejection::InsufficientCash | OpenRejection::ZeroShares)) => {
                    diagnostics.insufficient_capital += 1;
                }
                Ok(Err(OpenRejection::AtCapacity)) => blocked_by_capacity = true,
                Err(e) => {
                    aborted = Some(e.to_string());
                    break 'days;
                }
            }
        }
        if blocked_by_capacity {
            diagnostics.capacity_blocked += 1;
        }

        // Phase 4: one equity point per day.
        ledger.record_equity(date, &last_close);
        last_processed = Some(date);
    }

    // Close out whatever is still open at the last seen close. Skipped
    // after an accounting abort: the ledger is no longer trustworthy.
    if aborted.is_none() {
        if let Some(date) = last_processed {
            for symbol in ledger.held_symbols() {
                let price = last_close
                    .get(&symbol)
                    .copied()
                    .unwrap_or_else(|| ledger.position(&symbol).map(|p| p.entry_price).unwrap_or(0.0));
                match ledger.close(&symbol, date, price, ExitReason::EndOfPeriod) {
                    Ok(_) => diagnostics.trades_closed += 1,
                    Err(e) => {
                        aborted = Some(e.to_string());
                        break;
                    }
                }
            }
        }
    }

    let final_equity = ledger.mark_to_market(&last_close);
    SimReport {
        trades: ledger.closed_trades().to_vec(),
        equity_curve: ledger.equity_curve().to_vec(),
        diagnostics,
        final_equity,
        cancelled,
        aborted,
    }
}
