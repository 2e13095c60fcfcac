//! Performance metrics over an equity curve and a closed-trade tape.
//!
//! Every metric is a pure function; `PerformanceMetrics::compute` bundles
//! them into the struct that ships in reports. All ratios use a 252-day
//! trading year and return 0.0 when the inputs cannot support the
//! calculation (empty curve, zero variance, no losers).

use serde::{Deserialize, Serialize};

use stagelab_core::domain::{EquityPoint, TradeRecord};

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub cagr: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub calmar_ratio: f64,
    /// Peak-to-trough drawdown as a negative fraction.
    pub max_drawdown: f64,
    /// Same drawdown in account currency.
    pub max_drawdown_abs: f64,
    /// Longest stretch (in curve points) spent below a prior peak.
    pub max_drawdown_duration: usize,
    pub trade_count: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    /// Mean realized pnl per trade.
    pub expectancy: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub avg_win_pct: f64,
    pub avg_loss_pct: f64,
    pub best_trade_pct: f64,
    pub worst_trade_pct: f64,
    pub avg_holding_days: f64,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
}

impl PerformanceMetrics {
    pub fn compute(equity_curve: &[EquityPoint], trades: &[TradeRecord]) -> Self {
        let equity: Vec<f64> = equity_curve.iter().map(|p| p.equity).collect();
        let (dd, dd_duration) = max_drawdown(&equity);
        let dd_abs = max_drawdown_abs(&equity);
        let best = trades
            .iter()
            .map(|t| t.realized_pnl_pct)
            .fold(f64::NEG_INFINITY, f64::max);
        let worst = trades
            .iter()
            .map(|t| t.realized_pnl_pct)
            .fold(f64::INFINITY, f64::min);
        Self {
            total_return: total_return(&equity),
            cagr: cagr(&equity),
            sharpe_ratio: sharpe_ratio(&equity),
            sortino_ratio: sortino_ratio(&equity),
            calmar_ratio: calmar_ratio(&equity),
            max_drawdown: dd,
            max_drawdown_abs: dd_abs,
            max_drawdown_duration: dd_duration,
            trade_count: trades.len(),
            win_rate: win_rate(trades),
            profit_factor: profit_factor(trades),
            expectancy: expectancy(trades),
            avg_win: avg_win(trades),
            avg_loss: avg_loss(trades),
            avg_win_pct: avg_trade_pct(trades, true),
            avg_loss_pct: avg_trade_pct(trades, false),
            best_trade_pct: if trades.is_empty() { 0.0 } else { best },
            worst_trade_pct: if trades.is_empty() { 0.0 } else { worst },
            avg_holding_days: avg_holding_days(trades),
            max_consecutive_wins: max_consecutive(trades, true),
            max_consecutive_losses: max_consecutive(trades, false),
        }
    }
}

pub fn total_return(equity: &[f64]) -> f64 {
    match (equity.first(), equity.last()) {
        (Some(&first), Some(&last)) if first > 0.0 => last / first - 1.0,
        _ => 0.0,
    }
}

pub fn cagr(equity: &[f64]) -> f64 {
    if equity.len() < 2 {
        return 0.0;
    }
    let first = equity[0];
    let last = equity[equity.len() - 1];
    if first <= 0.0 || last <= 0.0 {
        return 0.0;
    }
    let years = (equity.len() - 1) as f64 / TRADING_DAYS_PER_YEAR;
    if years <= 0.0 {
        return 0.0;
    }
    (last / first).powf(1.0 / years) - 1.0
}

pub fn sharpe_ratio(equity: &[f64]) -> f64 {
    let returns = daily_returns(equity);
    let sd = std_dev(&returns);
    if sd == 0.0 {
        return 0.0;
    }
    mean_f64(&returns) / sd * TRADING_DAYS_PER_YEAR.sqrt()
}

pub fn sortino_ratio(equity: &[f64]) -> f64 {
    let returns = daily_returns(equity);
    if returns.is_empty() {
        return 0.0;
    }
    let downside: Vec<f64> = returns.iter().copied().filter(|&r| r < 0.0).collect();
    let downside_dev = if downside.is_empty() {
        0.0
    } else {
        (downside.iter().map(|r| r * r).sum::<f64>() / downside.len() as f64).sqrt()
    };
    if downside_dev == 0.0 {
        return 0.0;
    }
    mean_f64(&returns) / downside_dev * TRADING_DAYS_PER_YEAR.sqrt()
}

pub fn calmar_ratio(equity: &[f64]) -> f64 {
    let (dd, _) = max_drawdown(equity);
    if dd == 0.0 {
        return 0.0;
    }
    cagr(equity) / dd.abs()
}

/// Deepest peak-to-trough fall in currency terms (non-negative).
pub fn max_drawdown_abs(equity: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0f64;
    for &e in equity {
        peak = peak.max(e);
        worst = worst.max(peak - e);
    }
    worst
}

/// Returns (drawdown as a negative fraction, longest underwater stretch).
pub fn max_drawdown(equity: &[f64]) -> (f64, usize) {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0f64;
    let mut underwater = 0usize;
    let mut longest = 0usize;
    for &e in equity {
        if e >= peak {
            peak = e;
            underwater = 0;
        } else {
            underwater += 1;
            longest = longest.max(underwater);
            if peak > 0.0 {
                worst = worst.min(e / peak - 1.0);
            }
        }
    }
    (worst, longest)
}

pub fn win_rate(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().filter(|t| t.is_winner()).count() as f64 / trades.len() as f64
}

pub fn profit_factor(trades: &[TradeRecord]) -> f64 {
    let gross_profit: f64 = trades
        .iter()
        .filter(|t| t.realized_pnl > 0.0)
        .map(|t| t.realized_pnl)
        .sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.realized_pnl < 0.0)
        .map(|t| -t.realized_pnl)
        .sum();
    if gross_loss == 0.0 {
        if gross_profit > 0.0 {
            return 100.0; // capped; no losers
        }
        return 0.0;
    }
    (gross_profit / gross_loss).min(100.0)
}

pub fn expectancy(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().map(|t| t.realized_pnl).sum::<f64>() / trades.len() as f64
}

pub fn avg_win(trades: &[TradeRecord]) -> f64 {
    let wins: Vec<f64> = trades
        .iter()
        .filter(|t| t.realized_pnl > 0.0)
        .map(|t| t.realized_pnl)
        .collect();
    mean_f64(&wins)
}

pub fn avg_loss(trades: &[TradeRecord]) -> f64 {
    let losses: Vec<f64> = trades
        .iter()
        .filter(|t| t.realized_pnl < 0.0)
        .map(|t| t.realized_pnl)
        .collect();
    mean_f64(&losses)
}

pub fn avg_trade_pct(trades: &[TradeRecord], winners: bool) -> f64 {
    let side: Vec<f64> = trades
        .iter()
        .filter(|t| t.is_winner() == winners)
        .map(|t| t.realized_pnl_pct)
        .collect();
    mean_f64(&side)
}

pub fn avg_holding_days(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().map(|t| t.holding_days as f64).sum::<f64>() / trades.len() as f64
}

pub fn max_consecutive(trades: &[TradeRecord], wins: bool) -> usize {
    let mut streak = 0usize;
    let mut best = 0usize;
    for trade in trades {
        if trade.is_winner() == wins {
            streak += 1;
            best = best.max(streak);
        } else {
            streak = 0;
        }
    }
    best
}

fn daily_returns(equity: &[f64]) -> Vec<f64> {
    equity
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect()
}

fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean_f64(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}
