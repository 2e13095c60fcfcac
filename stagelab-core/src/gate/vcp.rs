//! Volatility-contraction pattern detection.
//!
//! A VCP base is a 35–65 bar consolidation whose pullbacks shrink over
//! time and whose volume dries up into the pivot. Detection walks the base
//! window ending at the evaluation bar, extracts alternating swing
//! highs/lows, and validates the contraction sequence. Everything reads
//! bars at or before the evaluation index only.

use serde::{Deserialize, Serialize};

use crate::indicators::{IndicatorSeries, TRADING_YEAR};

/// VCP detection thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VcpConfig {
    pub base_period_min: usize,
    pub base_period_max: usize,
    /// Base depth (high-to-low over mean close) must fall in this band.
    pub base_range_min: f64,
    pub base_range_max: f64,
    /// Minimum average volume inside the base.
    pub min_base_volume: f64,
    /// Swing detection half-window.
    pub swing_window: usize,
    /// Each pullback may exceed its predecessor by at most this factor.
    pub contraction_tolerance: f64,
    /// Final pullback must be at most this deep.
    pub last_contraction_max: f64,
    /// 10-bar vs 50-bar volume mean ratio confirming dry-up.
    pub dryup_vol_ratio: f64,
    /// Pivot must sit within this fraction of the 52-week high.
    pub pivot_min_high_52w_ratio: f64,
    /// ATR cushion below the last contraction low for the stop.
    pub pivot_buffer_atr: f64,
    /// Entry is placed this fraction above the pivot.
    pub entry_buffer_pct: f64,
    /// Profit target as a multiple of entry.
    pub target_multiple: f64,
}

impl Default for VcpConfig {
    fn default() -> Self {
        Self {
            base_period_min: 35,
            base_period_max: 65,
            base_range_min: 0.10,
            base_range_max: 0.40,
            min_base_volume: 100_000.0,
            swing_window: 5,
            contraction_tolerance: 1.1,
            last_contraction_max: 0.10,
            dryup_vol_ratio: 0.6,
            pivot_min_high_52w_ratio: 0.95,
            pivot_buffer_atr: 0.5,
            entry_buffer_pct: 0.01,
            target_multiple: 1.25,
        }
    }
}

/// A detected pattern and its trade levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VcpSignal {
    pub pivot: f64,
    pub entry_price: f64,
    pub stop_price: f64,
    pub target_price: f64,
    /// (entry − stop) / entry.
    pub risk_pct: f64,
    pub base_start: usize,
    pub base_end: usize,
    pub contraction_count: usize,
    pub dryup_confirmed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SwingKind {
    High,
    Low,
}

#[derive(Debug, Clone, Copy)]
struct Swing {
    kind: SwingKind,
    price: f64,
    idx: usize,
}

/// Look for a VCP whose base ends at bar `t`. Returns `None` when any
/// structural requirement fails.
pub fn detect_vcp(series: &IndicatorSeries, t: usize, cfg: &VcpConfig) -> Option<VcpSignal> {
    let (base_start, base_end) = find_base(series, t, cfg)?;

    let swings = extract_swings(series, base_start, base_end, cfg.swing_window);
    // Need at least two full up-down cycles.
    if swings.len() < 4 {
        return None;
    }

    let pullbacks = contraction_sequence(&swings, cfg)?;

    let pivot = series.bars[base_start..=base_end]
        .iter()
        .map(|b| b.high)
        .fold(f64::NEG_INFINITY, f64::max);

    let lookback_start = t.saturating_sub(TRADING_YEAR - 1);
    let high_52w = series.bars[lookback_start..=t]
        .iter()
        .map(|b| b.high)
        .fold(f64::NEG_INFINITY, f64::max);
    if pivot < high_52w * cfg.pivot_min_high_52w_ratio {
        return None;
    }

    let stop_price = stop_price(series, pivot, base_start, base_end, cfg);
    let entry_price = pivot * (1.0 + cfg.entry_buffer_pct);
    if entry_price <= stop_price {
        return None;
    }

    Some(VcpSignal {
        pivot,
        entry_price,
        stop_price,
        target_price: entry_price * cfg.target_multiple,
        risk_pct: (entry_price - stop_price) / entry_price,
        base_start,
        base_end,
        contraction_count: pullbacks.len(),
        dryup_confirmed: check_dryup(series, base_end, cfg),
    })
}

/// Longest valid base ending at `t`, searching from the widest window down.
fn find_base(series: &IndicatorSeries, t: usize, cfg: &VcpConfig) -> Option<(usize, usize)> {
    for period in (cfg.base_period_min..=cfg.base_period_max).rev() {
        if t + 1 < period {
            continue;
        }
        let start = t + 1 - period;
        if is_valid_base(series, start, t, cfg) {
            return Some((start, t));
        }
    }
    None
}

fn is_valid_base(series: &IndicatorSeries, start: usize, end: usize, cfg: &VcpConfig) -> bool {
    let bars = &series.bars[start..=end];
    let high = bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    let low = bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    let mean_close: f64 = bars.iter().map(|b| b.close).sum::<f64>() / bars.len() as f64;
    if mean_close <= 0.0 {
        return false;
    }

    let range = (high - low) / mean_close;
    if range < cfg.base_range_min || range > cfg.base_range_max {
        return false;
    }

    let mean_volume: f64 =
        bars.iter().map(|b| b.volume as f64).sum::<f64>() / bars.len() as f64;
    mean_volume >= cfg.min_base_volume
}

/// Alternating swing highs/lows inside the base, via a symmetric
/// local-extreme window. Consecutive same-kind swings collapse to the
/// first.
fn extract_swings(
    series: &IndicatorSeries,
    base_start: usize,
    base_end: usize,
    window: usize,
) -> Vec<Swing> {
    let bars = &series.bars[base_start..=base_end];
    let mut swings = Vec::new();

    if bars.len() <= 2 * window {
        return swings;
    }

    for i in window..bars.len() - window {
        let neighborhood = &bars[i - window..=i + window];
        let high = bars[i].high;
        if high >= neighborhood.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max) {
            swings.push(Swing {
                kind: SwingKind::High,
                price: high,
                idx: base_start + i,
            });
        }
        let low = bars[i].low;
        if low <= neighborhood.iter().map(|b| b.low).fold(f64::INFINITY, f64::min) {
            swings.push(Swing {
                kind: SwingKind::Low,
                price: low,
                idx: base_start + i,
            });
        }
    }

    swings.sort_by_key(|s| s.idx);

    let mut filtered: Vec<Swing> = Vec::new();
    for swing in swings {
        match filtered.last() {
            Some(prev) if prev.kind == swing.kind => {}
            _ => filtered.push(swing),
        }
    }
    filtered
}

/// Pullback depths for each high→low→high cycle, provided they shrink and
/// the last one is tight enough.
fn contraction_sequence(swings: &[Swing], cfg: &VcpConfig) -> Option<Vec<f64>> {
    let mut pullbacks = Vec::new();
    for w in swings.windows(3) {
        if w[0].kind == SwingKind::High
            && w[1].kind == SwingKind::Low
            && w[2].kind == SwingKind::High
        {
            pullbacks.push((w[0].price - w[1].price) / w[0].price);
        }
    }

    if pullbacks.len() < 2 {
        return None;
    }
    for pair in pullbacks.windows(2) {
        if pair[1] > pair[0] * cfg.contraction_tolerance {
            return None;
        }
    }
    if *pullbacks.last()? > cfg.last_contraction_max {
        return None;
    }
    Some(pullbacks)
}

/// 10-bar volume mean vs 50-bar volume mean, both ending at `base_end`.
fn check_dryup(series: &IndicatorSeries, base_end: usize, cfg: &VcpConfig) -> bool {
    if base_end < 50 {
        return false;
    }
    let mean = |start: usize| -> f64 {
        let bars = &series.bars[start..=base_end];
        bars.iter().map(|b| b.volume as f64).sum::<f64>() / bars.len() as f64
    };
    let vol_10 = mean(base_end - 10);
    let vol_50 = mean(base_end - 50);
    if vol_50 <= 0.0 {
        return false;
    }
    vol_10 / vol_50 <= cfg.dryup_vol_ratio
}

/// Initial stop: the higher of pivot − 3% and the last contraction low
/// minus an ATR cushion.
fn stop_price(
    series: &IndicatorSeries,
    pivot: f64,
    _base_start: usize,
    base_end: usize,
    cfg: &VcpConfig,
) -> f64 {
    let pct_stop = pivot * 0.97;

    let tail_start = base_end.saturating_sub(9);
    let last_low = series.bars[tail_start..=base_end]
        .iter()
        .map(|b| b.low)
        .fold(f64::INFINITY, f64::min);

    let atr = series.atr_14[base_end];
    let atr = if atr.is_nan() { 0.0 } else { atr };

    pct_stop.max(last_low - cfg.pivot_buffer_atr * atr)
}
