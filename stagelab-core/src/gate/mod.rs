//! Entry gate: the Stage-2 trend template and the breakout trigger.
//!
//! `TrendTemplate::evaluate` answers "is this symbol in a confirmed Stage-2
//! uptrend as of bar `t`" with a verdict of named booleans - one per
//! condition, so diagnostics can count exactly which conditions reject
//! candidates. `check_breakout` answers the separate question "did today's
//! bar clear the pivot on expanded volume". An entry requires both on the
//! same date.
//!
//! Every threshold lives in `GateConfig`; strict vs relaxed mode only
//! swaps the RS-new-high ratio.

pub mod vcp;

use serde::{Deserialize, Serialize};

use crate::indicators::IndicatorSeries;

/// Threshold set selector. Relaxed mode loosens the RS requirement; all
/// structural conditions stay identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateMode {
    Strict,
    Relaxed,
}

impl GateMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateMode::Strict => "strict",
            GateMode::Relaxed => "relaxed",
        }
    }
}

/// All gate thresholds. Defaults follow the classic trend-template
/// parameterization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Bars required before any verdict can pass.
    pub min_history: usize,
    /// Price must be at least this multiple of the 52-week low.
    pub min_above_52w_low: f64,
    /// Price must be at least this fraction of the 52-week high.
    pub near_52w_high_ratio: f64,
    /// RS must be within this fraction of its own 52-week high (strict).
    pub rs_high_ratio_strict: f64,
    /// Same, relaxed mode.
    pub rs_high_ratio_relaxed: f64,
    /// Minimum 50-day average share volume.
    pub min_avg_volume: f64,
    /// Lookback for the MA-200 rising check.
    pub ma200_slope_days: usize,
    /// Pivot = highest high over this many prior bars.
    pub pivot_lookback: usize,
    /// Breakout volume must exceed this multiple of the 50-day average.
    pub breakout_vol_ratio: f64,
    /// Stop floor as a fraction below the pivot.
    pub stop_pct: f64,
    /// ATR multiple subtracted from the recent low for the stop.
    pub stop_atr_mult: f64,
    /// Lookback for the recent-low leg of the stop.
    pub stop_low_lookback: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            min_history: 252,
            min_above_52w_low: 1.30,
            near_52w_high_ratio: 0.75,
            rs_high_ratio_strict: 0.95,
            rs_high_ratio_relaxed: 0.90,
            min_avg_volume: 500_000.0,
            ma200_slope_days: 20,
            pivot_lookback: 50,
            breakout_vol_ratio: 1.5,
            stop_pct: 0.03,
            stop_atr_mult: 0.5,
            stop_low_lookback: 10,
        }
    }
}

impl GateConfig {
    pub fn rs_high_ratio(&self, mode: GateMode) -> f64 {
        match mode {
            GateMode::Strict => self.rs_high_ratio_strict,
            GateMode::Relaxed => self.rs_high_ratio_relaxed,
        }
    }
}

/// One boolean per trend-template condition. The struct is the contract:
/// conditions are fixed fields, not a string-keyed map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateVerdict {
    pub min_history: bool,
    pub price_above_sma50: bool,
    pub sma50_above_sma150: bool,
    pub sma150_above_sma200: bool,
    pub ma200_uptrend: bool,
    pub above_52w_low: bool,
    pub near_52w_high: bool,
    pub rs_new_high: bool,
    pub sufficient_volume: bool,
}

impl GateVerdict {
    /// Condition names, index-aligned with `flags()`. Diagnostics keys.
    pub const CONDITIONS: [&'static str; 9] = [
        "min_history",
        "price_above_sma50",
        "sma50_above_sma150",
        "sma150_above_sma200",
        "ma200_uptrend",
        "above_52w_low",
        "near_52w_high",
        "rs_new_high",
        "sufficient_volume",
    ];

    /// All conditions as (name, passed) pairs, in `CONDITIONS` order.
    pub fn flags(&self) -> [(&'static str, bool); 9] {
        [
            ("min_history", self.min_history),
            ("price_above_sma50", self.price_above_sma50),
            ("sma50_above_sma150", self.sma50_above_sma150),
            ("sma150_above_sma200", self.sma150_above_sma200),
            ("ma200_uptrend", self.ma200_uptrend),
            ("above_52w_low", self.above_52w_low),
            ("near_52w_high", self.near_52w_high),
            ("rs_new_high", self.rs_new_high),
            ("sufficient_volume", self.sufficient_volume),
        ]
    }

    /// Eligible only when every condition holds.
    pub fn eligible(&self) -> bool {
        self.flags().iter().all(|(_, passed)| *passed)
    }

    /// Names of failed conditions, in stable order.
    pub fn failures(&self) -> Vec<&'static str> {
        self.flags()
            .iter()
            .filter(|(_, passed)| !passed)
            .map(|(name, _)| *name)
            .collect()
    }

    /// Verdict for a window shorter than the minimum history: the history
    /// condition fails and nothing else is evaluated.
    fn insufficient_history() -> Self {
        Self {
            min_history: false,
            price_above_sma50: false,
            sma50_above_sma150: false,
            sma150_above_sma200: false,
            ma200_uptrend: false,
            above_52w_low: false,
            near_52w_high: false,
            rs_new_high: false,
            sufficient_volume: false,
        }
    }
}

/// Trend-template evaluator for one run.
#[derive(Debug, Clone)]
pub struct TrendTemplate {
    config: GateConfig,
    mode: GateMode,
}

impl TrendTemplate {
    pub fn new(config: GateConfig, mode: GateMode) -> Self {
        Self { config, mode }
    }

    pub fn mode(&self) -> GateMode {
        self.mode
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Evaluate all conditions as of bar `t`. Reads only `series[..=t]`.
    /// NaN indicator values fail their condition (comparisons with NaN are
    /// false), so warmup never passes by accident.
    pub fn evaluate(&self, series: &IndicatorSeries, t: usize) -> GateVerdict {
        let cfg = &self.config;
        if series.history_len(t) < cfg.min_history {
            return GateVerdict::insufficient_history();
        }

        let close = series.bars[t].close;
        let sma50 = series.sma_50[t];
        let sma150 = series.sma_150[t];
        let sma200 = series.sma_200[t];

        let ma200_uptrend = t >= cfg.ma200_slope_days
            && sma200 > series.sma_200[t - cfg.ma200_slope_days];

        let rs_new_high = if !series.benchmark_enabled {
            // No benchmark configured: the RS condition is vacuous.
            true
        } else {
            let rs = series.rs[t];
            let rs_high = series.rs_high_52w(t, cfg.min_history);
            rs >= rs_high * cfg.rs_high_ratio(self.mode)
        };

        GateVerdict {
            min_history: true,
            price_above_sma50: close > sma50,
            sma50_above_sma150: sma50 > sma150,
            sma150_above_sma200: sma150 > sma200,
            ma200_uptrend,
            above_52w_low: close >= cfg.min_above_52w_low * series.low_52w(t),
            near_52w_high: close >= cfg.near_52w_high_ratio * series.high_52w(t),
            rs_new_high,
            sufficient_volume: series.volume_ma_50[t] >= cfg.min_avg_volume,
        }
    }
}

/// A confirmed breakout on bar `t`: the pivot cleared, plus the stop the
/// position should carry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakout {
    pub pivot: f64,
    pub stop_price: f64,
    /// Today's volume over the 50-day average.
    pub volume_ratio: f64,
}

/// Check whether bar `t` closes at or above the trailing pivot on expanded
/// volume. Returns `None` when there is no trigger (or not enough bars to
/// define a pivot).
pub fn check_breakout(series: &IndicatorSeries, t: usize, cfg: &GateConfig) -> Option<Breakout> {
    if t < cfg.pivot_lookback {
        return None;
    }
    let pivot = series.bars[t - cfg.pivot_lookback..t]
        .iter()
        .map(|b| b.high)
        .fold(f64::NEG_INFINITY, f64::max);

    let close = series.bars[t].close;
    let vol_ma = series.volume_ma_50[t];
    if vol_ma.is_nan() || vol_ma <= 0.0 {
        return None;
    }
    let volume_ratio = series.bars[t].volume as f64 / vol_ma;

    if close < pivot || volume_ratio < cfg.breakout_vol_ratio {
        return None;
    }

    Some(Breakout {
        pivot,
        stop_price: stop_from_pivot(series, t, pivot, cfg),
        volume_ratio,
    })
}

/// Stop for a pivot entry: the tighter of a fixed fraction below the pivot
/// and the recent low cushioned by a fraction of ATR. "Tighter" here means
/// the higher price - less room to fall.
pub fn stop_from_pivot(series: &IndicatorSeries, t: usize, pivot: f64, cfg: &GateConfig) -> f64 {
    let pct_stop = pivot * (1.0 - cfg.stop_pct);
    let lo = t.saturating_sub(cfg.stop_low_lookback - 1);
    let recent_low = series.bars[lo..=t]
        .iter()
        .map(|b| b.low)
        .fold(f64::INFINITY, f64::min);
    let atr = series.atr_14[t];
    if atr.is_nan() {
        return pct_stop;
    }
    pct_stop.max(recent_low - cfg.stop_atr_mult * atr)
}
