//! Augmented series: bars plus every derived column the gate consumes.

use chrono::NaiveDate;

use crate::domain::Bar;

use super::columns::{atr, rs_line, sma};

pub const SMA_FAST: usize = 50;
pub const SMA_MID: usize = 150;
pub const SMA_SLOW: usize = 200;
pub const ATR_PERIOD: usize = 14;
pub const VOLUME_MA_SHORT: usize = 10;
pub const VOLUME_MA_LONG: usize = 50;
/// One trading year of daily bars.
pub const TRADING_YEAR: usize = 252;

/// A symbol's bars with precomputed indicator columns. Columns are
/// index-aligned with `bars`; warmup prefixes are NaN. Nothing at index
/// `t` looks past `t`.
#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub symbol: String,
    pub bars: Vec<Bar>,
    pub sma_50: Vec<f64>,
    pub sma_150: Vec<f64>,
    pub sma_200: Vec<f64>,
    pub atr_14: Vec<f64>,
    pub volume_ma_10: Vec<f64>,
    pub volume_ma_50: Vec<f64>,
    /// Close ÷ benchmark close, NaN where the benchmark has no bar.
    /// All-NaN when no benchmark was supplied.
    pub rs: Vec<f64>,
    pub benchmark_enabled: bool,
}

impl IndicatorSeries {
    /// Compute every column for a symbol's bars. `benchmark` is the
    /// benchmark's bar series when RS conditions are in play.
    pub fn compute(symbol: impl Into<String>, bars: Vec<Bar>, benchmark: Option<&[Bar]>) -> Self {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume as f64).collect();

        let rs = match benchmark {
            Some(bench) => rs_line(&bars, bench),
            None => vec![f64::NAN; bars.len()],
        };

        Self {
            symbol: symbol.into(),
            sma_50: sma(&closes, SMA_FAST),
            sma_150: sma(&closes, SMA_MID),
            sma_200: sma(&closes, SMA_SLOW),
            atr_14: atr(&bars, ATR_PERIOD),
            volume_ma_10: sma(&volumes, VOLUME_MA_SHORT),
            volume_ma_50: sma(&volumes, VOLUME_MA_LONG),
            rs,
            benchmark_enabled: benchmark.is_some(),
            bars,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Index of the bar on `date`, if the symbol traded that day.
    /// Bars are strictly date-ordered, so this is a binary search.
    pub fn date_index(&self, date: NaiveDate) -> Option<usize> {
        self.bars.binary_search_by_key(&date, |b| b.date).ok()
    }

    /// Index of the last bar on or before `date`.
    pub fn index_at_or_before(&self, date: NaiveDate) -> Option<usize> {
        match self.bars.binary_search_by_key(&date, |b| b.date) {
            Ok(t) => Some(t),
            Err(0) => None,
            Err(t) => Some(t - 1),
        }
    }

    /// Number of bars up to and including `t`.
    pub fn history_len(&self, t: usize) -> usize {
        t + 1
    }

    /// Highest high over the trailing year ending at `t` (shorter at the
    /// head of the series).
    pub fn high_52w(&self, t: usize) -> f64 {
        let lo = t.saturating_sub(TRADING_YEAR - 1);
        self.bars[lo..=t]
            .iter()
            .map(|b| b.high)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Lowest low over the trailing year ending at `t`.
    pub fn low_52w(&self, t: usize) -> f64 {
        let lo = t.saturating_sub(TRADING_YEAR - 1);
        self.bars[lo..=t]
            .iter()
            .map(|b| b.low)
            .fold(f64::INFINITY, f64::min)
    }

    /// Highest RS value over the last `TRADING_YEAR` valid (non-NaN) RS
    /// readings ending at `t`. Returns NaN when fewer than `min_points`
    /// valid readings exist.
    pub fn rs_high_52w(&self, t: usize, min_points: usize) -> f64 {
        let valid: Vec<f64> = self.rs[..=t].iter().copied().filter(|v| !v.is_nan()).collect();
        if valid.len() < min_points {
            return f64::NAN;
        }
        let tail_start = valid.len().saturating_sub(TRADING_YEAR);
        valid[tail_start..]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }
}
