//! Pure column computations over bar slices.
//!
//! Every function returns a vector the same length as its input with NaN
//! filling the warmup prefix. Value at index `t` depends only on inputs at
//! indices `<= t`.

use crate::domain::Bar;

/// Simple moving average with NaN warmup prefix.
pub fn sma(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }
    let mut sum: f64 = values[..period].iter().sum();
    out[period - 1] = sum / period as f64;
    for t in period..values.len() {
        sum += values[t] - values[t - period];
        out[t] = sum / period as f64;
    }
    out
}

/// Average True Range (simple mean of true range). The first bar's true
/// range is its high-low span.
pub fn atr(bars: &[Bar], period: usize) -> Vec<f64> {
    let true_ranges: Vec<f64> = bars
        .iter()
        .enumerate()
        .map(|(t, bar)| {
            if t == 0 {
                bar.high - bar.low
            } else {
                let prev_close = bars[t - 1].close;
                (bar.high - bar.low)
                    .max((bar.high - prev_close).abs())
                    .max((bar.low - prev_close).abs())
            }
        })
        .collect();
    sma(&true_ranges, period)
}

/// Relative-strength line: close divided by benchmark close, matched by
/// date. Dates absent from the benchmark produce NaN.
pub fn rs_line(bars: &[Bar], benchmark: &[Bar]) -> Vec<f64> {
    let bench: std::collections::BTreeMap<chrono::NaiveDate, f64> =
        benchmark.iter().map(|b| (b.date, b.close)).collect();
    bars.iter()
        .map(|bar| match bench.get(&bar.date) {
            Some(&bc) if bc > 0.0 => bar.close / bc,
            _ => f64::NAN,
        })
        .collect()
}

/// Trailing maximum over a window of `period` values ending at each index
/// (shorter at the head). NaN inputs are skipped.
pub fn trailing_max(values: &[f64], period: usize) -> Vec<f64> {
    trailing_extreme(values, period, f64::max)
}

/// Trailing minimum, same windowing as `trailing_max`.
pub fn trailing_min(values: &[f64], period: usize) -> Vec<f64> {
    trailing_extreme(values, period, f64::min)
}

fn trailing_extreme(values: &[f64], period: usize, pick: fn(f64, f64) -> f64) -> Vec<f64> {
    values
        .iter()
        .enumerate()
        .map(|(t, _)| {
            let lo = t.saturating_sub(period.saturating_sub(1));
            values[lo..=t]
                .iter()
                .copied()
                .filter(|v| !v.is_nan())
                .reduce(pick)
                .unwrap_or(f64::NAN)
        })
        .collect()
}
