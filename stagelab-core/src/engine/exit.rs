//! Exit evaluation for open positions.

use crate::domain::{ExitReason, Position};
use crate::indicators::IndicatorSeries;

/// Decide whether the position should close on bar `t`.
///
/// Checks run in fixed priority order and the first hit wins:
/// stop-loss, then trend break (close under the 50-day MA), then target.
/// A bar that trips several conditions therefore records the most
/// defensive reason.
pub fn evaluate_exit(
    position: &Position,
    series: &IndicatorSeries,
    t: usize,
) -> Option<ExitReason> {
    let close = series.bars[t].close;

    if close <= position.stop_price {
        return Some(ExitReason::StopLoss);
    }

    let sma50 = series.sma_50[t];
    if !sma50.is_nan() && close < sma50 {
        return Some(ExitReason::TrendBreak);
    }

    if let Some(target) = position.target_price {
        if close >= target {
            return Some(ExitReason::TargetReached);
        }
    }

    None
}
