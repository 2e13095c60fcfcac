//! Daily OHLCV bar - the fundamental unit of market data.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One trading day of price/volume data for a single symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// Check OHLC consistency: high is the max, low is the min, all positive.
    pub fn is_sane(&self) -> bool {
        self.open > 0.0
            && self.high > 0.0
            && self.low > 0.0
            && self.close > 0.0
            && self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn sane_bar() {
        let bar = Bar {
            date: date("2024-01-02"),
            open: 100.0,
            high: 102.0,
            low: 99.0,
            close: 101.0,
            volume: 1_000_000,
        };
        assert!(bar.is_sane());
    }

    #[test]
    fn high_below_low_is_insane() {
        let bar = Bar {
            date: date("2024-01-02"),
            open: 100.0,
            high: 98.0,
            low: 99.0,
            close: 98.5,
            volume: 1_000_000,
        };
        assert!(!bar.is_sane());
    }

    #[test]
    fn negative_price_is_insane() {
        let bar = Bar {
            date: date("2024-01-02"),
            open: -1.0,
            high: 102.0,
            low: -2.0,
            close: 101.0,
            volume: 0,
        };
        assert!(!bar.is_sane());
    }

    #[test]
    fn nan_close_is_insane() {
        let bar = Bar {
            date: date("2024-01-02"),
            open: 100.0,
            high: 102.0,
            low: 99.0,
            close: f64::NAN,
            volume: 1_000_000,
        };
        assert!(!bar.is_sane());
    }
}
