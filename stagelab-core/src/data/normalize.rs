//! Timestamp normalization at ingestion.
//!
//! All series entering one run must agree on timezone qualification. The
//! `Normalizer` locks onto the first series it sees; any later series with
//! a different `TimestampKind` is a hard `TimezoneMismatch` error. This is
//! the only place timezone handling happens - past this point the engine
//! deals exclusively in naive dates.

use crate::data::provider::{DataError, TaggedSeries, TimestampKind};
use crate::domain::Bar;

/// Ingestion-time normalizer. One per run.
#[derive(Debug, Default)]
pub struct Normalizer {
    locked: Option<(String, TimestampKind)>,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a series, enforcing consistent timezone qualification and
    /// strictly increasing dates. Returns engine-native bars.
    pub fn normalize(&mut self, series: TaggedSeries) -> Result<Vec<Bar>, DataError> {
        match &self.locked {
            None => {
                self.locked = Some((series.symbol.clone(), series.timestamps));
            }
            Some((first_symbol, first_kind)) => {
                if *first_kind != series.timestamps {
                    return Err(DataError::TimezoneMismatch {
                        first_symbol: first_symbol.clone(),
                        first_kind: first_kind.as_str(),
                        symbol: series.symbol,
                        kind: series.timestamps.as_str(),
                    });
                }
            }
        }

        for window in series.bars.windows(2) {
            if window[1].date <= window[0].date {
                return Err(DataError::UnorderedDates {
                    symbol: series.symbol,
                    date: window[1].date,
                });
            }
        }

        Ok(series.bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(day: u32) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: 100.0,
            high: 101.0,
            low: 99.0,
            close: 100.5,
            volume: 1_000_000,
        }
    }

    fn series(symbol: &str, kind: TimestampKind, days: &[u32]) -> TaggedSeries {
        TaggedSeries {
            symbol: symbol.into(),
            bars: days.iter().map(|&d| bar(d)).collect(),
            timestamps: kind,
        }
    }

    #[test]
    fn consistent_kinds_pass() {
        let mut n = Normalizer::new();
        n.normalize(series("SPY", TimestampKind::Naive, &[2, 3, 4]))
            .unwrap();
        n.normalize(series("AAPL", TimestampKind::Naive, &[2, 3]))
            .unwrap();
    }

    #[test]
    fn mixed_kinds_fail_loudly() {
        let mut n = Normalizer::new();
        n.normalize(series("SPY", TimestampKind::Utc, &[2, 3]))
            .unwrap();
        let err = n
            .normalize(series("AAPL", TimestampKind::Naive, &[2, 3]))
            .unwrap_err();
        assert!(matches!(err, DataError::TimezoneMismatch { .. }));
    }

    #[test]
    fn out_of_order_dates_fail() {
        let mut n = Normalizer::new();
        let mut s = series("AAPL", TimestampKind::Naive, &[3, 2]);
        s.bars[1].date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let err = n.normalize(s).unwrap_err();
        assert!(matches!(err, DataError::UnorderedDates { .. }));
    }

    #[test]
    fn duplicate_dates_fail() {
        let mut n = Normalizer::new();
        let err = n
            .normalize(series("AAPL", TimestampKind::Naive, &[2, 2]))
            .unwrap_err();
        assert!(matches!(err, DataError::UnorderedDates { .. }));
    }
}
