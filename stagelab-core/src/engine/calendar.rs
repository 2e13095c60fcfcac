//! Trading calendar construction.

use chrono::NaiveDate;
use std::collections::BTreeSet;

use crate::indicators::IndicatorSeries;

/// Union of all trading dates across the instrument series and the
/// benchmark, restricted to `[start, end]`. Sorted ascending; the loop
/// iterates this once.
pub fn trading_calendar<'a>(
    series: impl IntoIterator<Item = &'a IndicatorSeries>,
    benchmark_dates: &[NaiveDate],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<NaiveDate> {
    let mut dates: BTreeSet<NaiveDate> = BTreeSet::new();
    for s in series {
        for bar in &s.bars {
            if bar.date >= start && bar.date <= end {
                dates.insert(bar.date);
            }
        }
    }
    for &d in benchmark_dates {
        if d >= start && d <= end {
            dates.insert(d);
        }
    }
    dates.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;
    use chrono::Duration;
    use std::collections::BTreeMap;

    fn series(start_day: i64, n: usize) -> IndicatorSeries {
        let bars: Vec<Bar> = (0..n)
            .map(|i| Bar {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                    + Duration::days(start_day + i as i64),
                open: 100.0,
                high: 101.0,
                low: 99.0,
                close: 100.0,
                volume: 1_000_000,
            })
            .collect();
        IndicatorSeries::compute("T", bars, None)
    }

    #[test]
    fn union_is_sorted_and_deduped() {
        let mut map = BTreeMap::new();
        map.insert("A".to_string(), series(0, 5));
        map.insert("B".to_string(), series(2, 5)); // overlaps A by 3 days
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let cal = trading_calendar(map.values(), &[], start, end);
        assert_eq!(cal.len(), 7);
        assert!(cal.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn range_restriction_applies() {
        let mut map = BTreeMap::new();
        map.insert("A".to_string(), series(0, 10));
        let start = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let cal = trading_calendar(map.values(), &[], start, end);
        assert_eq!(cal.len(), 3);
        assert_eq!(cal[0], start);
        assert_eq!(cal[2], end);
    }

    #[test]
    fn benchmark_dates_included() {
        let map: BTreeMap<String, IndicatorSeries> = BTreeMap::new();
        let d = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let cal = trading_calendar(
            map.values(),
            &[d],
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        );
        assert_eq!(cal, vec![d]);
    }
}
