//! Fetches, normalizes and prepares universe data for a run.
//!
//! Fetching runs in parallel; normalization is sequential and follows the
//! canonical symbol order so that the first-seen timestamp kind (and thus
//! a mismatch error) is the same on every run. The benchmark is fetched
//! first and locks the kind.

use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use stagelab_core::data::{DataError, DataProvider, Normalizer, TaggedSeries, TimestampKind};
use stagelab_core::domain::Bar;
use stagelab_core::indicators::IndicatorSeries;

use crate::config::RunConfig;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("benchmark {symbol}: {source}")]
    Benchmark {
        symbol: String,
        source: DataError,
    },

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("no usable symbols: all {0} universe symbols were excluded")]
    EmptyAfterExclusions(usize),
}

/// Normalized, indicator-augmented data for a run.
#[derive(Debug)]
pub struct LoadedData {
    pub series: BTreeMap<String, IndicatorSeries>,
    pub benchmark_dates: Vec<NaiveDate>,
    /// Symbols dropped during loading, with the reason.
    pub exclusions: BTreeMap<String, String>,
}

/// Fetch and normalize every universe symbol plus the benchmark.
///
/// Per-symbol fetch failures become exclusions; a timestamp-kind mix
/// across symbols is fatal.
pub fn load_universe_data(
    provider: &dyn DataProvider,
    config: &RunConfig,
) -> Result<LoadedData, LoadError> {
    let symbols = config.sorted_universe();
    // pad the window back so indicators have a year of warmup
    let fetch_start = config.start_date - chrono::Duration::days(550);
    let fetch_end = config.end_date;

    let mut normalizer = Normalizer::new();
    let mut exclusions = BTreeMap::new();

    let benchmark = match &config.benchmark_symbol {
        Some(symbol) => {
            let tagged = provider
                .fetch(symbol, fetch_start, fetch_end)
                .map_err(|source| LoadError::Benchmark {
                    symbol: symbol.clone(),
                    source,
                })?;
            Some(normalizer.normalize(tagged)?)
        }
        None => None,
    };

    let fetched: Vec<(String, Result<TaggedSeries, DataError>)> = symbols
        .par_iter()
        .map(|symbol| {
            let result = provider.fetch(symbol, fetch_start, fetch_end);
            (symbol.clone(), result)
        })
        .collect();

    let mut series = BTreeMap::new();
    for (symbol, result) in fetched {
        let tagged = match result {
            Ok(tagged) => tagged,
            Err(e @ DataError::TimezoneMismatch { .. }) => return Err(e.into()),
            Err(e) => {
                exclusions.insert(symbol, e.to_string());
                continue;
            }
        };
        let bars = match normalizer.normalize(tagged) {
            Ok(bars) => bars,
            // a kind mix across symbols must stop the run, not shrink it
            Err(e @ DataError::TimezoneMismatch { .. }) => return Err(e.into()),
            Err(e) => {
                exclusions.insert(symbol, e.to_string());
                continue;
            }
        };
        if bars.is_empty() {
            exclusions.insert(symbol, "no bars in window".to_string());
            continue;
        }
        let computed = IndicatorSeries::compute(symbol.clone(), bars, benchmark.as_deref());
        series.insert(symbol, computed);
    }

    if series.is_empty() {
        return Err(LoadError::EmptyAfterExclusions(symbols.len()));
    }

    let benchmark_dates = benchmark
        .map(|bars| bars.iter().map(|b| b.date).collect())
        .unwrap_or_default();

    Ok(LoadedData {
        series,
        benchmark_dates,
        exclusions,
    })
}

/// Reads daily bars from `<dir>/<SYMBOL>.csv`.
///
/// Expected header: `date,open,high,low,close,volume`. Dates may be plain
/// (`2023-01-03`, tagged naive) or RFC 3339 instants (tagged UTC); a file
/// is tagged by its first row and must not mix styles.
pub struct CsvBarProvider {
    dir: PathBuf,
}

impl CsvBarProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }

    fn parse_date(raw: &str) -> Option<(NaiveDate, TimestampKind)> {
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Some((date, TimestampKind::Naive));
        }
        if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
            return Some((dt.date_naive(), TimestampKind::Utc));
        }
        None
    }

    fn read_file(&self, symbol: &str, path: &Path) -> Result<TaggedSeries, DataError> {
        let mut reader = csv::Reader::from_path(path).map_err(|e| DataError::Unavailable {
            symbol: symbol.to_string(),
            reason: e.to_string(),
        })?;

        let malformed = |reason: String| DataError::Malformed {
            symbol: symbol.to_string(),
            reason,
        };

        let mut bars = Vec::new();
        let mut kind = None;
        for (row, record) in reader.records().enumerate() {
            let record = record.map_err(|e| malformed(e.to_string()))?;
            if record.len() < 6 {
                return Err(malformed(format!("row {}: expected 6 columns", row + 1)));
            }
            let (date, row_kind) = Self::parse_date(&record[0])
                .ok_or_else(|| malformed(format!("row {}: bad date {:?}", row + 1, &record[0])))?;
            match kind {
                None => kind = Some(row_kind),
                Some(k) if k != row_kind => {
                    return Err(malformed(format!(
                        "row {}: mixed timestamp styles within file",
                        row + 1
                    )))
                }
                Some(_) => {}
            }
            let field = |i: usize| -> Result<f64, DataError> {
                record[i]
                    .parse()
                    .map_err(|_| malformed(format!("row {}: bad number {:?}", row + 1, &record[i])))
            };
            bars.push(Bar {
                date,
                open: field(1)?,
                high: field(2)?,
                low: field(3)?,
                close: field(4)?,
                volume: record[5].parse().map_err(|_| {
                    malformed(format!("row {}: bad volume {:?}", row + 1, &record[5]))
                })?,
            });
        }

        let kind = kind.ok_or_else(|| malformed("file has no data rows".to_string()))?;
        Ok(TaggedSeries {
            symbol: symbol.to_string(),
            bars,
            timestamps: kind,
        })
    }
}

impl DataProvider for CsvBarProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<TaggedSeries, DataError> {
        let path = self.path_for(symbol);
        if !path.exists() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        let mut series = self.read_file(symbol, &path)?;
        series.bars.retain(|b| b.date >= start && b.date <= end);
        Ok(series)
    }
}
