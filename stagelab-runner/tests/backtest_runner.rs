//! End-to-end runner tests against the synthetic provider.

use chrono::NaiveDate;

use stagelab_core::data::{
    DataError, DataProvider, SyntheticProvider, TaggedSeries, TimestampKind,
};
use stagelab_core::engine::CancelToken;
use stagelab_core::gate::GateMode;
use stagelab_runner::config::RunConfig;
use stagelab_runner::data_loader::{load_universe_data, LoadError};
use stagelab_runner::export::write_artifacts;
use stagelab_runner::runner::{run_single_backtest, SCHEMA_VERSION};

fn synthetic_config() -> RunConfig {
    let mut config = RunConfig::from_toml(
        r#"
            start_date = "2022-06-01"
            end_date = "2023-12-29"
            universe = ["ALPHA", "BRAVO", "CHARLIE", "DELTA", "ECHO"]
            benchmark_symbol = "INDEX"
        "#,
    )
    .unwrap();
    config.auto_fallback = false;
    config
}

#[test]
fn synthetic_run_completes() {
    let config = synthetic_config();
    let provider = SyntheticProvider::new(42);
    let result = run_single_backtest(&config, &provider, &CancelToken::new()).unwrap();

    assert_eq!(result.schema_version, SCHEMA_VERSION);
    assert_eq!(result.run_id, config.run_id());
    assert!(!result.is_partial());
    assert!(!result.report.equity_curve.is_empty());
    // trades or an explanation, never silence
    if result.report.trades.is_empty() {
        assert!(result.report.diagnostics.gate_evaluations > 0);
    }
}

#[test]
fn identical_configs_identical_results() {
    let config = synthetic_config();
    let provider = SyntheticProvider::new(42);
    let a = run_single_backtest(&config, &provider, &CancelToken::new()).unwrap();
    let b = run_single_backtest(&config, &provider, &CancelToken::new()).unwrap();
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

#[test]
fn fallback_reruns_relaxed_when_strict_is_quiet() {
    // default strict thresholds rarely trigger on a gentle synthetic walk,
    // so the fallback path is exercised reliably
    let mut config = synthetic_config();
    config.auto_fallback = true;
    config.min_trades_threshold = 10_000; // force the fallback
    let provider = SyntheticProvider::new(42);
    let result = run_single_backtest(&config, &provider, &CancelToken::new()).unwrap();

    assert!(result.fallback_triggered);
    assert_eq!(result.mode_used, GateMode::Relaxed);
}

#[test]
fn no_fallback_when_disabled() {
    let config = synthetic_config();
    let provider = SyntheticProvider::new(42);
    let result = run_single_backtest(&config, &provider, &CancelToken::new()).unwrap();
    assert!(!result.fallback_triggered);
    assert_eq!(result.mode_used, GateMode::Strict);
}

#[test]
fn cancelled_run_is_partial() {
    let config = synthetic_config();
    let provider = SyntheticProvider::new(42);
    let cancel = CancelToken::new();
    cancel.cancel();
    let result = run_single_backtest(&config, &provider, &cancel).unwrap();
    assert!(result.is_partial());
    assert!(result.report.cancelled);
}

/// Wraps the synthetic provider but reports UTC timestamps for one symbol.
struct MixedKindProvider {
    inner: SyntheticProvider,
    utc_symbol: String,
}

impl DataProvider for MixedKindProvider {
    fn name(&self) -> &str {
        "mixed"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<TaggedSeries, DataError> {
        let mut series = self.inner.fetch(symbol, start, end)?;
        if symbol == self.utc_symbol {
            series.timestamps = TimestampKind::Utc;
        }
        Ok(series)
    }
}

#[test]
fn timezone_mix_fails_loudly() {
    let config = synthetic_config();
    let provider = MixedKindProvider {
        inner: SyntheticProvider::new(42),
        utc_symbol: "CHARLIE".to_string(),
    };
    let err = run_single_backtest(&config, &provider, &CancelToken::new()).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("mismatch"), "unexpected error: {msg}");
    assert!(msg.contains("CHARLIE"));
}

/// A provider that knows nothing.
struct EmptyProvider;

impl DataProvider for EmptyProvider {
    fn name(&self) -> &str {
        "empty"
    }

    fn fetch(&self, symbol: &str, _: NaiveDate, _: NaiveDate) -> Result<TaggedSeries, DataError> {
        Err(DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        })
    }
}

#[test]
fn all_symbols_missing_is_an_error_not_a_silent_run() {
    let mut config = synthetic_config();
    config.benchmark_symbol = None;
    let err = load_universe_data(&EmptyProvider, &config).unwrap_err();
    assert!(matches!(err, LoadError::EmptyAfterExclusions(5)));
}

#[test]
fn missing_symbols_become_exclusions() {
    struct PartialProvider(SyntheticProvider);
    impl DataProvider for PartialProvider {
        fn name(&self) -> &str {
            "partial"
        }
        fn fetch(
            &self,
            symbol: &str,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<TaggedSeries, DataError> {
            if symbol == "DELTA" {
                return Err(DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                });
            }
            self.0.fetch(symbol, start, end)
        }
    }

    let config = synthetic_config();
    let provider = PartialProvider(SyntheticProvider::new(42));
    let result = run_single_backtest(&config, &provider, &CancelToken::new()).unwrap();
    assert!(result
        .report
        .diagnostics
        .excluded_symbols
        .contains_key("DELTA"));
}

#[test]
fn artifacts_written_under_run_id() {
    let config = synthetic_config();
    let provider = SyntheticProvider::new(42);
    let result = run_single_backtest(&config, &provider, &CancelToken::new()).unwrap();

    let out = tempfile::tempdir().unwrap();
    let dir = write_artifacts(&result, out.path()).unwrap();

    assert!(dir.ends_with(&result.run_id[..12]));
    for name in ["result.json", "trades.csv", "equity_curve.csv", "diagnostics.json", "params.toml"] {
        assert!(dir.join(name).exists(), "missing {name}");
    }

    // result.json round-trips as JSON and carries the envelope fields
    let raw = std::fs::read_to_string(dir.join("result.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["schema_version"], SCHEMA_VERSION);
    assert_eq!(value["run_id"], serde_json::json!(result.run_id));
    assert!(value["final_equity"].is_number());
}

#[test]
fn benchmark_fetch_failure_is_fatal() {
    struct NoBenchmark(SyntheticProvider);
    impl DataProvider for NoBenchmark {
        fn name(&self) -> &str {
            "no-benchmark"
        }
        fn fetch(
            &self,
            symbol: &str,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<TaggedSeries, DataError> {
            if symbol == "INDEX" {
                return Err(DataError::Unavailable {
                    symbol: symbol.to_string(),
                    reason: "source offline".to_string(),
                });
            }
            self.0.fetch(symbol, start, end)
        }
    }

    let config = synthetic_config();
    let err = run_single_backtest(
        &config,
        &NoBenchmark(SyntheticProvider::new(42)),
        &CancelToken::new(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("INDEX"));
}
