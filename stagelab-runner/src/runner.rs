//! Single-backtest orchestration: load data, simulate, score, and fall
//! back to relaxed gating when the strict run barely trades.

use serde::Serialize;
use thiserror::Error;

use stagelab_core::engine::{run_simulation, CancelToken, SimConfig, SimReport};
use stagelab_core::gate::GateMode;
use stagelab_core::DataProvider;

use crate::config::{RunConfig, RunId};
use crate::data_loader::{load_universe_data, LoadError, LoadedData};
use crate::metrics::PerformanceMetrics;

/// Bump when the result layout changes shape.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("invalid run configuration: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// Complete, serializable outcome of one backtest run.
#[derive(Debug, Serialize)]
pub struct BacktestResult {
    pub schema_version: u32,
    pub run_id: RunId,
    pub params: RunConfig,
    pub metrics: PerformanceMetrics,
    #[serde(flatten)]
    pub report: SimReport,
    /// Gate mode the reported simulation actually ran with.
    pub mode_used: GateMode,
    pub fallback_triggered: bool,
}

impl BacktestResult {
    pub fn is_partial(&self) -> bool {
        self.report.is_partial()
    }
}

fn sim_config(config: &RunConfig, mode: GateMode) -> SimConfig {
    let mut sim = SimConfig::new(config.start_date, config.end_date);
    sim.initial_capital = config.initial_capital;
    sim.max_positions = config.max_positions;
    sim.risk_per_trade = config.risk_per_trade;
    sim.commission = config.commission;
    sim.target_multiple = config.target_multiple;
    sim.gate = config.gate.clone();
    sim.mode = mode;
    sim
}

fn simulate(config: &RunConfig, data: &LoadedData, mode: GateMode, cancel: &CancelToken) -> SimReport {
    let sim = sim_config(config, mode);
    let mut report = run_simulation(&sim, &data.series, &data.benchmark_dates, cancel);
    for (symbol, reason) in &data.exclusions {
        report
            .diagnostics
            .record_exclusion(symbol.clone(), reason.clone());
    }
    report
}

/// Run one backtest end to end.
///
/// With `auto_fallback` on, a strict run that completes cleanly but closes
/// fewer than `min_trades_threshold` trades is rerun once in relaxed mode;
/// the relaxed outcome is reported with `fallback_triggered` set.
pub fn run_single_backtest(
    config: &RunConfig,
    provider: &dyn DataProvider,
    cancel: &CancelToken,
) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let data = load_universe_data(provider, config)?;

    let mut mode_used = config.mode;
    let mut report = simulate(config, &data, mode_used, cancel);
    let mut fallback_triggered = false;

    let too_few = (report.trades.len() as u64) < config.min_trades_threshold;
    if config.auto_fallback && mode_used == GateMode::Strict && too_few && !report.is_partial() {
        mode_used = GateMode::Relaxed;
        report = simulate(config, &data, mode_used, cancel);
        fallback_triggered = true;
    }

    let metrics = PerformanceMetrics::compute(&report.equity_curve, &report.trades);

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id: config.run_id(),
        params: config.clone(),
        metrics,
        report,
        mode_used,
        fallback_triggered,
    })
}
