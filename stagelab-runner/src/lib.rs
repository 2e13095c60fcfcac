//! StageLab runner - configuration, data loading, orchestration, metrics
//! and artifacts around the core engine.
//!
//! The core crate is pure compute; everything touching the filesystem,
//! thread pools or run bookkeeping lives here.

pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod report;
pub mod runner;
pub mod screen;

pub use config::{ConfigError, RunConfig, RunId};
pub use data_loader::{load_universe_data, CsvBarProvider, LoadError, LoadedData};
pub use export::write_artifacts;
pub use metrics::PerformanceMetrics;
pub use report::render_summary;
pub use runner::{run_single_backtest, BacktestResult, RunError, SCHEMA_VERSION};
pub use screen::{run_screen, ScreenHit, ScreenReport};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn result_types_are_send_sync() {
        assert_send::<BacktestResult>();
        assert_sync::<BacktestResult>();
        assert_send::<PerformanceMetrics>();
        assert_sync::<PerformanceMetrics>();
    }

    #[test]
    fn config_is_send_sync() {
        assert_send::<RunConfig>();
        assert_sync::<RunConfig>();
    }
}
