//! StageLab core - Stage-2 trend screening and breakout backtesting.
//!
//! Layers, bottom-up:
//! - `domain` - bars, positions, trades, the portfolio ledger
//! - `data` - provider trait, timestamp normalization, universe config
//! - `indicators` - derived columns and the augmented series
//! - `gate` - the trend template, breakout trigger, and VCP detection
//! - `engine` - the deterministic day-by-day simulation loop

pub mod data;
pub mod domain;
pub mod engine;
pub mod gate;
pub mod indicators;

pub use data::{DataError, DataProvider, Normalizer, TaggedSeries, TimestampKind, Universe};
pub use domain::{
    Bar, EquityPoint, ExitReason, Ledger, LedgerError, OpenRejection, Position, TradeRecord,
};
pub use engine::{run_simulation, CancelToken, Diagnostics, SimConfig, SimReport};
pub use gate::{
    check_breakout, vcp::detect_vcp, vcp::VcpConfig, vcp::VcpSignal, Breakout, GateConfig,
    GateMode, GateVerdict, TrendTemplate,
};
pub use indicators::IndicatorSeries;
