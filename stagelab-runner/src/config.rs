//! Serializable run configuration.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use stagelab_core::{GateConfig, GateMode, VcpConfig};

/// Unique identifier for a run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("start date {start} is not before end date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("initial capital must be positive, got {0}")]
    NonPositiveCapital(f64),

    #[error("risk per trade must be in (0, 1], got {0}")]
    InvalidRisk(f64),

    #[error("commission must be in [0, 1), got {0}")]
    InvalidCommission(f64),

    #[error("max positions must be at least 1")]
    NoPositions,

    #[error("universe is empty")]
    EmptyUniverse,

    #[error("read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Everything needed to reproduce a run. Two identical configs hash to
/// the same `RunId`, which travels with every artifact the run writes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    /// Backtest start date (inclusive).
    pub start_date: NaiveDate,

    /// Backtest end date (inclusive).
    pub end_date: NaiveDate,

    /// Symbols to trade.
    pub universe: Vec<String>,

    /// Benchmark for the RS line. `None` disables RS conditions.
    #[serde(default)]
    pub benchmark_symbol: Option<String>,

    #[serde(default = "default_initial_capital")]
    pub initial_capital: f64,

    #[serde(default = "default_max_positions")]
    pub max_positions: usize,

    /// Fraction of equity risked per trade.
    #[serde(default = "default_risk_per_trade")]
    pub risk_per_trade: f64,

    /// Commission rate per leg.
    #[serde(default = "default_commission")]
    pub commission: f64,

    /// Profit target as a multiple of entry; `None` disables targets.
    #[serde(default = "default_target_multiple")]
    pub target_multiple: Option<f64>,

    #[serde(default)]
    pub gate: GateConfig,

    #[serde(default)]
    pub vcp: VcpConfig,

    #[serde(default = "default_mode")]
    pub mode: GateMode,

    /// Rerun once in relaxed mode when the strict run closes fewer trades
    /// than `min_trades_threshold`.
    #[serde(default = "default_auto_fallback")]
    pub auto_fallback: bool,

    #[serde(default = "default_min_trades_threshold")]
    pub min_trades_threshold: u64,
}

fn default_initial_capital() -> f64 {
    100_000.0
}
fn default_max_positions() -> usize {
    5
}
fn default_risk_per_trade() -> f64 {
    0.01
}
fn default_commission() -> f64 {
    0.001
}
fn default_target_multiple() -> Option<f64> {
    Some(1.25)
}
fn default_mode() -> GateMode {
    GateMode::Strict
}
fn default_auto_fallback() -> bool {
    true
}
fn default_min_trades_threshold() -> u64 {
    5
}

impl RunConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Deterministic content hash of this configuration.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_string(self).expect("RunConfig serialization failed");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start_date >= self.end_date {
            return Err(ConfigError::InvalidDateRange {
                start: self.start_date,
                end: self.end_date,
            });
        }
        if self.initial_capital <= 0.0 {
            return Err(ConfigError::NonPositiveCapital(self.initial_capital));
        }
        if self.risk_per_trade <= 0.0 || self.risk_per_trade > 1.0 {
            return Err(ConfigError::InvalidRisk(self.risk_per_trade));
        }
        if self.commission < 0.0 || self.commission >= 1.0 {
            return Err(ConfigError::InvalidCommission(self.commission));
        }
        if self.max_positions == 0 {
            return Err(ConfigError::NoPositions);
        }
        if self.universe.is_empty() {
            return Err(ConfigError::EmptyUniverse);
        }
        Ok(())
    }

    /// Universe symbols sorted and deduplicated - the canonical iteration
    /// order for the run.
    pub fn sorted_universe(&self) -> Vec<String> {
        let mut symbols = self.universe.clone();
        symbols.sort();
        symbols.dedup();
        symbols
    }
}
