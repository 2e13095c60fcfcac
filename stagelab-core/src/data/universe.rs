//! Universe configuration - sector-organized ticker lists.
//!
//! Stored as a TOML file mapping sector names to member tickers. The
//! engine only ever consumes the flattened, sorted, deduplicated symbol
//! list, so iteration order is stable regardless of how the file is laid
//! out.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UniverseError {
    #[error("read universe file: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse universe TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// The complete universe configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Universe {
    pub sectors: BTreeMap<String, Vec<String>>,
}

impl Universe {
    /// Load a universe from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, UniverseError> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_toml(&content)?)
    }

    /// Parse a universe from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Build a universe from a flat symbol list (one "All" sector).
    pub fn from_symbols(symbols: impl IntoIterator<Item = String>) -> Self {
        let mut sectors = BTreeMap::new();
        sectors.insert("All".to_string(), symbols.into_iter().collect());
        Self { sectors }
    }

    /// All tickers, sorted and deduplicated. This is the canonical
    /// iteration order everywhere downstream.
    pub fn symbols(&self) -> Vec<String> {
        let mut all: Vec<String> = self.sectors.values().flatten().cloned().collect();
        all.sort();
        all.dedup();
        all
    }

    /// Tickers for a specific sector.
    pub fn sector_tickers(&self, sector: &str) -> Option<&[String]> {
        self.sectors.get(sector).map(|v| v.as_slice())
    }

    pub fn sector_names(&self) -> Vec<&str> {
        self.sectors.keys().map(|s| s.as_str()).collect()
    }

    pub fn ticker_count(&self) -> usize {
        self.symbols().len()
    }

    /// A small default US large-cap universe for demos and smoke tests.
    pub fn default_us() -> Self {
        let mut sectors = BTreeMap::new();

        sectors.insert(
            "Technology".into(),
            ["AAPL", "MSFT", "GOOGL", "NVDA", "META", "AVGO", "CRM", "ADBE"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );

        sectors.insert(
            "Healthcare".into(),
            ["JNJ", "UNH", "ABBV", "MRK", "LLY", "TMO"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );

        sectors.insert(
            "Finance".into(),
            ["JPM", "BAC", "GS", "MS", "BLK", "SCHW", "AXP", "V"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );

        sectors.insert(
            "Consumer".into(),
            ["WMT", "COST", "HD", "MCD", "NKE", "SBUX"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );

        Self { sectors }
    }

    /// Serialize the universe to TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
