//! Per-run diagnostics.
//!
//! One `Diagnostics` value is owned by each simulation - nothing here is
//! shared or global, so concurrent runs never mix counters. A run with
//! zero trades is a normal outcome; the failure breakdown explains it.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::gate::GateVerdict;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    /// Total gate evaluations performed.
    pub gate_evaluations: u64,
    /// Evaluations where every condition held.
    pub gate_passes: u64,
    /// Failed-condition counts, keyed by `GateVerdict::CONDITIONS` names.
    pub failure_counts: BTreeMap<&'static str, u64>,
    /// Eligible candidates with no breakout trigger that day.
    pub breakout_rejections: u64,
    /// Entries rejected because sizing produced zero shares or cost
    /// exceeded cash.
    pub insufficient_capital: u64,
    /// Candidates sized to an inverted or zero risk (entry ≤ stop).
    pub invalid_risk: u64,
    /// Days on which a full book blocked at least one candidate.
    pub capacity_blocked: u64,
    /// Per-symbol-day skips due to a missing bar.
    pub data_gap_skips: u64,
    pub trades_opened: u64,
    pub trades_closed: u64,
    /// Symbols dropped before the loop, with reasons.
    pub excluded_symbols: BTreeMap<String, String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one gate verdict into the counters.
    pub fn record_verdict(&mut self, verdict: &GateVerdict) {
        self.gate_evaluations += 1;
        if verdict.eligible() {
            self.gate_passes += 1;
            return;
        }
        for name in verdict.failures() {
            *self.failure_counts.entry(name).or_insert(0) += 1;
        }
    }

    pub fn record_exclusion(&mut self, symbol: impl Into<String>, reason: impl Into<String>) {
        self.excluded_symbols.insert(symbol.into(), reason.into());
    }

    /// Most frequent failing condition, if any evaluation failed.
    pub fn top_failure(&self) -> Option<(&'static str, u64)> {
        self.failure_counts
            .iter()
            .max_by_key(|(name, count)| (*count, std::cmp::Reverse(*name)))
            .map(|(name, count)| (*name, *count))
    }

    /// Human-readable breakdown for CLI output.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "Gate evaluations: {} ({} passed)\n",
            self.gate_evaluations, self.gate_passes
        ));
        for (name, count) in &self.failure_counts {
            out.push_str(&format!("  failed {name}: {count}\n"));
        }
        out.push_str(&format!(
            "Breakout rejections: {}\n",
            self.breakout_rejections
        ));
        out.push_str(&format!(
            "Blocked: capacity {} / capital {} / invalid risk {}\n",
            self.capacity_blocked, self.insufficient_capital, self.invalid_risk
        ));
        out.push_str(&format!("Data-gap skips: {}\n", self.data_gap_skips));
        if !self.excluded_symbols.is_empty() {
            out.push_str("Excluded symbols:\n");
            for (symbol, reason) in &self.excluded_symbols {
                out.push_str(&format!("  {symbol}: {reason}\n"));
            }
        }
        out.push_str(&format!(
            "Trades: {} opened, {} closed\n",
            self.trades_opened, self.trades_closed
        ));
        out
    }
}
