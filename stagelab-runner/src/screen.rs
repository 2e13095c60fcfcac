//! Point-in-time screening: trend template plus VCP detection at each
//! symbol's latest bar.

use serde::Serialize;

use stagelab_core::gate::{vcp::detect_vcp, vcp::VcpConfig, GateConfig, GateMode, TrendTemplate};
use stagelab_core::indicators::IndicatorSeries;
use stagelab_core::Diagnostics;

use crate::data_loader::LoadedData;

/// A symbol that cleared the gate and carries a tradeable VCP setup.
#[derive(Debug, Clone, Serialize)]
pub struct ScreenHit {
    pub symbol: String,
    pub close: f64,
    pub pivot: f64,
    pub entry_price: f64,
    pub stop_price: f64,
    pub target_price: f64,
    pub risk_pct: f64,
    pub risk_reward: f64,
    pub contraction_count: usize,
    pub dryup_confirmed: bool,
}

#[derive(Debug, Serialize)]
pub struct ScreenReport {
    pub hits: Vec<ScreenHit>,
    /// Symbols that passed the gate but showed no valid VCP base.
    pub gate_only: Vec<String>,
    pub diagnostics: Diagnostics,
}

/// Minimum reward-to-risk for a setup to make the list.
pub const MIN_RISK_REWARD: f64 = 2.0;

fn risk_reward(entry: f64, stop: f64, target: f64) -> f64 {
    let risk = entry - stop;
    if risk <= 0.0 {
        return 0.0;
    }
    (target - entry) / risk
}

enum Screened {
    Hit(ScreenHit),
    GateOnly,
    Ineligible,
}

fn screen_symbol(
    series: &IndicatorSeries,
    gate: &TrendTemplate,
    vcp: &VcpConfig,
    diagnostics: &mut Diagnostics,
) -> Screened {
    let Some(t) = series.len().checked_sub(1) else {
        return Screened::Ineligible;
    };
    let verdict = gate.evaluate(series, t);
    diagnostics.record_verdict(&verdict);
    if !verdict.eligible() {
        return Screened::Ineligible;
    }

    let Some(signal) = detect_vcp(series, t, vcp) else {
        return Screened::GateOnly;
    };
    let rr = risk_reward(signal.entry_price, signal.stop_price, signal.target_price);
    if rr < MIN_RISK_REWARD {
        return Screened::GateOnly;
    }

    Screened::Hit(ScreenHit {
        symbol: series.symbol.clone(),
        close: series.bars[t].close,
        pivot: signal.pivot,
        entry_price: signal.entry_price,
        stop_price: signal.stop_price,
        target_price: signal.target_price,
        risk_pct: signal.risk_pct,
        risk_reward: rr,
        contraction_count: signal.contraction_count,
        dryup_confirmed: signal.dryup_confirmed,
    })
}

/// Screen every loaded symbol at its most recent bar. Hits come back
/// sorted by reward-to-risk, best first; ties break alphabetically.
pub fn run_screen(data: &LoadedData, gate_config: &GateConfig, vcp: &VcpConfig, mode: GateMode) -> ScreenReport {
    let gate = TrendTemplate::new(gate_config.clone(), mode);
    let mut diagnostics = Diagnostics::new();
    for (symbol, reason) in &data.exclusions {
        diagnostics.record_exclusion(symbol.clone(), reason.clone());
    }

    let mut hits = Vec::new();
    let mut gate_only = Vec::new();
    for series in data.series.values() {
        match screen_symbol(series, &gate, vcp, &mut diagnostics) {
            Screened::Hit(hit) => hits.push(hit),
            Screened::GateOnly => gate_only.push(series.symbol.clone()),
            Screened::Ineligible => {}
        }
    }

    hits.sort_by(|a, b| {
        b.risk_reward
            .partial_cmp(&a.risk_reward)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });

    ScreenReport {
        hits,
        gate_only,
        diagnostics,
    }
}
