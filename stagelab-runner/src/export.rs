//! Run artifacts on disk.
//!
//! Everything a run produces lands under `<out>/<run-id-prefix>/`:
//! `result.json` (the full envelope), `trades.csv`, `equity_curve.csv`,
//! `diagnostics.json` and `params.toml`.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use stagelab_core::domain::{EquityPoint, TradeRecord};

use crate::runner::BacktestResult;

/// Directory names use a short prefix of the run id; the full id lives
/// inside `result.json`.
const RUN_ID_PREFIX_LEN: usize = 12;

pub fn write_artifacts(result: &BacktestResult, out_dir: &Path) -> Result<PathBuf> {
    let prefix = &result.run_id[..RUN_ID_PREFIX_LEN.min(result.run_id.len())];
    let dir = out_dir.join(prefix);
    fs::create_dir_all(&dir)
        .with_context(|| format!("create artifact directory {}", dir.display()))?;

    write_json(&dir.join("result.json"), result)?;
    write_json(&dir.join("diagnostics.json"), &result.report.diagnostics)?;
    write_trades_csv(&dir.join("trades.csv"), &result.report.trades)?;
    write_equity_csv(&dir.join("equity_curve.csv"), &result.report.equity_curve)?;

    let params =
        toml::to_string_pretty(&result.params).context("serialize run params to TOML")?;
    fs::write(dir.join("params.toml"), params)
        .with_context(|| format!("write params.toml in {}", dir.display()))?;

    Ok(dir)
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("serialize {}", path.display()))?;
    fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn write_trades_csv(path: &Path, trades: &[TradeRecord]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut w = BufWriter::new(file);
    writeln!(
        w,
        "symbol,entry_date,entry_price,exit_date,exit_price,shares,exit_reason,pnl,pnl_pct,holding_days"
    )?;
    for t in trades {
        writeln!(
            w,
            "{},{},{:.4},{},{:.4},{},{},{:.2},{:.4},{}",
            t.symbol,
            t.entry_date,
            t.entry_price,
            t.exit_date,
            t.exit_price,
            t.shares,
            t.exit_reason.as_str(),
            t.realized_pnl,
            t.realized_pnl_pct,
            t.holding_days,
        )?;
    }
    w.flush().context("flush trades.csv")?;
    Ok(())
}

pub fn write_equity_csv(path: &Path, curve: &[EquityPoint]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut w = BufWriter::new(file);
    writeln!(w, "date,equity")?;
    for point in curve {
        writeln!(w, "{},{:.2}", point.date, point.equity)?;
    }
    w.flush().context("flush equity_curve.csv")?;
    Ok(())
}
