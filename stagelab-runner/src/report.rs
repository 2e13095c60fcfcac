//! Human-readable run summary.

use crate::runner::BacktestResult;

fn pct(v: f64) -> String {
    format!("{:.2}%", v * 100.0)
}

/// Render the summary block printed after a run.
pub fn render_summary(result: &BacktestResult) -> String {
    let m = &result.metrics;
    let mut out = String::new();

    out.push_str(&format!("Run {}\n", &result.run_id[..12.min(result.run_id.len())]));
    out.push_str(&format!(
        "Period: {} to {}\n",
        result.params.start_date, result.params.end_date
    ));
    out.push_str(&format!("Gate mode: {}", result.mode_used.as_str()));
    if result.fallback_triggered {
        out.push_str(" (fell back from strict)");
    }
    out.push('\n');
    if let Some(reason) = &result.report.aborted {
        out.push_str(&format!("ABORTED: {reason} (partial results below)\n"));
    } else if result.report.cancelled {
        out.push_str("CANCELLED (partial results below)\n");
    }
    out.push('\n');

    out.push_str(&format!("{:<22}{}\n", "Total return", pct(m.total_return)));
    out.push_str(&format!("{:<22}{}\n", "CAGR", pct(m.cagr)));
    out.push_str(&format!("{:<22}{:.2}\n", "Sharpe", m.sharpe_ratio));
    out.push_str(&format!("{:<22}{:.2}\n", "Sortino", m.sortino_ratio));
    out.push_str(&format!("{:<22}{}\n", "Max drawdown", pct(m.max_drawdown)));
    out.push_str(&format!("{:<22}{:.2}\n", "Final equity", result.report.final_equity));
    out.push('\n');

    out.push_str(&format!("{:<22}{}\n", "Trades", m.trade_count));
    if m.trade_count > 0 {
        out.push_str(&format!("{:<22}{}\n", "Win rate", pct(m.win_rate)));
        out.push_str(&format!("{:<22}{:.2}\n", "Profit factor", m.profit_factor));
        out.push_str(&format!("{:<22}{:.2}\n", "Expectancy", m.expectancy));
        out.push_str(&format!(
            "{:<22}{:.1} days\n",
            "Avg holding", m.avg_holding_days
        ));
    } else {
        // a zero-trade run must explain itself
        out.push_str("\nNo trades were taken. Gate diagnostics:\n");
        out.push_str(&result.report.diagnostics.summary());
        if let Some((name, count)) = result.report.diagnostics.top_failure() {
            out.push_str(&format!("Most common failure: {name} ({count}x)\n"));
        }
    }

    out
}
