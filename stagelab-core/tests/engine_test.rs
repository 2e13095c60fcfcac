//! End-to-end engine scenarios on hand-built bar series.

use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;

use stagelab_core::domain::Bar;
use stagelab_core::engine::{run_simulation, CancelToken, SimConfig};
use stagelab_core::gate::GateMode;
use stagelab_core::indicators::IndicatorSeries;
use stagelab_core::ExitReason;

fn day(i: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 2).unwrap() + Duration::days(i as i64)
}

fn bar(i: usize, close: f64, high: f64, low: f64, volume: u64) -> Bar {
    Bar {
        date: day(i),
        open: close,
        high,
        low,
        close,
        volume,
    }
}

/// 260 bars: a steady uptrend, a high-volume pivot clearance on day 200,
/// a sideways hold, then a plunge through the stop on day 210 and decline
/// after.
fn breakout_bars() -> Vec<Bar> {
    let mut bars = Vec::with_capacity(260);
    for i in 0..200 {
        let c = 100.0 + 0.2 * i as f64;
        bars.push(bar(i, c, c + 0.5, c - 0.5, 1_000_000));
    }
    // day 200: close clears the trailing 50-day high on 3x volume
    bars.push(bar(200, 150.0, 151.0, 149.5, 3_000_000));
    // days 201-209: tight sideways hold above the stop
    for i in 201..210 {
        let c = 149.0 + 0.1 * (i - 201) as f64;
        bars.push(bar(i, c, c + 0.5, c - 0.5, 1_000_000));
    }
    // day 210: plunge well through the stop (and through the 50-day MA)
    bars.push(bar(210, 130.0, 131.0, 129.0, 2_000_000));
    // decline afterwards, no re-entry setup
    for i in 211..260 {
        let c = 129.0 - 0.3 * (i - 211) as f64;
        bars.push(bar(i, c, c + 0.5, c - 0.5, 1_000_000));
    }
    bars
}

/// A gentle downtrend that never satisfies the trend template.
fn downtrend_bars() -> Vec<Bar> {
    (0..260)
        .map(|i| {
            let c = 150.0 - 0.1 * i as f64;
            bar(i, c, c + 0.5, c - 0.5, 1_000_000)
        })
        .collect()
}

/// Flat tape: adequate volume, no trend, no breakout.
fn flat_bars() -> Vec<Bar> {
    (0..260)
        .map(|i| bar(i, 100.0, 100.5, 99.5, 1_000_000))
        .collect()
}

fn scenario_config() -> SimConfig {
    let mut cfg = SimConfig::new(day(0), day(259));
    cfg.initial_capital = 100_000.0;
    cfg.max_positions = 3;
    cfg.risk_per_trade = 0.02;
    cfg.commission = 0.0;
    cfg.target_multiple = Some(1.25);
    cfg.mode = GateMode::Strict;
    // series are 260 bars long; a full trading year of history would
    // leave only a handful of tradable days
    cfg.gate.min_history = 100;
    cfg
}

fn three_symbol_universe() -> BTreeMap<String, IndicatorSeries> {
    let mut series = BTreeMap::new();
    series.insert(
        "AAA".to_string(),
        IndicatorSeries::compute("AAA", breakout_bars(), None),
    );
    series.insert(
        "BBB".to_string(),
        IndicatorSeries::compute("BBB", downtrend_bars(), None),
    );
    series.insert(
        "CCC".to_string(),
        IndicatorSeries::compute("CCC", flat_bars(), None),
    );
    series
}

#[test]
fn breakout_entry_and_stop_out() {
    let cfg = scenario_config();
    let series = three_symbol_universe();
    let report = run_simulation(&cfg, &series, &[], &CancelToken::new());

    assert!(!report.is_partial());
    assert_eq!(report.trades.len(), 1, "exactly one round trip expected");

    let trade = &report.trades[0];
    assert_eq!(trade.symbol, "AAA");
    assert_eq!(trade.entry_date, day(200));
    assert_eq!(trade.entry_price, 150.0);
    assert_eq!(trade.exit_date, day(210));
    assert_eq!(trade.exit_price, 130.0);
    assert!(trade.realized_pnl < 0.0);

    assert_eq!(report.diagnostics.trades_opened, 1);
    assert_eq!(report.diagnostics.trades_closed, 1);
}

#[test]
fn stop_loss_wins_over_simultaneous_trend_break() {
    // on day 210 the close is below both the stop and the 50-day MA;
    // the recorded reason must be the stop
    let cfg = scenario_config();
    let series = three_symbol_universe();
    let report = run_simulation(&cfg, &series, &[], &CancelToken::new());

    let trade = &report.trades[0];
    let aaa = &series["AAA"];
    let t = aaa.date_index(day(210)).unwrap();
    assert!(aaa.bars[t].close < aaa.sma_50[t], "trend break also true");
    assert_eq!(trade.exit_reason, ExitReason::StopLoss);
}

#[test]
fn equity_curve_covers_every_calendar_day() {
    let cfg = scenario_config();
    let series = three_symbol_universe();
    let report = run_simulation(&cfg, &series, &[], &CancelToken::new());

    assert_eq!(report.equity_curve.len(), 260);
    assert_eq!(report.equity_curve[0].date, day(0));
    assert_eq!(report.equity_curve[259].date, day(259));
    // dates strictly ascending
    assert!(report
        .equity_curve
        .windows(2)
        .all(|w| w[0].date < w[1].date));
}

#[test]
fn cash_conservation_end_to_end() {
    let cfg = scenario_config();
    let series = three_symbol_universe();
    let report = run_simulation(&cfg, &series, &[], &CancelToken::new());

    let pnl_sum: f64 = report.trades.iter().map(|t| t.realized_pnl).sum();
    let expected = cfg.initial_capital + pnl_sum;
    assert!(
        (report.final_equity - expected).abs() <= 1e-6 * expected.abs(),
        "final {} vs expected {}",
        report.final_equity,
        expected
    );

    // entry day: position marked at entry price, so equity is unchanged
    let entry_day_equity = report.equity_curve[200].equity;
    assert!((entry_day_equity - cfg.initial_capital).abs() < 1e-6);
}

#[test]
fn capacity_blocks_third_simultaneous_entry() {
    // three identical breakout symbols, room for two
    let mut series = BTreeMap::new();
    for symbol in ["AAA", "BBB", "CCC"] {
        series.insert(
            symbol.to_string(),
            IndicatorSeries::compute(symbol, breakout_bars(), None),
        );
    }
    let mut cfg = scenario_config();
    cfg.max_positions = 2;
    let report = run_simulation(&cfg, &series, &[], &CancelToken::new());

    assert_eq!(report.diagnostics.trades_opened, 2);
    assert!(report.diagnostics.capacity_blocked >= 1);
    // lexicographic entry order: AAA and BBB got the slots
    let symbols: Vec<&str> = report.trades.iter().map(|t| t.symbol.as_str()).collect();
    assert!(symbols.contains(&"AAA"));
    assert!(symbols.contains(&"BBB"));
    assert!(!symbols.contains(&"CCC"));
}

#[test]
fn open_position_closed_at_end_of_period() {
    // truncate the scenario before the stop-out: the run must force-close
    let mut cfg = scenario_config();
    cfg.end = day(205);
    let series = three_symbol_universe();
    let report = run_simulation(&cfg, &series, &[], &CancelToken::new());

    assert_eq!(report.trades.len(), 1);
    let trade = &report.trades[0];
    assert_eq!(trade.exit_reason, ExitReason::EndOfPeriod);
    assert_eq!(trade.exit_date, day(205));
    assert!(!report.is_partial());
}

#[test]
fn cancellation_closes_out_and_marks_partial() {
    let cfg = scenario_config();
    let series = three_symbol_universe();
    let cancel = CancelToken::new();
    cancel.cancel();
    let report = run_simulation(&cfg, &series, &[], &cancel);
    assert!(report.cancelled);
    assert!(report.is_partial());
    assert!(report.trades.is_empty());
}

#[test]
fn data_gap_skips_day_without_failing() {
    let mut series = three_symbol_universe();
    // knock one mid-trend bar out of CCC
    let mut bars = flat_bars();
    bars.remove(150);
    series.insert(
        "CCC".to_string(),
        IndicatorSeries::compute("CCC", bars, None),
    );

    let cfg = scenario_config();
    let report = run_simulation(&cfg, &series, &[], &CancelToken::new());
    assert!(!report.is_partial());
    assert!(report.diagnostics.data_gap_skips >= 1);
    // the union calendar still covers all 260 days via AAA/BBB
    assert_eq!(report.equity_curve.len(), 260);
}

#[test]
fn zero_trades_run_is_complete_and_explained() {
    let mut series = BTreeMap::new();
    series.insert(
        "BBB".to_string(),
        IndicatorSeries::compute("BBB", downtrend_bars(), None),
    );
    let cfg = scenario_config();
    let report = run_simulation(&cfg, &series, &[], &CancelToken::new());

    assert!(report.trades.is_empty());
    assert!(!report.is_partial());
    assert_eq!(report.final_equity, cfg.initial_capital);
    assert!(report.diagnostics.gate_evaluations > 0);
    assert!(!report.diagnostics.failure_counts.is_empty());
    assert!(report.diagnostics.summary().contains("0 opened"));
}
