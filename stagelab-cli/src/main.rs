//! Command-line entry point.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use stagelab_core::data::{DataProvider, SyntheticProvider, Universe};
use stagelab_core::engine::CancelToken;
use stagelab_core::gate::GateMode;
use stagelab_runner::config::RunConfig;
use stagelab_runner::data_loader::load_universe_data;
use stagelab_runner::export::write_artifacts;
use stagelab_runner::report::render_summary;
use stagelab_runner::runner::run_single_backtest;
use stagelab_runner::screen::run_screen;
use stagelab_runner::CsvBarProvider;

#[derive(Parser)]
#[command(name = "stagelab", about = "Stage-2 trend screening and breakout backtesting")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct DataSource {
    /// Directory of per-symbol CSV files (SYMBOL.csv).
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Use the deterministic synthetic provider with this seed.
    #[arg(long, conflicts_with = "data_dir")]
    seed: Option<u64>,
}

impl DataSource {
    fn provider(&self) -> Result<Box<dyn DataProvider>> {
        match (&self.data_dir, self.seed) {
            (Some(dir), None) => {
                if !dir.is_dir() {
                    bail!("data directory {} does not exist", dir.display());
                }
                Ok(Box::new(CsvBarProvider::new(dir.clone())))
            }
            (_, Some(seed)) => Ok(Box::new(SyntheticProvider::new(seed))),
            (None, None) => Ok(Box::new(SyntheticProvider::new(42))),
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Run a backtest from a TOML config.
    Run {
        /// Path to the run configuration.
        #[arg(long, short)]
        config: PathBuf,

        /// Directory to write run artifacts into.
        #[arg(long, default_value = "runs")]
        out: PathBuf,

        /// Force relaxed gating regardless of the config.
        #[arg(long)]
        relaxed: bool,

        /// Drop the benchmark and the RS conditions with it.
        #[arg(long)]
        no_benchmark: bool,

        /// Sector universe TOML overriding the symbol list in the config.
        #[arg(long)]
        universe: Option<PathBuf>,

        #[command(flatten)]
        data: DataSource,
    },

    /// Screen the universe for current setups.
    Screen {
        #[arg(long, short)]
        config: PathBuf,

        #[arg(long)]
        relaxed: bool,

        /// Emit the full screen report as JSON instead of a table.
        #[arg(long)]
        json: bool,

        /// Sector universe TOML overriding the symbol list in the config.
        #[arg(long)]
        universe: Option<PathBuf>,

        #[command(flatten)]
        data: DataSource,
    },

    /// Print a universe file: the config's symbol list as sector TOML,
    /// or a starter universe when no config is given.
    Universe {
        #[arg(long, short)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            config,
            out,
            relaxed,
            no_benchmark,
            universe,
            data,
        } => cmd_run(&config, &out, relaxed, no_benchmark, universe.as_deref(), &data),
        Command::Screen {
            config,
            relaxed,
            json,
            universe,
            data,
        } => cmd_screen(&config, relaxed, json, universe.as_deref(), &data),
        Command::Universe { config } => cmd_universe(config.as_deref()),
    }
}

fn load_config(
    path: &Path,
    relaxed: bool,
    no_benchmark: bool,
    universe: Option<&Path>,
) -> Result<RunConfig> {
    let mut config = RunConfig::from_file(path)
        .with_context(|| format!("load run config {}", path.display()))?;
    if relaxed {
        config.mode = GateMode::Relaxed;
        config.auto_fallback = false;
    }
    if no_benchmark {
        config.benchmark_symbol = None;
    }
    if let Some(universe_path) = universe {
        let universe = Universe::from_file(universe_path)
            .with_context(|| format!("load universe {}", universe_path.display()))?;
        config.universe = universe.symbols();
        config.validate()?;
    }
    Ok(config)
}

fn cmd_run(
    config_path: &Path,
    out: &Path,
    relaxed: bool,
    no_benchmark: bool,
    universe: Option<&Path>,
    data: &DataSource,
) -> Result<()> {
    let config = load_config(config_path, relaxed, no_benchmark, universe)?;
    let provider = data.provider()?;
    let cancel = CancelToken::new();

    println!(
        "Running {} symbols, {} to {} ({} data)...",
        config.sorted_universe().len(),
        config.start_date,
        config.end_date,
        provider.name(),
    );

    let result = run_single_backtest(&config, provider.as_ref(), &cancel)?;
    println!("{}", render_summary(&result));

    let dir = write_artifacts(&result, out)?;
    println!("Artifacts written to {}", dir.display());
    Ok(())
}

fn cmd_screen(
    config_path: &Path,
    relaxed: bool,
    json: bool,
    universe: Option<&Path>,
    data: &DataSource,
) -> Result<()> {
    let config = load_config(config_path, relaxed, false, universe)?;
    let provider = data.provider()?;
    let loaded = load_universe_data(provider.as_ref(), &config)?;
    let report = run_screen(&loaded, &config.gate, &config.vcp, config.mode);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if report.hits.is_empty() {
        println!("No setups found.");
    } else {
        println!(
            "{:<8} {:>10} {:>10} {:>10} {:>10} {:>8} {:>6}",
            "symbol", "close", "entry", "stop", "target", "r:r", "legs"
        );
        for hit in &report.hits {
            println!(
                "{:<8} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>8.2} {:>6}",
                hit.symbol,
                hit.close,
                hit.entry_price,
                hit.stop_price,
                hit.target_price,
                hit.risk_reward,
                hit.contraction_count,
            );
        }
    }
    if !report.gate_only.is_empty() {
        println!(
            "\nPassed the gate, no tradeable base: {}",
            report.gate_only.join(", ")
        );
    }
    println!();
    println!("{}", report.diagnostics.summary());
    Ok(())
}

fn cmd_universe(config_path: Option<&Path>) -> Result<()> {
    let universe = match config_path {
        Some(path) => {
            let config = RunConfig::from_file(path)
                .with_context(|| format!("load run config {}", path.display()))?;
            Universe::from_symbols(config.sorted_universe())
        }
        None => Universe::default_us(),
    };
    println!("{}", universe.to_toml()?);
    Ok(())
}
