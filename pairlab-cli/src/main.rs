//! PairLab CLI — pair backtest, cointegration check, sweep, and synthetic data commands.
//!
//! Commands:
//! - `run` — execute a backtest from a TOML config file and save artifacts
//! - `coint` — run only the Engle–Granger test on the configured pair
//! - `sweep` — run the same pair across several entry multipliers
//! - `synth` — write a deterministic synthetic pair as CSV
//!
//! Logging goes to stderr through `tracing`; set `RUST_LOG` to change the level.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use pairlab_core::synthetic::{generate_pair, SyntheticConfig, SyntheticKind};
use pairlab_core::{AccountingMode, CointegrationReport, CointegrationTester};
use pairlab_runner::data_loader::{load_prices, write_pair_csv};
use pairlab_runner::runner::run_on_prices;
use pairlab_runner::{save_artifacts, BacktestConfig, RunOutput, Sweep, SweepPoint};

#[derive(Parser)]
#[command(name = "pairlab", about = "PairLab CLI — pairs-trading stat-arb backtester")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Override the entry multiplier k.
        #[arg(long)]
        entry_multiplier: Option<f64>,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Print the summary only; write no artifacts.
        #[arg(long, default_value_t = false)]
        no_artifacts: bool,

        /// Print the full run output as JSON instead of the summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Run the Engle–Granger cointegration test on the configured pair.
    Coint {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,
    },
    /// Run the configured pair across several entry multipliers.
    Sweep {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Entry multipliers, comma-separated (e.g. 1,1.5,2,2.5).
        #[arg(long, value_delimiter = ',', default_value = "1.0,1.5,2.0,2.5,3.0")]
        k: Vec<f64>,

        /// Also sweep both accounting modes.
        #[arg(long, default_value_t = false)]
        both_accounting: bool,

        /// Run sequentially instead of in parallel.
        #[arg(long, default_value_t = false)]
        serial: bool,
    },
    /// Write a synthetic pair as `date,<leg1>,<leg2>` CSV.
    Synth {
        /// Output CSV path.
        #[arg(long)]
        out: PathBuf,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        #[arg(long, default_value_t = 500)]
        periods: usize,

        /// First date (YYYY-MM-DD).
        #[arg(long, default_value = "2020-01-01")]
        start: String,

        #[arg(long, value_enum, default_value_t = SynthKind::Cointegrated)]
        kind: SynthKind,

        /// Hedge ratio of the cointegrated pair.
        #[arg(long, default_value_t = 1.0)]
        hedge_ratio: f64,

        /// AR(1) persistence of the cointegrated spread, in [0, 1).
        #[arg(long, default_value_t = 0.5)]
        persistence: f64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SynthKind {
    Independent,
    Cointegrated,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            entry_multiplier,
            output_dir,
            no_artifacts,
            json,
        } => run_backtest_cmd(config, entry_multiplier, output_dir, no_artifacts, json),
        Commands::Coint { config } => run_coint_cmd(config),
        Commands::Sweep {
            config,
            k,
            both_accounting,
            serial,
        } => run_sweep_cmd(config, k, both_accounting, serial),
        Commands::Synth {
            out,
            seed,
            periods,
            start,
            kind,
            hedge_ratio,
            persistence,
        } => run_synth_cmd(out, seed, periods, &start, kind, hedge_ratio, persistence),
    }
}

fn load_config(path: &Path) -> Result<BacktestConfig> {
    BacktestConfig::from_file(path)
        .with_context(|| format!("failed to load config {}", path.display()))
}

fn run_backtest_cmd(
    config_path: PathBuf,
    entry_multiplier: Option<f64>,
    output_dir: PathBuf,
    no_artifacts: bool,
    json: bool,
) -> Result<()> {
    let mut config = load_config(&config_path)?;
    if let Some(k) = entry_multiplier {
        config = config.with_entry_multiplier(k);
        config.validate()?;
    }

    let prices = load_prices(&config)?;
    let output = run_on_prices(&config, &prices)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_summary(&output);
    }

    if !no_artifacts {
        let run_dir = save_artifacts(&output, &prices.series, &output_dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }

    Ok(())
}

fn run_coint_cmd(config_path: PathBuf) -> Result<()> {
    let config = load_config(&config_path)?;
    let prices = load_prices(&config)?;
    let tester = CointegrationTester::new(config.cointegration.min_sample)?;
    let report = tester.report(&prices.series, config.cointegration.significance)?;

    println!();
    println!("=== Cointegration: {} / {} ===", config.pair.leg1, config.pair.leg2);
    println!(
        "Period:         {} to {} ({} rows)",
        prices.series.first_timestamp(),
        prices.series.last_timestamp(),
        prices.series.len()
    );
    print_cointegration(&report);
    if prices.is_synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    println!();
    Ok(())
}

fn run_sweep_cmd(
    config_path: PathBuf,
    k: Vec<f64>,
    both_accounting: bool,
    serial: bool,
) -> Result<()> {
    if k.is_empty() {
        bail!("--k needs at least one entry multiplier");
    }
    let config = load_config(&config_path)?;
    let mut sweep = Sweep::new(k).with_parallelism(!serial);
    if both_accounting {
        sweep = sweep.with_accounting(vec![AccountingMode::PriceLevel, AccountingMode::PriceDelta]);
    }
    info!(runs = sweep.size(), "sweeping");
    let points = sweep.run(&config)?;
    print_sweep(&config, &points);
    Ok(())
}

fn run_synth_cmd(
    out: PathBuf,
    seed: u64,
    periods: usize,
    start: &str,
    kind: SynthKind,
    hedge_ratio: f64,
    persistence: f64,
) -> Result<()> {
    let start_date = NaiveDate::parse_from_str(start, "%Y-%m-%d")
        .with_context(|| format!("bad --start '{start}' (expected YYYY-MM-DD)"))?;
    let config = SyntheticConfig {
        seed,
        periods,
        start_date,
        kind: match kind {
            SynthKind::Independent => SyntheticKind::IndependentWalks,
            SynthKind::Cointegrated => SyntheticKind::Cointegrated {
                hedge_ratio,
                persistence,
            },
        },
        ..SyntheticConfig::default()
    };
    let series = generate_pair(&config)?;
    write_pair_csv(&out, &series, "leg1", "leg2")?;
    println!("Wrote {} rows to {}", series.len(), out.display());
    Ok(())
}

// ── Output ──

fn print_cointegration(report: &CointegrationReport) {
    let r = &report.result;
    println!("Statistic:      {:.4}", r.test_statistic);
    println!("p-value:        {:.4}", r.p_value);
    println!(
        "Critical:       1% {:.3}  5% {:.3}  10% {:.3}",
        r.critical_values.one_pct, r.critical_values.five_pct, r.critical_values.ten_pct
    );
    println!("Lags / nobs:    {} / {}", r.lags_used, r.nobs);
    println!(
        "Verdict:        {} at {}",
        if report.verdict.is_cointegrated() {
            "cointegrated"
        } else {
            "NOT cointegrated"
        },
        report.significance
    );
}

fn print_summary(output: &RunOutput) {
    let result = &output.report.result;
    let m = &output.metrics;
    println!();
    println!("=== Pair Backtest ===");
    println!("Pair:           {} / {}", output.leg1, output.leg2);
    println!("Period:         {} to {}", output.start_date, output.end_date);
    println!(
        "Steps:          {} ({} warmup)",
        result.len(),
        output.report.spread.warmup()
    );
    println!("Run ID:         {}", &output.run_id[..16]);
    println!();
    println!("--- Cointegration ---");
    print_cointegration(&output.report.cointegration);
    println!();
    println!("--- Performance ---");
    println!("Initial:        {:.2}", result.initial_capital());
    println!("Final:          {:.2}", result.final_portfolio_value());
    println!("Total Return:   {:.2}%", m.total_return * 100.0);
    println!("Sharpe:         {:.3}", m.sharpe);
    println!("Max Drawdown:   {:.2}%", m.max_drawdown * 100.0);
    println!("Entries:        {}", m.entries);
    println!("Round Trips:    {}", m.round_trips);
    println!("Avg Holding:    {:.1} steps", m.avg_holding_steps);
    println!("In Market:      {:.1}%", m.time_in_market * 100.0);
    match m.half_life {
        Some(h) => println!("Half-Life:      {h:.1} steps"),
        None => println!("Half-Life:      n/a (spread not mean reverting)"),
    }
    if output.is_synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    println!();
}

fn print_sweep(config: &BacktestConfig, points: &[SweepPoint]) {
    println!();
    println!("=== Sweep: {} / {} ===", config.pair.leg1, config.pair.leg2);
    println!(
        "{:>6} {:<12} {:>14} {:>10} {:>8} {:>10} {:>8}",
        "k", "accounting", "final", "return", "sharpe", "max dd", "trips"
    );
    println!("{}", "-".repeat(74));
    for p in points {
        let accounting = match p.accounting {
            AccountingMode::PriceLevel => "price_level",
            AccountingMode::PriceDelta => "price_delta",
        };
        println!(
            "{:>6.2} {:<12} {:>14.2} {:>9.2}% {:>8.3} {:>9.2}% {:>8}",
            p.entry_multiplier,
            accounting,
            p.final_value,
            p.total_return * 100.0,
            p.sharpe,
            p.max_drawdown * 100.0,
            p.round_trips
        );
    }
    println!();
}
