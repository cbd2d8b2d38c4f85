//! Reporting and export — JSON, CSV, and Markdown artifact generation.
//!
//! - **JSON**: the full `RunOutput`, round-trippable, with schema versioning
//! - **CSV**: per-step series, entry/exit markers, threshold levels
//! - **Markdown**: a human-readable single-run report
//!
//! All persisted artifacts include a `schema_version` field. Newer versions are
//! rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::info;

use pairlab_core::{HedgeFit, PriceSeries};

use crate::runner::{RunOutput, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `RunOutput` to pretty JSON.
pub fn export_json(output: &RunOutput) -> Result<String> {
    serde_json::to_string_pretty(output).context("failed to serialize RunOutput to JSON")
}

/// Deserialize a `RunOutput` from JSON, rejecting newer schema versions.
pub fn import_json(json: &str) -> Result<RunOutput> {
    let output: RunOutput =
        serde_json::from_str(json).context("failed to deserialize RunOutput from JSON")?;
    if output.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            output.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(output)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Per-step series: date, leg1, leg2, spread, position, portfolio_value.
///
/// Spread is empty inside a rolling warmup.
pub fn export_series_csv(output: &RunOutput, prices: &PriceSeries) -> Result<String> {
    let steps = output.report.result.steps();
    if steps.len() != prices.len() {
        bail!(
            "price series has {} rows but the run has {} steps",
            prices.len(),
            steps.len()
        );
    }
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "leg1", "leg2", "spread", "position", "portfolio_value"])?;
    for (step, point) in steps.iter().zip(prices) {
        wtr.write_record([
            step.timestamp.to_string(),
            format!("{:.6}", point.leg1),
            format!("{:.6}", point.leg2),
            fmt_optional(step.spread, 6),
            step.position.as_str().to_string(),
            format!("{:.2}", step.portfolio_value),
        ])?;
    }
    finish(wtr)
}

/// Entry and exit markers: date, kind, spread.
pub fn export_markers_csv(output: &RunOutput) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "kind", "spread"])?;
    for step in output.report.result.steps() {
        if let Some(kind) = step.event {
            wtr.write_record([
                step.timestamp.to_string(),
                kind.as_str().to_string(),
                format!("{:.6}", step.spread),
            ])?;
        }
    }
    finish(wtr)
}

/// Threshold levels per step: date, entry, lower_entry, exit. Empty while undefined.
pub fn export_thresholds_csv(output: &RunOutput) -> Result<String> {
    let result = &output.report.result;
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "entry", "lower_entry", "exit"])?;
    for step in result.steps() {
        let levels = result.thresholds().at(step.index);
        let cell = |f: fn(&pairlab_core::Thresholds) -> f64| {
            levels.as_ref().map_or(String::new(), |t| format!("{:.6}", f(t)))
        };
        wtr.write_record([
            step.timestamp.to_string(),
            cell(|t| t.entry),
            cell(|t| t.lower_entry()),
            cell(|t| t.exit),
        ])?;
    }
    finish(wtr)
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a single run.
///
/// Creates a directory named `{leg1}_{leg2}_{timestamp}/` under `output_dir`
/// containing:
/// - `manifest.json` — the full `RunOutput`
/// - `series.csv` — per-step prices, spread, position, portfolio value
/// - `markers.csv` — entry/exit events
/// - `thresholds.csv` — threshold levels
/// - `report.md` — Markdown summary
///
/// Returns the path to the created directory.
pub fn save_artifacts(
    output: &RunOutput,
    prices: &PriceSeries,
    output_dir: &Path,
) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}_{}",
        output.leg1,
        output.leg2,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let files = [
        ("manifest.json", export_json(output)?),
        ("series.csv", export_series_csv(output, prices)?),
        ("markers.csv", export_markers_csv(output)?),
        ("thresholds.csv", export_thresholds_csv(output)?),
        ("report.md", generate_report(output)),
    ];
    for (name, contents) in files {
        let path = run_dir.join(name);
        std::fs::write(&path, contents)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    info!(dir = %run_dir.display(), "artifacts saved");
    Ok(run_dir)
}

/// Load a `RunOutput` from an artifact directory's manifest.json.
///
/// Rejects newer schema versions.
pub fn load_artifacts(dir: &Path) -> Result<RunOutput> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}

// ─── Markdown report ────────────────────────────────────────────────

/// Generate a Markdown report for a single run.
pub fn generate_report(output: &RunOutput) -> String {
    let mut md = String::with_capacity(2048);
    let report = &output.report;
    let config = &output.config;

    md.push_str(&format!("# Pair Backtest: {} / {}\n\n", output.leg1, output.leg2));

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Run ID | {} |\n", output.run_id));
    md.push_str(&format!(
        "| Period | {} to {} |\n",
        output.start_date, output.end_date
    ));
    md.push_str(&format!("| Steps | {} |\n", report.result.len()));
    md.push_str(&format!(
        "| Initial Capital | {:.0} |\n",
        report.result.initial_capital()
    ));
    md.push_str(&format!("| Dataset Hash | {} |\n", output.dataset_hash));
    if output.is_synthetic {
        md.push_str("| Data | **SYNTHETIC** |\n");
    }
    md.push('\n');

    let c = &report.cointegration;
    md.push_str("## Cointegration (Engle–Granger)\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Test Statistic | {:.4} |\n", c.result.test_statistic));
    md.push_str(&format!("| p-value | {:.4} |\n", c.result.p_value));
    md.push_str(&format!(
        "| Critical Values (1% / 5% / 10%) | {:.3} / {:.3} / {:.3} |\n",
        c.result.critical_values.one_pct,
        c.result.critical_values.five_pct,
        c.result.critical_values.ten_pct
    ));
    md.push_str(&format!("| Lags | {} |\n", c.result.lags_used));
    md.push_str(&format!(
        "| Verdict at {} | {} |\n",
        c.significance,
        if c.verdict.is_cointegrated() {
            "cointegrated"
        } else {
            "**not cointegrated**"
        }
    ));
    md.push('\n');

    md.push_str("## Model\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    match &report.hedge {
        HedgeFit::Static(h) => {
            md.push_str(&format!("| Hedge | full-sample OLS, β = {:.4}, α = {:.4} |\n", h.beta, h.alpha));
        }
        HedgeFit::Rolling { window, .. } => {
            md.push_str(&format!("| Hedge | rolling OLS, window {window} |\n"));
        }
    }
    md.push_str(&format!("| Entry Multiplier | {} |\n", config.signal.entry_multiplier));
    md.push_str(&format!("| Exit Rule | {:?} |\n", config.signal.exit_rule));
    md.push_str(&format!("| Precedence | {:?} |\n", config.signal.precedence));
    md.push_str(&format!("| Accounting | {:?} |\n", config.backtest.accounting));
    md.push('\n');

    let m = &output.metrics;
    md.push_str("## Performance Summary\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!(
        "| Final Value | {:.2} |\n",
        report.result.final_portfolio_value()
    ));
    md.push_str(&format!("| Total Return | {:.2}% |\n", m.total_return * 100.0));
    md.push_str(&format!("| Sharpe | {:.3} |\n", m.sharpe));
    md.push_str(&format!("| Max Drawdown | {:.2}% |\n", m.max_drawdown * 100.0));
    md.push_str(&format!("| Entries | {} |\n", m.entries));
    md.push_str(&format!("| Round Trips | {} |\n", m.round_trips));
    md.push_str(&format!("| Avg Holding (steps) | {:.1} |\n", m.avg_holding_steps));
    md.push_str(&format!("| Time in Market | {:.1}% |\n", m.time_in_market * 100.0));
    md.push_str(&format!(
        "| Spread Half-Life | {} |\n",
        m.half_life
            .map_or_else(|| "n/a".to_string(), |h| format!("{h:.1} steps"))
    ));
    md.push('\n');

    md
}

// ── Helpers ──

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

fn fmt_optional(value: f64, decimals: usize) -> String {
    if value.is_finite() {
        format!("{value:.decimals$}")
    } else {
        String::new()
    }
}
