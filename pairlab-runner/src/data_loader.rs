//! Price loading for the runner.
//!
//! Resolves the configured price source:
//! 1. One CSV with `date,<leg1>,<leg2>`
//! 2. Two CSVs with `date,close`, joined by position and checked for identical dates
//! 3. Synthetic pair (tagged)
//!
//! The configured date range is applied after loading, then the pair is validated
//! by `PriceSeries`. Synthetic data is a developer-only debug mode; results produced
//! on it are tagged.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{info, warn};

use pairlab_core::synthetic::generate_pair;
use pairlab_core::{EngineError, PriceSeries};

use crate::config::{BacktestConfig, ConfigError, PriceSource};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("CSV error in {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
    #[error("{path}: expected {expected}, found header {found:?}")]
    Header {
        path: PathBuf,
        expected: String,
        found: Vec<String>,
    },
    #[error("{path} line {line}: bad date '{value}' (expected YYYY-MM-DD)")]
    BadDate {
        path: PathBuf,
        line: u64,
        value: String,
    },
    #[error("{path} line {line}: bad price '{value}'")]
    BadPrice {
        path: PathBuf,
        line: u64,
        value: String,
    },
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Engine(#[from] EngineError),
}

/// Loaded prices with provenance.
#[derive(Debug, Clone)]
pub struct LoadedPrices {
    pub series: PriceSeries,
    /// BLAKE3 over dates and both legs.
    pub dataset_hash: String,
    pub is_synthetic: bool,
    /// Human-readable origin, e.g. the file path(s).
    pub source: String,
}

/// Load the configured pair and apply its date range.
pub fn load_prices(config: &BacktestConfig) -> Result<LoadedPrices, LoadError> {
    let (series, is_synthetic, source) = match config.price_source()? {
        PriceSource::Combined(path) => {
            let series = load_pair_csv(&path, &config.pair.leg1, &config.pair.leg2)?;
            (series, false, path.display().to_string())
        }
        PriceSource::Separate { leg1, leg2 } => {
            let a = load_close_csv(&leg1)?;
            let b = load_close_csv(&leg2)?;
            let series = PriceSeries::from_legs(&a, &b)?;
            let source = format!("{} + {}", leg1.display(), leg2.display());
            (series, false, source)
        }
        PriceSource::Synthetic => {
            let synthetic = config.synthetic_config();
            warn!(
                seed = synthetic.seed,
                periods = synthetic.periods,
                "using synthetic prices; results are tagged synthetic"
            );
            let series = generate_pair(&synthetic)?;
            (series, true, format!("synthetic(seed={})", synthetic.seed))
        }
    };

    let series = match (config.pair.start_date, config.pair.end_date) {
        (None, None) => series,
        (start, end) => series.between(start, end)?,
    };

    let dataset_hash = compute_dataset_hash(&series);
    info!(
        source = %source,
        rows = series.len(),
        first = %series.first_timestamp(),
        last = %series.last_timestamp(),
        hash = &dataset_hash[..12],
        "prices loaded"
    );

    Ok(LoadedPrices {
        series,
        dataset_hash,
        is_synthetic,
        source,
    })
}

/// Read `date,<a>,<b>`. Columns named `leg1` / `leg2` are used if present,
/// otherwise the first two price columns.
pub fn load_pair_csv(path: &Path, leg1: &str, leg2: &str) -> Result<PriceSeries, LoadError> {
    let mut reader = open(path)?;
    let headers: Vec<String> = reader
        .headers()
        .map_err(|source| csv_error(path, source))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.len() < 3 || !headers[0].eq_ignore_ascii_case("date") {
        return Err(LoadError::Header {
            path: path.to_path_buf(),
            expected: "date,<leg1>,<leg2>".into(),
            found: headers,
        });
    }
    let column = |name: &str, fallback: usize| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .unwrap_or(fallback)
    };
    let (c1, c2) = (column(leg1, 1), column(leg2, 2));

    let mut dates = Vec::new();
    let mut first = Vec::new();
    let mut second = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| csv_error(path, source))?;
        let line = record.position().map_or(0, |p| p.line());
        dates.push(parse_date(path, line, record.get(0).unwrap_or(""))?);
        first.push(parse_price(path, line, record.get(c1).unwrap_or(""))?);
        second.push(parse_price(path, line, record.get(c2).unwrap_or(""))?);
    }

    Ok(PriceSeries::from_columns(&dates, &first, &second)?)
}

/// Read `date,close` (extra columns ignored; `close` located by name if present).
pub fn load_close_csv(path: &Path) -> Result<Vec<(NaiveDate, f64)>, LoadError> {
    let mut reader = open(path)?;
    let headers = reader
        .headers()
        .map_err(|source| csv_error(path, source))?
        .clone();
    if headers.len() < 2 || !headers[0].trim().eq_ignore_ascii_case("date") {
        return Err(LoadError::Header {
            path: path.to_path_buf(),
            expected: "date,close".into(),
            found: headers.iter().map(str::to_string).collect(),
        });
    }
    let close = headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case("close"))
        .unwrap_or(1);

    reader
        .records()
        .map(|record| -> Result<(NaiveDate, f64), LoadError> {
            let record = record.map_err(|source| csv_error(path, source))?;
            let line = record.position().map_or(0, |p| p.line());
            Ok((
                parse_date(path, line, record.get(0).unwrap_or(""))?,
                parse_price(path, line, record.get(close).unwrap_or(""))?,
            ))
        })
        .collect()
}

/// Write `date,<leg1>,<leg2>` so the file round-trips through [`load_pair_csv`].
pub fn write_pair_csv(
    path: &Path,
    series: &PriceSeries,
    leg1: &str,
    leg2: &str,
) -> Result<(), LoadError> {
    let mut writer = csv::Writer::from_path(path).map_err(|source| csv_error(path, source))?;
    writer
        .write_record(["date", leg1, leg2])
        .map_err(|source| csv_error(path, source))?;
    for p in series {
        writer
            .write_record([
                p.timestamp.format(DATE_FORMAT).to_string(),
                p.leg1.to_string(),
                p.leg2.to_string(),
            ])
            .map_err(|source| csv_error(path, source))?;
    }
    writer.flush().map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Deterministic BLAKE3 hash over dates and both legs.
pub fn compute_dataset_hash(series: &PriceSeries) -> String {
    let mut hasher = blake3::Hasher::new();
    for p in series {
        hasher.update(p.timestamp.to_string().as_bytes());
        hasher.update(&p.leg1.to_le_bytes());
        hasher.update(&p.leg2.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

// ── Helpers ──

fn open(path: &Path) -> Result<csv::Reader<std::fs::File>, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file))
}

fn csv_error(path: &Path, source: csv::Error) -> LoadError {
    LoadError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

fn parse_date(path: &Path, line: u64, value: &str) -> Result<NaiveDate, LoadError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| LoadError::BadDate {
        path: path.to_path_buf(),
        line,
        value: value.to_string(),
    })
}

/// A blank cell is a missing price. It loads as NaN so series validation reports it
/// as `EngineError::NumericPropagation` with the leg and row index.
fn parse_price(path: &Path, line: u64, value: &str) -> Result<f64, LoadError> {
    if value.is_empty() {
        return Ok(f64::NAN);
    }
    value.parse::<f64>().map_err(|_| LoadError::BadPrice {
        path: path.to_path_buf(),
        line,
        value: value.to_string(),
    })
}
