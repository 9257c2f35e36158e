//! Candle loading for the runner.
//!
//! Fills an `InMemoryStore` with every (symbol, interval) the run needs: the
//! base interval plus each progressive interval of the strategy. Candles come
//! from CSV files or from a seeded random walk. Synthetic candles are built
//! at the finest interval and aggregated upwards, so coarser bars are exactly
//! the merge of the finer bars they cover.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use candlescan_core::domain::{Candle, Interval};
use candlescan_core::store::{InMemoryStore, StoreError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{DataConfig, RunConfig};

/// First synthetic timestamp (2024-01-01T00:00:00Z), aligned to every
/// interval up to one day.
pub const SYNTHETIC_START: i64 = 1_704_067_200;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no candle file for '{symbol}' at {interval}: {path}")]
    MissingFile {
        symbol: String,
        interval: Interval,
        path: PathBuf,
    },

    #[error("csv error in {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error("{path} row {row}: {reason}")]
    InvalidCandle {
        path: PathBuf,
        row: usize,
        reason: String,
    },

    #[error("interval {fine} does not evenly divide {coarse}")]
    Interval { fine: Interval, coarse: Interval },

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Candle counts per symbol and interval.
#[derive(Debug, Clone, Default)]
pub struct LoadedData {
    pub counts: BTreeMap<(String, Interval), usize>,
}

impl LoadedData {
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

#[derive(Debug, Deserialize)]
struct CsvCandle {
    timestamp: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Register every symbol at every required interval and insert its candles.
pub fn load_candles(config: &RunConfig, store: &InMemoryStore) -> Result<LoadedData, LoadError> {
    let now = chrono::Utc::now().timestamp();
    let mut intervals = config.progressive_intervals();
    intervals.push(config.interval);
    let mut loaded = LoadedData::default();

    for name in &config.symbols {
        let per_interval = match &config.data {
            DataConfig::Csv { dir } => intervals
                .iter()
                .map(|&interval| {
                    let path = csv_path(dir, name, interval);
                    if !path.exists() {
                        return Err(LoadError::MissingFile {
                            symbol: name.clone(),
                            interval,
                            path,
                        });
                    }
                    Ok((interval, read_csv_candles(&path)?))
                })
                .collect::<Result<BTreeMap<_, _>, _>>()?,
            DataConfig::Synthetic { seed } => {
                generate_synthetic(name, config.interval, &intervals, config.window, *seed)?
            }
        };

        for (interval, candles) in per_interval {
            let symbol = store.add_symbol(&config.exchange, name, interval, now)?;
            let count = store.insert_candles(&symbol, candles)?;
            debug!(symbol = %name, %interval, count, "candles loaded");
            loaded.counts.insert((name.clone(), interval), count);
        }
    }

    info!(
        symbols = config.symbols.len(),
        intervals = intervals.len(),
        candles = loaded.total(),
        "candle data ready"
    );
    Ok(loaded)
}

/// `{dir}/{symbol}_{interval}.csv`
pub fn csv_path(dir: &Path, symbol: &str, interval: Interval) -> PathBuf {
    dir.join(format!("{symbol}_{interval}.csv"))
}

/// Read a candle CSV, rejecting unordered timestamps and inconsistent bars.
pub fn read_csv_candles(path: &Path) -> Result<Vec<Candle>, LoadError> {
    let csv_error = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::Reader::from_path(path).map_err(csv_error)?;
    let mut candles: Vec<Candle> = Vec::new();

    for (row, record) in reader.deserialize::<CsvCandle>().enumerate() {
        let r = record.map_err(csv_error)?;
        let candle = Candle::new(r.timestamp, r.open, r.high, r.low, r.close, r.volume);
        let invalid = |reason: String| LoadError::InvalidCandle {
            path: path.to_path_buf(),
            row: row + 1,
            reason,
        };
        if !candle.is_sane() {
            return Err(invalid("high/low do not bound open/close".into()));
        }
        if let Some(previous) = candles.last() {
            if candle.timestamp <= previous.timestamp {
                return Err(invalid(format!(
                    "timestamp {} not after {}",
                    candle.timestamp, previous.timestamp
                )));
            }
        }
        candles.push(candle);
    }
    Ok(candles)
}

/// Write candles in the format `read_csv_candles` expects.
pub fn write_csv_candles(path: &Path, candles: &[Candle]) -> Result<(), LoadError> {
    let csv_error = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
    writer
        .write_record(["timestamp", "open", "high", "low", "close", "volume"])
        .map_err(csv_error)?;
    for c in candles {
        writer
            .write_record([
                c.timestamp.to_string(),
                c.open.to_string(),
                c.high.to_string(),
                c.low.to_string(),
                c.close.to_string(),
                c.volume.to_string(),
            ])
            .map_err(csv_error)?;
    }
    writer.flush().map_err(|e| csv_error(e.into()))?;
    Ok(())
}

/// Seeded random walk covering `count` base candles at every interval in
/// `intervals` (which must include `base` or divide it).
pub fn generate_synthetic(
    symbol: &str,
    base: Interval,
    intervals: &[Interval],
    count: usize,
    seed: u64,
) -> Result<BTreeMap<Interval, Vec<Candle>>, LoadError> {
    let finest = intervals.iter().copied().min().unwrap_or(base).min(base);
    for &interval in intervals.iter().chain(std::iter::once(&base)) {
        if interval.seconds() % finest.seconds() != 0 || base.seconds() % interval.seconds() != 0 {
            return Err(LoadError::Interval {
                fine: finest,
                coarse: interval,
            });
        }
    }

    // Deterministic seed from run seed and symbol name
    let mut hasher = blake3::Hasher::new();
    hasher.update(&seed.to_le_bytes());
    hasher.update(symbol.as_bytes());
    let mut rng = StdRng::from_seed(*hasher.finalize().as_bytes());

    let per_base = (base.seconds() / finest.seconds()) as usize;
    let mut fine = Vec::with_capacity(count * per_base);
    let mut price = 100.0_f64;
    for i in 0..count * per_base {
        let step_return: f64 = rng.gen_range(-0.004..0.004);
        let open = price;
        let close = price * (1.0 + step_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.002));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.002));
        let volume = rng.gen_range(10.0..1000.0);
        fine.push(Candle::new(
            SYNTHETIC_START + i as i64 * finest.seconds(),
            open,
            high,
            low,
            close,
            volume,
        ));
        price = close;
    }

    let mut out = BTreeMap::new();
    for &interval in intervals.iter().chain(std::iter::once(&base)) {
        out.insert(interval, aggregate(&fine, finest, interval));
    }
    Ok(out)
}

/// Merge consecutive `fine` candles into `coarse` bars stamped at their start.
fn aggregate(fine: &[Candle], finest: Interval, coarse: Interval) -> Vec<Candle> {
    let group = (coarse.seconds() / finest.seconds()) as usize;
    fine.chunks(group)
        .filter_map(|chunk| {
            let (first, rest) = chunk.split_first()?;
            let merged = rest.iter().fold(*first, |acc, c| acc.merge(c));
            Some(Candle {
                timestamp: first.timestamp,
                ..merged
            })
        })
        .collect()
}
