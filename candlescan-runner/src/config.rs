//! Serializable run configuration, loaded from TOML.

use std::path::{Path, PathBuf};

use candlescan_core::composer::StrategyConfig;
use candlescan_core::domain::Interval;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unique identifier for a run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse run config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid run config: {0}")]
    Invalid(String),
}

/// Where candles come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case", deny_unknown_fields)]
pub enum DataConfig {
    /// `{symbol}_{interval}.csv` files with a
    /// `timestamp,open,high,low,close,volume` header.
    Csv { dir: PathBuf },

    /// Seeded random walk, generated at every interval the strategy needs.
    Synthetic {
        #[serde(default = "default_seed")]
        seed: u64,
    },
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig::Synthetic {
            seed: default_seed(),
        }
    }
}

fn default_seed() -> u64 {
    42
}

fn default_window() -> usize {
    500
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

/// Everything needed to reproduce a run over a universe of symbols.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub exchange: String,

    /// Base candle interval every engine evaluates at.
    pub interval: Interval,

    pub symbols: Vec<String>,

    /// Number of most recent base candles per symbol.
    #[serde(default = "default_window")]
    pub window: usize,

    #[serde(default)]
    pub data: DataConfig,

    pub strategy: StrategyConfig,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl RunConfig {
    /// Parse and validate a TOML run config.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML run config from a file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbols.is_empty() {
            return Err(ConfigError::Invalid("no symbols".into()));
        }
        if self.window == 0 {
            return Err(ConfigError::Invalid("window must be >= 1".into()));
        }
        if self.strategy.indicators.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "strategy '{}' has no indicators",
                self.strategy.name
            )));
        }
        for interval in self.progressive_intervals() {
            if interval >= self.interval || self.interval.seconds() % interval.seconds() != 0 {
                return Err(ConfigError::Invalid(format!(
                    "progressive interval {interval} must evenly divide {}",
                    self.interval
                )));
            }
        }
        Ok(())
    }

    /// Distinct finer intervals requested by the strategy's engines, ascending.
    pub fn progressive_intervals(&self) -> Vec<Interval> {
        let mut intervals: Vec<Interval> = self
            .strategy
            .indicators
            .iter()
            .filter_map(|i| i.engine.progressive_interval)
            .filter(|i| *i != self.interval)
            .collect();
        intervals.sort();
        intervals.dedup();
        intervals
    }

    /// Computes a deterministic hash ID for this configuration.
    pub fn run_id(&self) -> Result<RunId, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}
