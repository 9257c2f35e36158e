//! Universe runner: evaluates one strategy across every configured symbol.
//!
//! Two entry points:
//! - `run()`: builds an in-memory store, loads candles and runs the universe.
//! - `run_universe()`: runs against a store that is already populated.
//!
//! Symbols are evaluated in parallel. A failing symbol is reported in the
//! outcome list and does not stop the others.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use candlescan_core::composer::{StrategyComposer, StrategyRun};
use candlescan_core::domain::{Interval, Signature, TradeSetup};
use candlescan_core::engine::{Collaborators, EngineError};
use candlescan_core::store::{CandleStore, InMemoryStore, StoreError};

use crate::config::{ConfigError, RunConfig, RunId};
use crate::data_loader::{load_candles, LoadError};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Load(#[from] LoadError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("run id could not be computed: {0}")]
    RunId(#[from] serde_json::Error),
}

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

/// Result of the strategy on one symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolReport {
    pub symbol: String,
    pub candles: usize,
    pub signature: Signature,
    pub signals: usize,
    pub setups: Vec<TradeSetup>,
}

impl SymbolReport {
    fn from_run(symbol: &str, candles: usize, run: StrategyRun) -> Self {
        let signals = run.signal_count();
        let setups = run
            .setups
            .into_values()
            .flat_map(|by_ts| by_ts.into_values())
            .collect();
        Self {
            symbol: symbol.to_string(),
            candles,
            signature: run.signature,
            signals,
            setups,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SymbolOutcome {
    Completed(SymbolReport),
    Failed { symbol: String, error: String },
}

impl SymbolOutcome {
    pub fn symbol(&self) -> &str {
        match self {
            SymbolOutcome::Completed(report) => &report.symbol,
            SymbolOutcome::Failed { symbol, .. } => symbol,
        }
    }
}

/// Complete result of one universe run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub strategy: String,
    pub interval: Interval,
    pub started_at: DateTime<Utc>,
    pub outcomes: Vec<SymbolOutcome>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl RunReport {
    pub fn completed(&self) -> impl Iterator<Item = &SymbolReport> {
        self.outcomes.iter().filter_map(|o| match o {
            SymbolOutcome::Completed(report) => Some(report),
            SymbolOutcome::Failed { .. } => None,
        })
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes.iter().filter_map(|o| match o {
            SymbolOutcome::Failed { symbol, error } => Some((symbol.as_str(), error.as_str())),
            SymbolOutcome::Completed(_) => None,
        })
    }

    pub fn setup_count(&self) -> usize {
        self.completed().map(|r| r.setups.len()).sum()
    }
}

/// Load candles per `config.data` into a fresh store and run every symbol.
pub fn run(config: &RunConfig) -> Result<(RunReport, Arc<InMemoryStore>), RunError> {
    config.validate()?;
    let store = Arc::new(InMemoryStore::new());
    load_candles(config, &store)?;
    let report = run_universe(config, store.clone())?;
    Ok((report, store))
}

/// Run the strategy over every symbol already present in `store`.
pub fn run_universe(config: &RunConfig, store: Arc<InMemoryStore>) -> Result<RunReport, RunError> {
    let run_id = config.run_id()?;
    let started_at = Utc::now();
    info!(
        run_id = %run_id,
        strategy = %config.strategy.name,
        symbols = config.symbols.len(),
        "universe run started"
    );

    let outcomes: Vec<SymbolOutcome> = config
        .symbols
        .par_iter()
        .map(|name| match run_symbol(config, &store, name) {
            Ok(report) => SymbolOutcome::Completed(report),
            Err(e) => {
                warn!(symbol = %name, error = %e, "symbol failed");
                SymbolOutcome::Failed {
                    symbol: name.clone(),
                    error: e.to_string(),
                }
            }
        })
        .collect();

    let report = RunReport {
        schema_version: SCHEMA_VERSION,
        run_id,
        strategy: config.strategy.name.clone(),
        interval: config.interval,
        started_at,
        outcomes,
    };
    info!(
        completed = report.completed().count(),
        failed = report.failed().count(),
        setups = report.setup_count(),
        "universe run finished"
    );
    Ok(report)
}

fn run_symbol(
    config: &RunConfig,
    store: &Arc<InMemoryStore>,
    name: &str,
) -> Result<SymbolReport, RunError> {
    let symbol = store.fetch_symbol(&config.exchange, name, config.interval)?;
    let series = store.series(&symbol, config.window)?;
    let composer = StrategyComposer::new(
        config.strategy.clone(),
        Collaborators::in_memory(store.clone()),
    )?;
    let run = composer.run(&series)?;
    Ok(SymbolReport::from_run(name, series.len(), run))
}
