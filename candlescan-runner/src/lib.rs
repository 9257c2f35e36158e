//! Candlescan Runner — universe orchestration on top of `candlescan-core`.
//!
//! - TOML run configuration with a deterministic run id
//! - Candle loading from CSV files or a seeded synthetic walk
//! - Parallel per-symbol strategy evaluation with isolated failures
//! - JSON/CSV report export

pub mod config;
pub mod data_loader;
pub mod export;
pub mod runner;

pub use config::{ConfigError, DataConfig, RunConfig, RunId};
pub use data_loader::{load_candles, LoadError, LoadedData};
pub use export::{load_artifacts, save_artifacts};
pub use runner::{run, run_universe, RunError, RunReport, SymbolOutcome, SymbolReport};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<RunConfig>();
        assert_sync::<RunConfig>();
        assert_send::<DataConfig>();
        assert_sync::<DataConfig>();
    }

    #[test]
    fn report_types_are_send_sync() {
        assert_send::<RunReport>();
        assert_sync::<RunReport>();
        assert_send::<SymbolOutcome>();
        assert_sync::<SymbolOutcome>();
    }
}
