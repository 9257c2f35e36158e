//! End-to-end runs over synthetic and CSV universes.

use std::sync::Arc;

use candlescan_core::domain::Interval;
use candlescan_core::store::InMemoryStore;
use candlescan_runner::data_loader::{csv_path, generate_synthetic, read_csv_candles, write_csv_candles};
use candlescan_runner::export::{load_artifacts, save_artifacts};
use candlescan_runner::{load_candles, run, run_universe, DataConfig, LoadError, RunConfig, RunError};
use tracing_subscriber::EnvFilter;

const CONFIG: &str = r#"
exchange = "binance"
interval = "1h"
symbols = ["BTCUSDT", "ETHUSDT"]
window = 200

[data]
source = "synthetic"
seed = 11

[strategy]
name = "rsi_macd"

[[strategy.indicators]]
key = "rsi"
indicator = { type = "rsi", period = 14 }
detector = { type = "threshold_cross", lower = 40.0, upper = 60.0 }

[[strategy.indicators]]
key = "macd"
indicator = { type = "macd" }
detector = { type = "zero_cross", bind = "histogram" }
engine = { progressive_interval = "15m" }

[[strategy.setups]]
key = "rsi_then_macd"
slots = [{ indicator = "rsi" }, { indicator = "macd" }]
"#;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn config() -> RunConfig {
    RunConfig::from_toml_str(CONFIG).unwrap()
}

#[test]
fn synthetic_universe_completes_every_symbol() {
    init_tracing();
    let config = config();
    let (report, store) = run(&config).unwrap();

    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.failed().count(), 0);
    for symbol in report.completed() {
        assert_eq!(symbol.candles, 200);
        for setup in &symbol.setups {
            assert_eq!(setup.signal_count, 2);
            assert_eq!(setup.signals.len(), 2);
            assert!(setup.signals.iter().all(|s| s.side == setup.side));
        }
    }
    assert_eq!(store.trade_setup_count().unwrap(), report.setup_count());
}

#[test]
fn rerunning_the_universe_is_deterministic() {
    init_tracing();
    let config = config();
    let (first, store) = run(&config).unwrap();
    let persisted = store.trade_setup_count().unwrap();
    let second = run_universe(&config, store.clone()).unwrap();

    assert_eq!(first.run_id, second.run_id);
    assert_eq!(first.setup_count(), second.setup_count());
    assert_eq!(store.trade_setup_count().unwrap(), persisted);
}

#[test]
fn missing_symbol_fails_alone() {
    init_tracing();
    let loaded = config();
    let store = Arc::new(InMemoryStore::new());
    load_candles(&loaded, &store).unwrap();

    let mut wider = loaded.clone();
    wider.symbols.push("XRPUSDT".into());
    let report = run_universe(&wider, store).unwrap();

    assert_eq!(report.completed().count(), 2);
    let failed: Vec<_> = report.failed().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].0, "XRPUSDT");
    assert!(failed[0].1.contains("symbol not found"));
}

#[test]
fn csv_universe_matches_synthetic_data() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let synthetic = config();
    let intervals = [Interval::minutes(15)];
    for name in &synthetic.symbols {
        let data = generate_synthetic(name, synthetic.interval, &intervals, synthetic.window, 11).unwrap();
        for (interval, candles) in &data {
            write_csv_candles(&csv_path(dir.path(), name, *interval), candles).unwrap();
        }
    }

    let mut from_csv = synthetic.clone();
    from_csv.data = DataConfig::Csv {
        dir: dir.path().to_path_buf(),
    };
    let (a, _) = run(&synthetic).unwrap();
    let (b, _) = run(&from_csv).unwrap();

    assert_ne!(a.run_id, b.run_id);
    let timestamps = |r: &candlescan_runner::RunReport| -> Vec<(String, i64)> {
        r.completed()
            .flat_map(|s| s.setups.iter().map(move |x| (s.symbol.clone(), x.timestamp)))
            .collect()
    };
    assert_eq!(timestamps(&a), timestamps(&b));
}

#[test]
fn missing_fine_csv_is_a_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config();
    config.symbols = vec!["BTCUSDT".into()];
    let data = generate_synthetic("BTCUSDT", config.interval, &[], 50, 1).unwrap();
    write_csv_candles(
        &csv_path(dir.path(), "BTCUSDT", config.interval),
        &data[&config.interval],
    )
    .unwrap();
    config.data = DataConfig::Csv {
        dir: dir.path().to_path_buf(),
    };

    let err = run(&config).unwrap_err();
    assert!(matches!(
        err,
        RunError::Load(LoadError::MissingFile { interval, .. }) if interval == Interval::minutes(15)
    ));
}

#[test]
fn unordered_csv_rows_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.csv");
    std::fs::write(
        &path,
        "timestamp,open,high,low,close,volume\n120,1,2,0.5,1.5,10\n60,1,2,0.5,1.5,10\n",
    )
    .unwrap();
    assert!(matches!(
        read_csv_candles(&path),
        Err(LoadError::InvalidCandle { row: 2, .. })
    ));
}

#[test]
fn artifacts_round_trip() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let (report, _) = run(&config()).unwrap();

    let run_dir = save_artifacts(&report, dir.path()).unwrap();
    assert!(run_dir.join("setups.csv").exists());
    let loaded = load_artifacts(&run_dir).unwrap();
    assert_eq!(loaded.run_id, report.run_id);
    assert_eq!(loaded.setup_count(), report.setup_count());
}
