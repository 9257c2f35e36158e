//! Report export: JSON for round-tripping, CSV for the matched setups.
//!
//! Persisted reports carry a `schema_version`; unknown versions are rejected
//! on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::runner::{RunReport, SymbolOutcome, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(report: &RunReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize RunReport to JSON")
}

/// Deserialize a `RunReport`, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<RunReport> {
    let report: RunReport =
        serde_json::from_str(json).context("failed to deserialize RunReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// One row per trade setup across all completed symbols.
///
/// Columns: symbol, side, name, signal_count, timestamp, price, price_date,
/// signature
pub fn export_setups_csv(report: &RunReport) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "symbol",
        "side",
        "name",
        "signal_count",
        "timestamp",
        "price",
        "price_date",
        "signature",
    ])?;

    for symbol in report.completed() {
        for s in &symbol.setups {
            wtr.write_record([
                symbol.symbol.clone(),
                s.side.to_string(),
                s.name.clone(),
                s.signal_count.to_string(),
                s.timestamp.to_string(),
                format!("{:.6}", s.price),
                s.price_date.to_string(),
                s.signature_id.to_string(),
            ])?;
        }
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write `report.json` and `setups.csv` into `{output_dir}/{run_id}/`.
///
/// Returns the created directory.
pub fn save_artifacts(report: &RunReport, output_dir: &Path) -> Result<PathBuf> {
    let run_dir = output_dir.join(&report.run_id);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("report.json"), export_json(report)?)?;
    std::fs::write(run_dir.join("setups.csv"), export_setups_csv(report)?)?;

    Ok(run_dir)
}

pub fn load_artifacts(dir: &Path) -> Result<RunReport> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

/// Plain-text summary, one line per symbol.
pub fn summary(report: &RunReport) -> String {
    let mut out = format!(
        "run {} | strategy {} @ {}\n",
        report.run_id, report.strategy, report.interval
    );
    for outcome in &report.outcomes {
        match outcome {
            SymbolOutcome::Completed(r) => out.push_str(&format!(
                "{:<12} {:>6} candles {:>5} signals {:>4} setups\n",
                r.symbol,
                r.candles,
                r.signals,
                r.setups.len()
            )),
            SymbolOutcome::Failed { symbol, error } => {
                out.push_str(&format!("{symbol:<12} FAILED: {error}\n"))
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use candlescan_core::domain::{Interval, Side, Signature, SymbolId, TradeSetup};
    use chrono::Utc;

    use crate::runner::SymbolReport;

    fn sample_report() -> RunReport {
        let setup = TradeSetup {
            symbol_id: SymbolId(1),
            side: Side::Buy,
            name: "cross_above_lower|zero_cross_up".into(),
            signal_count: 2,
            timestamp: 7200,
            price: 101.25,
            price_date: 10800,
            signature_id: Signature("abc".into()),
            signals: vec![],
        };
        RunReport {
            schema_version: SCHEMA_VERSION,
            run_id: "run1".into(),
            strategy: "demo".into(),
            interval: Interval::hours(1),
            started_at: Utc::now(),
            outcomes: vec![
                SymbolOutcome::Completed(SymbolReport {
                    symbol: "BTCUSDT".into(),
                    candles: 300,
                    signature: Signature("abc".into()),
                    signals: 12,
                    setups: vec![setup],
                }),
                SymbolOutcome::Failed {
                    symbol: "ETHUSDT".into(),
                    error: "no candles".into(),
                },
            ],
        }
    }

    #[test]
    fn json_round_trip_keeps_outcomes() {
        let report = sample_report();
        let back = import_json(&export_json(&report).unwrap()).unwrap();
        assert_eq!(back.outcomes.len(), 2);
        assert_eq!(back.setup_count(), 1);
        assert_eq!(back.failed().next(), Some(("ETHUSDT", "no candles")));
    }

    #[test]
    fn import_rejects_future_schema() {
        let mut report = sample_report();
        report.schema_version = SCHEMA_VERSION + 1;
        let json = serde_json::to_string(&report).unwrap();
        assert!(import_json(&json).is_err());
    }

    #[test]
    fn setups_csv_has_header_and_one_row_per_setup() {
        let csv = export_setups_csv(&sample_report()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("symbol,side,name"));
        assert!(lines[1].starts_with("BTCUSDT,buy,cross_above_lower|zero_cross_up,2,7200,101.250000"));
    }

    #[test]
    fn summary_marks_failures() {
        let text = summary(&sample_report());
        assert!(text.contains("ETHUSDT"));
        assert!(text.contains("FAILED: no candles"));
    }
}
