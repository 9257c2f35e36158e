//! Property tests for engine invariants.
//!
//! Uses proptest to verify:
//! 1. Tail alignment — gap = candles - values and values sit on the last timestamps
//! 2. Lookup — equal-or-preceding semantics against a linear scan
//! 3. Merged candles — sticky open, running extrema, latest close
//! 4. Setup chains — same side, non-decreasing timestamps, last slot wins
//! 5. Signatures — identical payloads hash equal

use std::collections::BTreeMap;
use std::sync::Arc;

use proptest::prelude::*;

use candlescan_core::composer::{
    SetupRuleConfig, SlotConfig, StrategyComposer, StrategyConfig, StrategyIndicatorConfig,
};
use candlescan_core::domain::{Candle, CandleSeries, Interval, Side, Signal, Signature, SymbolId};
use candlescan_core::engine::{Collaborators, EngineConfig, IndicatorEngine, MergedCandles};
use candlescan_core::factory::{DetectorConfig, IndicatorConfig};
use candlescan_core::indicator::PriceSource;
use candlescan_core::indicators::Sma;
use candlescan_core::signature::SignaturePayload;
use candlescan_core::store::InMemoryStore;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_closes() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0..500.0_f64, 0..60)
}

fn arb_sub_candles() -> impl Strategy<Value = Vec<(f64, f64, f64)>> {
    // (open, close, wick) per sub-candle
    prop::collection::vec((10.0..100.0_f64, 10.0..100.0_f64, 0.0..5.0_f64), 1..30)
}

fn arb_side() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::Buy), Just(Side::Sell)]
}

fn arb_stream(name: &'static str) -> impl Strategy<Value = Vec<Signal>> {
    prop::collection::vec((0..50_i64, arb_side()), 0..12).prop_map(move |mut raw| {
        raw.sort_by_key(|(t, _)| *t);
        raw.into_iter()
            .map(|(t, side)| Signal {
                symbol_id: SymbolId(1),
                indicator_signature: Signature(name.into()),
                side,
                name: format!("{name}_{side}"),
                timestamp: t * 60,
                price: 1.0,
                price_date: t * 60 + 60,
            })
            .collect()
    })
}

fn series(closes: &[f64]) -> (Arc<InMemoryStore>, CandleSeries) {
    let store = Arc::new(InMemoryStore::new());
    let symbol = store.add_symbol("prop", "PROP", Interval::minutes(1), 0).unwrap();
    let candles: Vec<Candle> = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Candle::new(i as i64 * 60, c, c + 1.0, c - 1.0, c, 1.0))
        .collect();
    store.insert_candles(&symbol, candles.clone()).unwrap();
    (store, CandleSeries::new(symbol, candles).unwrap())
}

// ── 1. Tail alignment ────────────────────────────────────────────────

proptest! {
    #[test]
    fn values_align_to_the_tail(closes in arb_closes(), period in 1_usize..20) {
        let (store, series) = series(&closes);
        let engine = IndicatorEngine::new(
            Box::new(Sma::new(period, PriceSource::Close)),
            series.clone(),
            EngineConfig::default(),
            Collaborators::in_memory(store),
        ).unwrap();

        let values = engine.data();
        prop_assert_eq!(engine.gap() + values.len(), closes.len());
        let tail: Vec<i64> = series.timestamps().skip(engine.gap()).collect();
        let stamped: Vec<i64> = values.iter().map(|(t, _)| *t).collect();
        prop_assert_eq!(stamped, tail);
    }
}

// ── 2. Lookup ────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn lookup_is_equal_or_preceding(closes in arb_closes(), query in -120_i64..4000) {
        let (store, series) = series(&closes);
        let engine = IndicatorEngine::new(
            Box::new(Sma::new(3, PriceSource::Close)),
            series,
            EngineConfig::default(),
            Collaborators::in_memory(store),
        ).unwrap();

        let expected = engine
            .data()
            .iter()
            .rev()
            .find(|(t, _)| *t <= query)
            .map(|(_, v)| v);
        prop_assert_eq!(engine.lookup(query), expected);
    }
}

// ── 3. Merged candles ────────────────────────────────────────────────

proptest! {
    #[test]
    fn merged_candles_track_running_ohlc(raw in arb_sub_candles()) {
        let subs: Vec<Candle> = raw
            .iter()
            .enumerate()
            .map(|(i, &(open, close, wick))| {
                Candle::new(i as i64 * 15, open, open.max(close) + wick, open.min(close) - wick, close, 1.0)
            })
            .collect();
        let boundary = subs.len() as i64 * 15;
        let merged: Vec<Candle> = MergedCandles::new(0, Some(boundary), subs.clone()).collect();
        prop_assert_eq!(merged.len(), subs.len());

        for (k, m) in merged.iter().enumerate() {
            let seen = &subs[..=k];
            prop_assert_eq!(m.open, subs[0].open);
            prop_assert_eq!(m.close, subs[k].close);
            prop_assert_eq!(m.timestamp, subs[k].timestamp);
            let high = seen.iter().map(|c| c.high).fold(f64::MIN, f64::max);
            let low = seen.iter().map(|c| c.low).fold(f64::MAX, f64::min);
            prop_assert_eq!(m.high, high);
            prop_assert_eq!(m.low, low);
            prop_assert!(m.timestamp >= 0 && m.timestamp < boundary);
        }
    }
}

// ── 4. Setup chains ──────────────────────────────────────────────────

fn entry(key: &str) -> StrategyIndicatorConfig {
    StrategyIndicatorConfig {
        key: key.into(),
        indicator: IndicatorConfig::Sma { period: 2, source: PriceSource::Close },
        detector: DetectorConfig::PriceCross { bind: None },
        engine: EngineConfig::default(),
    }
}

proptest! {
    #[test]
    fn setups_chain_same_side_in_time_order(
        a in arb_stream("a"),
        b in arb_stream("b"),
        c in arb_stream("c"),
    ) {
        let config = StrategyConfig {
            name: "chain".into(),
            indicators: vec![entry("a"), entry("b"), entry("c")],
            setups: vec![SetupRuleConfig::new(
                "abc",
                vec![SlotConfig::new("a"), SlotConfig::new("b"), SlotConfig::new("c")],
            )],
        };
        let composer = StrategyComposer::new(
            config,
            Collaborators::in_memory(Arc::new(InMemoryStore::new())),
        ).unwrap();
        let signals = BTreeMap::from([
            ("a".to_string(), a.clone()),
            ("b".to_string(), b),
            ("c".to_string(), c),
        ]);
        let setups = composer.find_trade_setups(&signals, &Signature("chain".into()));
        let matched = &setups["abc"];

        // At most one setup per first-slot start.
        prop_assert!(matched.len() <= a.len());
        for (timestamp, setup) in matched {
            prop_assert_eq!(setup.signals.len(), 3);
            prop_assert_eq!(setup.signal_count, 3);
            for pair in setup.signals.windows(2) {
                prop_assert_eq!(pair[0].side, pair[1].side);
                prop_assert!(pair[0].timestamp <= pair[1].timestamp);
            }
            let last = &setup.signals[2];
            prop_assert_eq!(*timestamp, last.timestamp);
            prop_assert_eq!(setup.side, last.side);
        }
    }
}

// ── 5. Signatures ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn identical_payloads_hash_equal(period in 1_usize..200, detector in "[a-z_]{1,16}") {
        let config = IndicatorConfig::Sma { period, source: PriceSource::Close };
        let first = SignaturePayload::indicator("sma", &config, Some(&detector)).unwrap();
        let second = SignaturePayload::indicator("sma", &config, Some(&detector)).unwrap();
        prop_assert_eq!(first.signature().unwrap(), second.signature().unwrap());
    }
}
