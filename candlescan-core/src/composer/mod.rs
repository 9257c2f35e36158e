//! Strategy Composer — runs a fixed indicator set over one symbol and chains
//! their signals into trade setups.
//!
//! Each indicator gets its own engine and detector. Setup rules then match
//! ordered, same-side, time-non-decreasing signals across the indicators
//! they name, one signal per slot.

pub mod config;

pub use config::{SetupRuleConfig, SlotConfig, StrategyConfig, StrategyIndicatorConfig};

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{CandleSeries, Signal, Signature, TradeSetup};
use crate::engine::{Collaborators, EngineError, IndicatorEngine};
use crate::factory::{create_detector, create_indicator};
use crate::signature::SignaturePayload;
use crate::store::StoreError;

/// Post-processing hook for matched setups: enrich, or veto with `None`.
pub trait SetupTransform: Send + Sync {
    fn apply(&self, setup: TradeSetup) -> Option<TradeSetup>;
}

impl<F> SetupTransform for F
where
    F: Fn(TradeSetup) -> Option<TradeSetup> + Send + Sync,
{
    fn apply(&self, setup: TradeSetup) -> Option<TradeSetup> {
        self(setup)
    }
}

/// Setups per rule key, keyed by setup timestamp.
pub type SetupsByRule = BTreeMap<String, BTreeMap<i64, TradeSetup>>;

/// Outcome of one strategy evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyRun {
    pub signature: Signature,
    /// Signals per indicator key, in emission order.
    pub signals: BTreeMap<String, Vec<Signal>>,
    pub setups: SetupsByRule,
}

impl StrategyRun {
    pub fn setup_count(&self) -> usize {
        self.setups.values().map(BTreeMap::len).sum()
    }

    pub fn signal_count(&self) -> usize {
        self.signals.values().map(Vec::len).sum()
    }
}

pub struct StrategyComposer {
    config: StrategyConfig,
    stores: Collaborators,
    transforms: HashMap<String, Box<dyn SetupTransform>>,
}

impl StrategyComposer {
    /// Validate `config` and bind it to its collaborators.
    ///
    /// Fails with `Configuration` on duplicate indicator keys, rules without
    /// slots, or slots naming an unknown indicator.
    pub fn new(config: StrategyConfig, stores: Collaborators) -> Result<Self, EngineError> {
        let mut keys = HashSet::new();
        for indicator in &config.indicators {
            if !keys.insert(indicator.key.as_str()) {
                return Err(EngineError::Configuration(format!(
                    "strategy '{}' declares indicator '{}' twice",
                    config.name, indicator.key
                )));
            }
        }
        for rule in &config.setups {
            if rule.slots.is_empty() {
                return Err(EngineError::Configuration(format!(
                    "setup '{}' requires no signals",
                    rule.key
                )));
            }
            if let Some(slot) = rule.slots.iter().find(|s| !keys.contains(s.indicator.as_str())) {
                return Err(EngineError::Configuration(format!(
                    "setup '{}' refers to unknown indicator '{}'",
                    rule.key, slot.indicator
                )));
            }
        }
        Ok(Self {
            config,
            stores,
            transforms: HashMap::new(),
        })
    }

    /// Attach a transform to the setups matched by rule `rule_key`.
    pub fn with_transform(mut self, rule_key: impl Into<String>, transform: impl SetupTransform + 'static) -> Self {
        self.transforms.insert(rule_key.into(), Box::new(transform));
        self
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// Register the strategy's signature.
    pub fn register(&self) -> Result<Signature, EngineError> {
        let payload =
            SignaturePayload::strategy(&self.config.name, &self.config).map_err(StoreError::from)?;
        Ok(self.stores.signals.register(&payload)?)
    }

    /// Scan every indicator over `candles`, match setups and persist them.
    pub fn run(&self, candles: &CandleSeries) -> Result<StrategyRun, EngineError> {
        let signature = self.register()?;

        let mut signals = BTreeMap::new();
        for entry in &self.config.indicators {
            let indicator = create_indicator(&entry.indicator)
                .map_err(|e| EngineError::Configuration(format!("indicator '{}': {e}", entry.key)))?;
            let detector = create_detector(&entry.detector)
                .map_err(|e| EngineError::Configuration(format!("indicator '{}': {e}", entry.key)))?;
            let mut engine = IndicatorEngine::new(
                indicator,
                candles.clone(),
                entry.engine.clone(),
                self.stores.clone(),
            )?;
            engine.scan(Some(detector.as_ref()))?;
            debug!(
                strategy = %self.config.name,
                indicator = %entry.key,
                signals = engine.signals().len(),
                "indicator scanned"
            );
            signals.insert(entry.key.clone(), engine.signals().to_vec());
        }

        let setups = self.find_trade_setups(&signals, &signature);
        for setup in setups.values().flat_map(BTreeMap::values) {
            self.stores.signals.upsert_trade_setup(setup)?;
        }
        debug!(
            strategy = %self.config.name,
            symbol = %candles.symbol().name,
            setups = setups.values().map(BTreeMap::len).sum::<usize>(),
            "trade setups matched"
        );

        Ok(StrategyRun {
            signature,
            signals,
            setups,
        })
    }

    /// Match each rule against `signals` (per indicator key, time-ordered).
    ///
    /// Every signal of the first slot's indicator is tried once as a start.
    /// Later slots search forward from a per-indicator position that stays
    /// on the last signal they contributed, so one signal may close several
    /// setups. A later setup at the same timestamp replaces an earlier one.
    pub fn find_trade_setups(
        &self,
        signals: &BTreeMap<String, Vec<Signal>>,
        signature: &Signature,
    ) -> SetupsByRule {
        let mut found = SetupsByRule::new();
        for rule in &self.config.setups {
            let mut matched = BTreeMap::new();
            for setup in match_rule(rule, signals, signature) {
                let setup = match self.transforms.get(&rule.key) {
                    Some(transform) => transform.apply(setup),
                    None => Some(setup),
                };
                if let Some(setup) = setup {
                    matched.insert(setup.timestamp, setup);
                }
            }
            found.insert(rule.key.clone(), matched);
        }
        found
    }
}

fn match_rule(
    rule: &SetupRuleConfig,
    signals: &BTreeMap<String, Vec<Signal>>,
    signature: &Signature,
) -> Vec<TradeSetup> {
    let lists: Vec<&[Signal]> = rule
        .slots
        .iter()
        .map(|slot| signals.get(&slot.indicator).map_or(&[][..], Vec::as_slice))
        .collect();
    let Some((first_slot, later_slots)) = rule.slots.split_first() else {
        return Vec::new();
    };
    // Slots naming the same indicator share its position.
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut setups = Vec::new();

    for first in lists[0] {
        if !first_slot.permits(first) {
            continue;
        }
        let mut chain = vec![first];
        for (k, slot) in later_slots.iter().enumerate().map(|(i, s)| (i + 1, s)) {
            let previous = chain[chain.len() - 1];
            let position = positions.entry(slot.indicator.as_str()).or_insert(0);
            let candidate = lists[k][*position..].iter().position(|s| {
                slot.permits(s) && s.timestamp >= previous.timestamp && s.side == previous.side
            });
            let Some(offset) = candidate else {
                break;
            };
            *position += offset;
            chain.push(&lists[k][*position]);
        }
        if chain.len() == rule.slots.len() {
            setups.push(build_setup(&chain, signature));
        }
    }
    setups
}

fn build_setup(chain: &[&Signal], signature: &Signature) -> TradeSetup {
    let last = chain[chain.len() - 1];
    TradeSetup {
        symbol_id: last.symbol_id,
        side: last.side,
        name: chain.iter().map(|s| s.name.as_str()).collect::<Vec<_>>().join("|"),
        signal_count: chain.len(),
        timestamp: last.timestamp,
        price: last.price,
        price_date: last.price_date,
        signature_id: signature.clone(),
        signals: chain.iter().map(|s| (*s).clone()).collect(),
    }
}
