//! Strategy configuration: which indicators run and how their signals chain.

use serde::{Deserialize, Serialize};

use crate::domain::Signal;
use crate::engine::EngineConfig;
use crate::factory::{DetectorConfig, IndicatorConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StrategyConfig {
    pub name: String,
    #[serde(default)]
    pub indicators: Vec<StrategyIndicatorConfig>,
    #[serde(default)]
    pub setups: Vec<SetupRuleConfig>,
}

/// One indicator of a strategy, scanned with its own detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StrategyIndicatorConfig {
    /// Key setup rules refer to.
    pub key: String,
    pub indicator: IndicatorConfig,
    pub detector: DetectorConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

/// A setup rule: one signal per slot, in slot order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetupRuleConfig {
    pub key: String,
    pub slots: Vec<SlotConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlotConfig {
    /// Key of a [`StrategyIndicatorConfig`].
    pub indicator: String,
    /// Accepted signal names; `None` accepts any.
    #[serde(default)]
    pub names: Option<Vec<String>>,
}

impl SlotConfig {
    pub fn new(indicator: impl Into<String>) -> Self {
        Self {
            indicator: indicator.into(),
            names: None,
        }
    }

    pub fn named<I, S>(indicator: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            indicator: indicator.into(),
            names: Some(names.into_iter().map(Into::into).collect()),
        }
    }

    pub fn permits(&self, signal: &Signal) -> bool {
        self.names
            .as_ref()
            .map_or(true, |names| names.iter().any(|n| *n == signal.name))
    }
}

impl SetupRuleConfig {
    pub fn new(key: impl Into<String>, slots: Vec<SlotConfig>) -> Self {
        Self {
            key: key.into(),
            slots,
        }
    }
}
