//! Per-engine options, independent of the indicator's own parameters.

use serde::{Deserialize, Serialize};

use crate::domain::Interval;

/// Default number of finer candles fetched when no boundary candle exists.
pub const DEFAULT_PROGRESSIVE_FETCH_LIMIT: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Finer interval to replay each base candle at. `None` disables
    /// progressive mode.
    pub progressive_interval: Option<Interval>,

    /// Recompute the indicator on every merged sub-candle. When `false`,
    /// progressive scans reuse the base value for every sub-candle and
    /// `value_at` never takes the progressive path.
    pub recalculate: bool,

    /// Upper bound on finer candles fetched past the last known base candle.
    pub progressive_fetch_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            progressive_interval: None,
            recalculate: true,
            progressive_fetch_limit: DEFAULT_PROGRESSIVE_FETCH_LIMIT,
        }
    }
}

impl EngineConfig {
    pub fn progressive(interval: Interval) -> Self {
        Self {
            progressive_interval: Some(interval),
            ..Self::default()
        }
    }
}
