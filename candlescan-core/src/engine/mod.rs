//! IndicatorEngine — one indicator evaluated over one symbol's candle window.
//!
//! The engine computes the value series once at construction, aligns it to
//! the tail of the window (the head is the warm-up `gap`), optionally binds a
//! finer-interval symbol for progressive recalculation, and walks the series
//! with [`IndicatorEngine::scan`].

pub mod config;
pub mod error;
pub mod progressive;
pub mod scan;

pub use config::EngineConfig;
pub use error::EngineError;
pub use progressive::MergedCandles;
pub use scan::{ScanState, ScanStep};

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::{Candle, CandleSeries, IndicatorValue, Signal, Signature, Symbol};
use crate::indicator::Indicator;
use crate::store::{CandleStore, InMemoryStore, SignalStore};

/// The collaborators an engine or composer is wired to.
#[derive(Clone)]
pub struct Collaborators {
    pub candles: Arc<dyn CandleStore>,
    pub signals: Arc<dyn SignalStore>,
}

impl Collaborators {
    pub fn new(candles: Arc<dyn CandleStore>, signals: Arc<dyn SignalStore>) -> Self {
        Self { candles, signals }
    }

    pub fn in_memory(store: Arc<InMemoryStore>) -> Self {
        Self {
            candles: store.clone(),
            signals: store,
        }
    }
}

/// Sub-candle sequences cached per `(base candle, next base candle)` pair.
type MergeKey = (i64, Option<i64>);

pub struct IndicatorEngine {
    indicator: Box<dyn Indicator>,
    config: EngineConfig,
    candles: CandleSeries,
    values: Vec<(i64, IndicatorValue)>,
    gap: usize,
    progressive_symbol: Option<Symbol>,
    progressive_data: BTreeMap<i64, IndicatorValue>,
    merges: HashMap<MergeKey, MergedCandles>,
    state: Option<ScanState>,
    signals: Vec<Signal>,
    signature: Option<Signature>,
    stores: Collaborators,
}

impl IndicatorEngine {
    /// Compute `indicator` over `candles` and bind the progressive symbol if
    /// configured.
    ///
    /// Fails with `Configuration` if the indicator yields more values than
    /// candles. An empty window yields an empty series without computing.
    pub fn new(
        indicator: Box<dyn Indicator>,
        candles: CandleSeries,
        config: EngineConfig,
        stores: Collaborators,
    ) -> Result<Self, EngineError> {
        let (values, gap) = if candles.is_empty() {
            (Vec::new(), 0)
        } else {
            let computed = indicator.calculate(candles.candles());
            if computed.len() > candles.len() {
                return Err(EngineError::Configuration(format!(
                    "indicator '{}' produced {} values for {} candles",
                    indicator.name(),
                    computed.len(),
                    candles.len()
                )));
            }
            let gap = candles.len() - computed.len();
            let values = candles.candles()[gap..]
                .iter()
                .map(|c| c.timestamp)
                .zip(computed)
                .collect();
            (values, gap)
        };

        let progressive_symbol = resolve_progressive(candles.symbol(), &config, &stores)?;

        debug!(
            indicator = indicator.name(),
            symbol = %candles.symbol().name,
            candles = candles.len(),
            values = values.len(),
            gap,
            progressive = progressive_symbol.is_some(),
            "indicator calculated"
        );

        Ok(Self {
            indicator,
            config,
            candles,
            values,
            gap,
            progressive_symbol,
            progressive_data: BTreeMap::new(),
            merges: HashMap::new(),
            state: None,
            signals: Vec::new(),
            signature: None,
            stores,
        })
    }

    pub fn indicator(&self) -> &dyn Indicator {
        self.indicator.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn symbol(&self) -> &Symbol {
        self.candles.symbol()
    }

    pub fn candles(&self) -> &CandleSeries {
        &self.candles
    }

    /// Leading candles with no value.
    pub fn gap(&self) -> usize {
        self.gap
    }

    /// The full value series, ascending by candle timestamp.
    pub fn data(&self) -> &[(i64, IndicatorValue)] {
        &self.values
    }

    /// Signals persisted by scans of this engine, in emission order.
    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    /// Signature registered by the most recent scan.
    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    pub fn is_progressive(&self) -> bool {
        self.progressive_symbol.is_some()
    }

    pub fn progressive_symbol(&self) -> Option<&Symbol> {
        self.progressive_symbol.as_ref()
    }

    /// Values recomputed at sub-candle timestamps so far.
    pub fn progressive_data(&self) -> &BTreeMap<i64, IndicatorValue> {
        &self.progressive_data
    }

    /// Value at `timestamp` with equal-or-preceding semantics.
    ///
    /// An exact match wins; otherwise the last value before the first value
    /// stamped after `timestamp`. `None` when `timestamp` precedes the series.
    pub fn lookup(&self, timestamp: i64) -> Option<&IndicatorValue> {
        let after = self.values.partition_point(|(t, _)| *t <= timestamp);
        after.checked_sub(1).map(|i| &self.values[i].1)
    }

    /// Base-resolution value: at `timestamp` if given, else at the scan cursor.
    /// Recomputed progressive values are never consulted.
    ///
    /// Readable from detectors. Without a timestamp it fails with `Logic`
    /// outside a scan.
    pub fn base_value(
        &self,
        bind: Option<&str>,
        timestamp: Option<i64>,
    ) -> Result<Option<IndicatorValue>, EngineError> {
        match timestamp {
            Some(t) => Ok(self.lookup(t).and_then(|v| v.bind(bind))),
            None => Ok(self.cursor()?.value.bind(bind)),
        }
    }

    /// Value lookup honouring progressive recalculation.
    ///
    /// Takes the progressive path only when `progressive` names a different
    /// interval than the engine's own and `recalculate` is enabled. Otherwise
    /// a value already recomputed at exactly `timestamp` wins over the base
    /// series, which is read through [`base_value`](Self::base_value). A
    /// scalar value ignores `bind`; a field set yields the named field.
    pub fn value_at(
        &mut self,
        bind: Option<&str>,
        timestamp: Option<i64>,
        progressive: Option<&Symbol>,
    ) -> Result<Option<IndicatorValue>, EngineError> {
        let progressive = progressive
            .filter(|p| p.interval != self.symbol().interval && self.config.recalculate);
        let Some(progressive) = progressive else {
            if let Some(value) = timestamp.and_then(|t| self.progressive_data.get(&t)) {
                return Ok(value.bind(bind));
            }
            return self.base_value(bind, timestamp);
        };
        let timestamp = match timestamp {
            Some(t) => t,
            None => self.cursor()?.current,
        };
        let value = self.progressive_value(progressive, timestamp)?;
        Ok(value.bind(bind))
    }

    /// Close of the candle the cursor stands on.
    pub fn price(&self) -> Result<f64, EngineError> {
        Ok(self.cursor()?.candle.close)
    }

    /// Candle `offset` positions away from `timestamp`, or from the cursor.
    ///
    /// With no timestamp and no offset this is the candle the detector is
    /// looking at, which in progressive mode is the merged sub-candle.
    pub fn candle(&self, offset: isize, timestamp: Option<i64>) -> Result<Option<Candle>, EngineError> {
        let index = match timestamp {
            Some(t) => match self.candles.find_prev_next(t) {
                Some(pn) => pn.prev_index,
                None => return Ok(None),
            },
            None => {
                let state = self.cursor()?;
                if offset == 0 {
                    return Ok(Some(state.candle));
                }
                self.gap + state.index
            }
        };
        let Some(shifted) = index.checked_add_signed(offset) else {
            return Ok(None);
        };
        Ok(self.candles.candle_at(shifted).copied())
    }
}

fn resolve_progressive(
    symbol: &Symbol,
    config: &EngineConfig,
    stores: &Collaborators,
) -> Result<Option<Symbol>, EngineError> {
    let Some(interval) = config.progressive_interval else {
        return Ok(None);
    };
    if interval == symbol.interval {
        warn!(
            symbol = %symbol.name,
            %interval,
            "progressive interval equals base interval, progressive mode disabled"
        );
        return Ok(None);
    }
    let fine = stores
        .candles
        .fetch_symbol(&symbol.exchange, &symbol.name, interval)?;
    let age = (chrono::Utc::now().timestamp() - symbol.updated_at).max(0);
    let fine = stores.candles.update_candles_if_older_than(&fine, age)?;
    Ok(Some(fine))
}
