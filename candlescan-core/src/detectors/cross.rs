//! Crossing detectors: sign changes and price crossings.

use super::{bind_label, Detector};
use crate::domain::{IndicatorValue, Signal, SignalDraft};
use crate::engine::{EngineError, IndicatorEngine};

/// Buy when the bound value turns positive, sell when it turns negative
/// (MACD histogram).
#[derive(Debug, Clone, PartialEq)]
pub struct ZeroCross {
    bind: Option<String>,
    id: String,
}

impl ZeroCross {
    pub fn new(bind: Option<String>) -> Self {
        let id = format!("zero_cross({})", bind_label(bind.as_deref()));
        Self { bind, id }
    }
}

impl Detector for ZeroCross {
    fn id(&self) -> &str {
        &self.id
    }

    fn detect(
        &self,
        _prior: Option<&Signal>,
        engine: &IndicatorEngine,
        value: &IndicatorValue,
    ) -> Result<Option<SignalDraft>, EngineError> {
        let bind = self.bind.as_deref();
        let (Some(current), Some(previous)) = (
            value.get(bind),
            engine.previous_value(bind)?.and_then(|v| v.as_f64()),
        ) else {
            return Ok(None);
        };
        if previous <= 0.0 && current > 0.0 {
            Ok(Some(SignalDraft::buy("zero_cross_up")))
        } else if previous >= 0.0 && current < 0.0 {
            Ok(Some(SignalDraft::sell("zero_cross_down")))
        } else {
            Ok(None)
        }
    }
}

/// Buy when the close crosses above the bound value, sell when it crosses
/// below (moving averages).
#[derive(Debug, Clone, PartialEq)]
pub struct PriceCross {
    bind: Option<String>,
    id: String,
}

impl PriceCross {
    pub fn new(bind: Option<String>) -> Self {
        let id = format!("price_cross({})", bind_label(bind.as_deref()));
        Self { bind, id }
    }
}

impl Detector for PriceCross {
    fn id(&self) -> &str {
        &self.id
    }

    fn detect(
        &self,
        _prior: Option<&Signal>,
        engine: &IndicatorEngine,
        value: &IndicatorValue,
    ) -> Result<Option<SignalDraft>, EngineError> {
        let bind = self.bind.as_deref();
        let Some(level) = value.get(bind) else {
            return Ok(None);
        };
        let Some(previous_level) = engine.previous_value(bind)?.and_then(|v| v.as_f64()) else {
            return Ok(None);
        };
        let Some(previous_candle) = engine.candle(-1, None)? else {
            return Ok(None);
        };
        let close = engine.price()?;
        let previous_close = previous_candle.close;

        if previous_close <= previous_level && close > level {
            Ok(Some(SignalDraft::buy("price_cross_up")))
        } else if previous_close >= previous_level && close < level {
            Ok(Some(SignalDraft::sell("price_cross_down")))
        } else {
            Ok(None)
        }
    }
}
