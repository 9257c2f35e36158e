//! The pure computation an `IndicatorEngine` drives.
//!
//! Indicators are pure functions: a candle window in, values out. The engine
//! re-invokes `calculate` over small sub-windows during progressive
//! recalculation, so an implementation must carry no hidden state.

use serde::{Deserialize, Serialize};

use crate::domain::{Candle, IndicatorValue};

/// Which candle field an indicator reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    Open,
    High,
    Low,
    #[default]
    Close,
    /// (high + low) / 2
    Hl2,
    /// (high + low + close) / 3
    Typical,
}

impl PriceSource {
    pub fn of(&self, candle: &Candle) -> f64 {
        match self {
            PriceSource::Open => candle.open,
            PriceSource::High => candle.high,
            PriceSource::Low => candle.low,
            PriceSource::Close => candle.close,
            PriceSource::Hl2 => (candle.high + candle.low) / 2.0,
            PriceSource::Typical => (candle.high + candle.low + candle.close) / 3.0,
        }
    }

    pub fn extract(&self, candles: &[Candle]) -> Vec<f64> {
        candles.iter().map(|c| self.of(c)).collect()
    }
}

/// Trait for indicators.
///
/// `calculate` returns at most one value per candle, aligned to the tail of
/// the window: the warm-up candles at the head produce nothing. Returning
/// more values than candles is a broken indicator and the engine rejects it.
pub trait Indicator: Send + Sync {
    /// Stable algorithm identity (e.g. "sma"), part of the signature.
    fn id(&self) -> &str;

    /// Human-readable name (e.g. "sma_20").
    fn name(&self) -> &str;

    /// Leading candles consumed before the first value.
    fn lookback(&self) -> usize;

    /// Merged configuration, hashed into the engine signature.
    fn config(&self) -> serde_json::Value;

    fn calculate(&self, candles: &[Candle]) -> Vec<IndicatorValue>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_sources() {
        let c = Candle::new(0, 10.0, 14.0, 8.0, 12.0, 1.0);
        assert_eq!(PriceSource::Open.of(&c), 10.0);
        assert_eq!(PriceSource::Close.of(&c), 12.0);
        assert_eq!(PriceSource::Hl2.of(&c), 11.0);
        assert!((PriceSource::Typical.of(&c) - 34.0 / 3.0).abs() < 1e-12);
        assert_eq!(PriceSource::default(), PriceSource::Close);
    }
}
