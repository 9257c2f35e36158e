//! Simple Moving Average (SMA).
//!
//! Rolling mean over a lookback window.
//! Lookback: period - 1 (first value covers candles 0..period).

use crate::domain::{Candle, IndicatorValue};
use crate::indicator::{Indicator, PriceSource};

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    source: PriceSource,
    name: String,
}

impl Sma {
    pub fn new(period: usize, source: PriceSource) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            source,
            name: format!("sma_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

/// Rolling mean of a raw series; `values.len() - period + 1` outputs.
pub fn sma_of_series(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(values.len() - period + 1);
    let mut sum: f64 = values[..period].iter().sum();
    out.push(sum / period as f64);
    for i in period..values.len() {
        sum += values[i] - values[i - period];
        out.push(sum / period as f64);
    }
    out
}

impl Indicator for Sma {
    fn id(&self) -> &str {
        "sma"
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn config(&self) -> serde_json::Value {
        serde_json::json!({ "period": self.period, "source": self.source })
    }

    fn calculate(&self, candles: &[Candle]) -> Vec<IndicatorValue> {
        sma_of_series(&self.source.extract(candles), self.period)
            .into_iter()
            .map(IndicatorValue::Scalar)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_candles, scalars, DEFAULT_EPSILON};

    #[test]
    fn sma_5_basic() {
        let candles = make_candles(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0]);
        let result = scalars(&Sma::new(5, PriceSource::Close).calculate(&candles));

        assert_eq!(result.len(), 3);
        // mean(10..=14), mean(11..=15), mean(12..=16)
        assert_approx(result[0], 12.0, DEFAULT_EPSILON);
        assert_approx(result[1], 13.0, DEFAULT_EPSILON);
        assert_approx(result[2], 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_1_is_close() {
        let candles = make_candles(&[100.0, 200.0, 300.0]);
        let result = scalars(&Sma::new(1, PriceSource::Close).calculate(&candles));
        assert_eq!(result, vec![100.0, 200.0, 300.0]);
    }

    #[test]
    fn sma_reads_configured_source() {
        let candles = make_candles(&[10.0, 12.0]);
        // highs: 11.0, 13.0
        let result = scalars(&Sma::new(2, PriceSource::High).calculate(&candles));
        assert_approx(result[0], 12.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_lookback_matches_gap() {
        let candles = make_candles(&[1.0; 30]);
        let sma = Sma::new(20, PriceSource::Close);
        assert_eq!(candles.len() - sma.calculate(&candles).len(), sma.lookback());
    }

    #[test]
    fn sma_too_few_candles() {
        let candles = make_candles(&[10.0, 11.0]);
        assert!(Sma::new(5, PriceSource::Close).calculate(&candles).is_empty());
    }
}
