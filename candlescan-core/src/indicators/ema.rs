//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * x[t] + (1 - alpha) * EMA[t-1], alpha = 2 / (period + 1).
//! Seed: SMA of the first `period` values.
//! Lookback: period - 1.

use crate::domain::{Candle, IndicatorValue};
use crate::indicator::{Indicator, PriceSource};

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    source: PriceSource,
    name: String,
}

impl Ema {
    pub fn new(period: usize, source: PriceSource) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            source,
            name: format!("ema_{period}"),
        }
    }
}

/// EMA of a raw series, SMA-seeded; `values.len() - period + 1` outputs.
/// Used by composed indicators (MACD) that smooth derived series.
pub fn ema_of_series(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }
    let alpha = 2.0 / (period as f64 + 1.0);
    let seed = values[..period].iter().sum::<f64>() / period as f64;

    let mut out = Vec::with_capacity(values.len() - period + 1);
    out.push(seed);
    let mut prev = seed;
    for &x in &values[period..] {
        prev = alpha * x + (1.0 - alpha) * prev;
        out.push(prev);
    }
    out
}

impl Indicator for Ema {
    fn id(&self) -> &str {
        "ema"
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
        ema_of_series(&self.source.extract(candles), self.period)
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
    fn ema_seeded_with_sma() {
        let candles = make_candles(&[2.0, 4.0, 6.0, 8.0]);
        let result = scalars(&Ema::new(3, PriceSource::Close).calculate(&candles));
        assert_eq!(result.len(), 2);
        assert_approx(result[0], 4.0, DEFAULT_EPSILON);
        // alpha = 0.5: 0.5 * 8 + 0.5 * 4 = 6
        assert_approx(result[1], 6.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_1_is_identity() {
        assert_eq!(ema_of_series(&[3.0, 1.0, 2.0], 1), vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn ema_constant_series_is_constant() {
        let out = ema_of_series(&[5.0; 50], 10);
        assert_eq!(out.len(), 41);
        assert!(out.iter().all(|v| (v - 5.0).abs() < DEFAULT_EPSILON));
    }

    #[test]
    fn ema_too_few_values() {
        assert!(ema_of_series(&[1.0, 2.0], 3).is_empty());
    }
}
