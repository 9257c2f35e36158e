//! Relative Strength Index (RSI).
//!
//! Uses Wilder smoothing of average gains and average losses.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: period.
//! Edge cases: avg_loss == 0 → RSI = 100; avg_gain == 0 → RSI = 0.

use crate::domain::{Candle, IndicatorValue};
use crate::indicator::{Indicator, PriceSource};

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    source: PriceSource,
    name: String,
}

impl Rsi {
    pub fn new(period: usize, source: PriceSource) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            source,
            name: format!("rsi_{period}"),
        }
    }
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 {
            return 50.0;
        }
        return 100.0;
    }
    100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
}

impl Indicator for Rsi {
    fn id(&self) -> &str {
        "rsi"
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn config(&self) -> serde_json::Value {
        serde_json::json!({ "period": self.period, "source": self.source })
    }

    fn calculate(&self, candles: &[Candle]) -> Vec<IndicatorValue> {
        let prices = self.source.extract(candles);
        if prices.len() < self.period + 1 {
            return Vec::new();
        }
        let changes: Vec<f64> = prices.windows(2).map(|w| w[1] - w[0]).collect();

        // Seed: plain averages over the first `period` changes.
        let (mut avg_gain, mut avg_loss) = changes[..self.period]
            .iter()
            .fold((0.0, 0.0), |(g, l), &ch| (g + ch.max(0.0), l + (-ch).max(0.0)));
        avg_gain /= self.period as f64;
        avg_loss /= self.period as f64;

        let mut out = Vec::with_capacity(changes.len() - self.period + 1);
        out.push(IndicatorValue::Scalar(compute_rsi(avg_gain, avg_loss)));

        let alpha = 1.0 / self.period as f64;
        for &ch in &changes[self.period..] {
            avg_gain = alpha * ch.max(0.0) + (1.0 - alpha) * avg_gain;
            avg_loss = alpha * (-ch).max(0.0) + (1.0 - alpha) * avg_loss;
            out.push(IndicatorValue::Scalar(compute_rsi(avg_gain, avg_loss)));
        }
        out
    }
}
