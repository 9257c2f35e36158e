//! Bollinger Bands: moving average +/- a standard deviation multiple.
//!
//! Emits fields:
//! - `middle`: SMA(period)
//! - `upper`: middle + std_dev * stddev(period)
//! - `lower`: middle - std_dev * stddev(period)
//!
//! Uses population stddev (divide by N).
//! Lookback: period - 1.

use crate::domain::{Candle, IndicatorValue};
use crate::indicator::{Indicator, PriceSource};

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    std_dev: f64,
    source: PriceSource,
    name: String,
}

impl Bollinger {
    pub fn new(period: usize, std_dev: f64, source: PriceSource) -> Self {
        assert!(period >= 1, "Bollinger period must be >= 1");
        Self {
            period,
            std_dev,
            source,
            name: format!("bollinger_{period}_{std_dev}"),
        }
    }
}

impl Indicator for Bollinger {
    fn id(&self) -> &str {
        "bollinger"
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn config(&self) -> serde_json::Value {
        serde_json::json!({
            "period": self.period,
            "std_dev": self.std_dev,
            "source": self.source,
        })
    }

    fn calculate(&self, candles: &[Candle]) -> Vec<IndicatorValue> {
        let prices = self.source.extract(candles);
        prices
            .windows(self.period)
            .map(|window| {
                let n = window.len() as f64;
                let mean = window.iter().sum::<f64>() / n;
                let variance = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
                let band = self.std_dev * variance.sqrt();
                IndicatorValue::fields([
                    ("upper", mean + band),
                    ("middle", mean),
                    ("lower", mean - band),
                ])
            })
            .collect()
    }
}
