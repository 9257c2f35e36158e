//! MACD (Moving Average Convergence Divergence).
//!
//! - MACD line = EMA(fast) - EMA(slow)
//! - Signal line = EMA(signal) of the MACD line
//! - Histogram = MACD line - signal line
//!
//! Emits fields `macd`, `signal`, `histogram`.
//! Lookback: (slow - 1) + (signal - 1).

use crate::domain::{Candle, IndicatorValue};
use crate::indicator::{Indicator, PriceSource};

use super::ema_of_series;

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    source: PriceSource,
    name: String,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize, source: PriceSource) -> Self {
        assert!(fast >= 1 && signal >= 1, "MACD periods must be >= 1");
        assert!(slow > fast, "MACD slow period must be > fast period");
        Self {
            fast,
            slow,
            signal,
            source,
            name: format!("macd_{fast}_{slow}_{signal}"),
        }
    }
}

impl Default for Macd {
    fn default() -> Self {
        Self::new(12, 26, 9, PriceSource::Close)
    }
}

impl Indicator for Macd {
    fn id(&self) -> &str {
        "macd"
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        (self.slow - 1) + (self.signal - 1)
    }

    fn config(&self) -> serde_json::Value {
        serde_json::json!({
            "fast": self.fast,
            "slow": self.slow,
            "signal": self.signal,
            "source": self.source,
        })
    }

    fn calculate(&self, candles: &[Candle]) -> Vec<IndicatorValue> {
        let prices = self.source.extract(candles);
        let fast = ema_of_series(&prices, self.fast);
        let slow = ema_of_series(&prices, self.slow);
        if slow.is_empty() {
            return Vec::new();
        }

        // Both EMA series end at the last candle; align fast to slow's tail.
        let offset = fast.len() - slow.len();
        let line: Vec<f64> = slow
            .iter()
            .enumerate()
            .map(|(i, s)| fast[i + offset] - s)
            .collect();

        let signal = ema_of_series(&line, self.signal);
        let offset = line.len() - signal.len();
        signal
            .iter()
            .enumerate()
            .map(|(i, &sig)| {
                let macd = line[i + offset];
                IndicatorValue::fields([("macd", macd), ("signal", sig), ("histogram", macd - sig)])
            })
            .collect()
    }
}
