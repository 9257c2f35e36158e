//! OHLCV candle, the basic unit of market data.

use serde::{Deserialize, Serialize};

/// OHLCV bar for one symbol over one interval, stamped with its open time
/// (unix seconds).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Fold a later sub-candle into this running bar.
    ///
    /// The open stays fixed, high/low track the extremes, close and timestamp
    /// follow the latest sub-candle and volume accumulates. Used to simulate a
    /// coarser candle that ends at `next`.
    pub fn merge(&self, next: &Candle) -> Candle {
        Candle {
            timestamp: next.timestamp,
            open: self.open,
            high: self.high.max(next.high),
            low: self.low.min(next.low),
            close: next.close,
            volume: self.volume + next.volume,
        }
    }

    /// Basic OHLC sanity check: high is the top of the bar and low the bottom.
    pub fn is_sane(&self) -> bool {
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }
}
