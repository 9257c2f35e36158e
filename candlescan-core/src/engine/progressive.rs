//! Progressive recalculation: replaying a base candle at a finer interval.
//!
//! Finer candles inside one base candle are folded into a running merged
//! bar, which is what the base candle would look like had it closed at that
//! sub-candle. Recomputing the indicator over the `gap` preceding base
//! candles plus the merged bar gives the indicator's value mid-candle.

use tracing::debug;

use super::{EngineError, IndicatorEngine};
use crate::domain::{Candle, IndicatorValue, Symbol};
use crate::indicator::Indicator;

/// Running merge over the finer candles of one base candle.
///
/// Yields one merged bar per sub-candle consumed. Not restartable: a
/// partially consumed sequence resumes where it stopped.
#[derive(Debug, Clone)]
pub struct MergedCandles {
    start: i64,
    boundary: Option<i64>,
    sub_candles: std::vec::IntoIter<Candle>,
    running: Option<Candle>,
}

impl MergedCandles {
    pub fn new(start: i64, boundary: Option<i64>, sub_candles: Vec<Candle>) -> Self {
        Self {
            start,
            boundary,
            sub_candles: sub_candles.into_iter(),
            running: None,
        }
    }

    /// Timestamp of the base candle being replayed.
    pub fn start(&self) -> i64 {
        self.start
    }

    /// Exclusive upper bound of the replay, if known.
    pub fn boundary(&self) -> Option<i64> {
        self.boundary
    }
}

impl Iterator for MergedCandles {
    type Item = Candle;

    fn next(&mut self) -> Option<Candle> {
        let sub = self.sub_candles.next()?;
        let merged = match self.running {
            Some(running) => running.merge(&sub),
            None => sub,
        };
        self.running = Some(merged);
        Some(merged)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.sub_candles.size_hint()
    }
}

/// Recompute `indicator` with `merged` appended to `history`, keeping the
/// last value.
pub(crate) fn recalculate(
    indicator: &dyn Indicator,
    history: &[Candle],
    merged: &Candle,
) -> Result<IndicatorValue, EngineError> {
    let mut window = Vec::with_capacity(history.len() + 1);
    window.extend_from_slice(history);
    window.push(*merged);
    indicator.calculate(&window).pop().ok_or_else(|| {
        EngineError::Logic(format!(
            "recalculating '{}' over {} candles at {} produced no values",
            indicator.name(),
            window.len(),
            merged.timestamp
        ))
    })
}

impl IndicatorEngine {
    /// Merged finer candles covering `[current.timestamp, boundary)`.
    ///
    /// `boundary` is `next`'s timestamp, else the next base candle in the
    /// store; with neither, up to `progressive_fetch_limit` finer candles are
    /// taken. A fetched tail at or past the boundary is dropped. An empty or
    /// out-of-bounds range means finer data is missing and fails with `Range`.
    pub fn progressive_candles(
        &self,
        progressive: &Symbol,
        current: &Candle,
        next: Option<&Candle>,
    ) -> Result<MergedCandles, EngineError> {
        let boundary = match next {
            Some(next) => Some(next.timestamp),
            None => self
                .stores
                .candles
                .fetch_next_candle(self.symbol(), current.timestamp)?
                .map(|c| c.timestamp),
        };

        let mut sub_candles = match boundary {
            Some(boundary) => self.stores.candles.fetch_candles_between(
                progressive,
                current.timestamp,
                boundary,
            )?,
            None => self.stores.candles.fetch_candles_limit(
                progressive,
                current.timestamp,
                self.config.progressive_fetch_limit,
            )?,
        };

        if let (Some(boundary), Some(tail)) = (boundary, sub_candles.last()) {
            if tail.timestamp >= boundary {
                sub_candles.pop();
            }
        }

        let range_error = |reason: String| EngineError::Range {
            start: current.timestamp,
            boundary,
            reason,
        };
        let (Some(first), Some(last)) = (sub_candles.first(), sub_candles.last()) else {
            return Err(range_error(format!(
                "no {} candles stored for {}",
                progressive.interval, progressive.name
            )));
        };
        if first.timestamp < current.timestamp {
            return Err(range_error(format!("first sub-candle at {}", first.timestamp)));
        }
        if let Some(boundary) = boundary {
            if first.timestamp >= boundary || last.timestamp >= boundary {
                return Err(range_error(format!(
                    "sub-candles span [{}, {}]",
                    first.timestamp, last.timestamp
                )));
            }
        }

        Ok(MergedCandles::new(current.timestamp, boundary, sub_candles))
    }

    /// Indicator value recomputed at a finer-interval `timestamp`.
    ///
    /// Served from the progressive cache when present. Otherwise advances the
    /// cached merge sequence of the straddling base candle pair, recomputing
    /// and caching every sub-candle until `timestamp` is reached.
    pub fn progressive_value(
        &mut self,
        progressive: &Symbol,
        timestamp: i64,
    ) -> Result<IndicatorValue, EngineError> {
        self.check_progressive_symbol(progressive)?;
        if let Some(value) = self.progressive_data.get(&timestamp) {
            return Ok(value.clone());
        }

        let pn = self
            .candles
            .find_prev_next(timestamp)
            .ok_or_else(|| EngineError::Range {
                start: timestamp,
                boundary: self.candles.first().map(|c| c.timestamp),
                reason: "timestamp precedes the candle window".into(),
            })?;
        let key = (pn.prev.timestamp, pn.next.map(|c| c.timestamp));
        if !self.merges.contains_key(&key) {
            let merged = self.progressive_candles(progressive, &pn.prev, pn.next.as_ref())?;
            self.merges.insert(key, merged);
        }

        let history = self.candles.previous_candles(self.gap, pn.prev_index);
        let merged = self
            .merges
            .get_mut(&key)
            .ok_or_else(|| EngineError::Logic("merge sequence vanished from cache".into()))?;
        for sub in merged.by_ref() {
            let value = recalculate(self.indicator.as_ref(), history, &sub)?;
            self.progressive_data.insert(sub.timestamp, value.clone());
            if sub.timestamp == timestamp {
                debug!(
                    indicator = self.indicator.name(),
                    timestamp,
                    base = pn.prev.timestamp,
                    "progressive value recalculated"
                );
                return Ok(value);
            }
        }
        Err(EngineError::Recalculation { timestamp })
    }

    pub(crate) fn check_progressive_symbol(&self, progressive: &Symbol) -> Result<(), EngineError> {
        let symbol = self.symbol();
        if !progressive.same_market(symbol) {
            return Err(EngineError::Argument(format!(
                "progressive symbol {}:{} does not match {}:{}",
                progressive.exchange, progressive.name, symbol.exchange, symbol.name
            )));
        }
        if progressive.interval == symbol.interval {
            return Err(EngineError::Argument(format!(
                "progressive symbol must use a different interval than {}",
                symbol.interval
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merged_candles_run_ohlc() {
        let subs = vec![
            Candle::new(0, 10.0, 11.0, 9.5, 10.5, 1.0),
            Candle::new(60, 10.5, 12.0, 10.0, 11.5, 1.0),
            Candle::new(120, 11.5, 11.8, 9.0, 9.2, 1.0),
        ];
        let merged: Vec<Candle> = MergedCandles::new(0, Some(180), subs).collect();
        assert_eq!(merged.len(), 3);

        assert_eq!(merged[0], Candle::new(0, 10.0, 11.0, 9.5, 10.5, 1.0));
        assert_eq!(merged[1].open, 10.0);
        assert_eq!(merged[1].high, 12.0);
        assert_eq!(merged[1].close, 11.5);
        assert_eq!(merged[1].timestamp, 60);
        assert_eq!(merged[2].open, 10.0);
        assert_eq!(merged[2].high, 12.0);
        assert_eq!(merged[2].low, 9.0);
        assert_eq!(merged[2].close, 9.2);
        assert_eq!(merged[2].timestamp, 120);
    }

    #[test]
    fn merged_candles_resume_after_partial_consumption() {
        let subs = (0..4).map(|i| Candle::new(i * 60, 1.0, 2.0, 0.5, 1.0, 1.0)).collect();
        let mut merged = MergedCandles::new(0, None, subs);
        assert_eq!(merged.next().unwrap().timestamp, 0);
        assert_eq!(merged.next().unwrap().timestamp, 60);
        let rest: Vec<i64> = merged.map(|c| c.timestamp).collect();
        assert_eq!(rest, vec![120, 180]);
    }
}
