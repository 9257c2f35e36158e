//! CandleSeries — an ordered, read-only window of candles for one symbol.

use thiserror::Error;

use super::{Candle, Symbol};

#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("candle {index} has timestamp {timestamp}, not after previous {previous}")]
    NotIncreasing {
        index: usize,
        previous: i64,
        timestamp: i64,
    },
}

/// Base-resolution neighbours of a timestamp.
///
/// `prev` is the last candle at or before the timestamp, `next` the first
/// candle strictly after it (absent past the end of the series).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrevNext {
    pub prev: Candle,
    pub next: Option<Candle>,
    pub prev_index: usize,
    pub next_index: Option<usize>,
}

/// Candles of one symbol+interval, strictly increasing by timestamp.
///
/// Callers load contiguous ranges; gaps are not repaired here.
#[derive(Debug, Clone, PartialEq)]
pub struct CandleSeries {
    symbol: Symbol,
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new(symbol: Symbol, candles: Vec<Candle>) -> Result<Self, SeriesError> {
        for (index, pair) in candles.windows(2).enumerate() {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(SeriesError::NotIncreasing {
                    index: index + 1,
                    previous: pair[0].timestamp,
                    timestamp: pair[1].timestamp,
                });
            }
        }
        Ok(Self { symbol, candles })
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn first(&self) -> Option<&Candle> {
        self.candles.first()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn candle_at(&self, index: usize) -> Option<&Candle> {
        self.candles.get(index)
    }

    /// Index of the candle stamped exactly `timestamp`.
    pub fn index_of(&self, timestamp: i64) -> Option<usize> {
        self.candles
            .binary_search_by_key(&timestamp, |c| c.timestamp)
            .ok()
    }

    pub fn timestamps(&self) -> impl Iterator<Item = i64> + '_ {
        self.candles.iter().map(|c| c.timestamp)
    }

    /// Neighbours straddling `timestamp`; `None` if it precedes the first candle.
    pub fn find_prev_next(&self, timestamp: i64) -> Option<PrevNext> {
        let after = self.candles.partition_point(|c| c.timestamp <= timestamp);
        let prev_index = after.checked_sub(1)?;
        let next_index = (after < self.candles.len()).then_some(after);
        Some(PrevNext {
            prev: self.candles[prev_index],
            next: next_index.map(|i| self.candles[i]),
            prev_index,
            next_index,
        })
    }

    /// Up to `count` candles immediately preceding `before_index`.
    pub fn previous_candles(&self, count: usize, before_index: usize) -> &[Candle] {
        let end = before_index.min(self.candles.len());
        &self.candles[end.saturating_sub(count)..end]
    }

    /// Candles with `start <= timestamp <= end`.
    pub fn between(&self, start: i64, end: i64) -> &[Candle] {
        let lo = self.candles.partition_point(|c| c.timestamp < start);
        let hi = self.candles.partition_point(|c| c.timestamp <= end);
        if lo >= hi {
            return &[];
        }
        &self.candles[lo..hi]
    }
}
