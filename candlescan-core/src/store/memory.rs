//! In-memory collaborator: symbols, candles, signatures, signals and setups
//! behind `RwLock`s.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use super::{CandleStore, SignalStore, StoreError};
use crate::domain::{
    Candle, CandleSeries, Interval, Signal, SignalKey, Signature, Symbol, SymbolId,
    TradeSetup, TradeSetupKey,
};
use crate::signature::SignaturePayload;

#[derive(Debug, Default)]
pub struct InMemoryStore {
    symbols: RwLock<Vec<Symbol>>,
    candles: RwLock<HashMap<SymbolId, BTreeMap<i64, Candle>>>,
    signatures: RwLock<BTreeMap<Signature, String>>,
    signals: RwLock<BTreeMap<SignalKey, Signal>>,
    setups: RwLock<BTreeMap<TradeSetupKey, TradeSetup>>,
}

fn read<'a, T>(lock: &'a RwLock<T>, what: &'static str) -> Result<RwLockReadGuard<'a, T>, StoreError> {
    lock.read().map_err(|_| StoreError::Poisoned(what))
}

fn write<'a, T>(
    lock: &'a RwLock<T>,
    what: &'static str,
) -> Result<RwLockWriteGuard<'a, T>, StoreError> {
    lock.write().map_err(|_| StoreError::Poisoned(what))
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a market at an interval, returning the existing symbol if
    /// already present.
    pub fn add_symbol(
        &self,
        exchange: &str,
        name: &str,
        interval: Interval,
        updated_at: i64,
    ) -> Result<Symbol, StoreError> {
        let mut symbols = write(&self.symbols, "symbols")?;
        if let Some(existing) = symbols
            .iter()
            .find(|s| s.exchange == exchange && s.name == name && s.interval == interval)
        {
            return Ok(existing.clone());
        }
        let symbol = Symbol {
            id: SymbolId(symbols.len() as u64 + 1),
            exchange: exchange.to_string(),
            name: name.to_string(),
            interval,
            updated_at,
        };
        symbols.push(symbol.clone());
        Ok(symbol)
    }

    /// Insert candles for a symbol; a candle at an existing timestamp replaces it.
    pub fn insert_candles<I>(&self, symbol: &Symbol, candles: I) -> Result<usize, StoreError>
    where
        I: IntoIterator<Item = Candle>,
    {
        let mut all = write(&self.candles, "candles")?;
        let stored = all.entry(symbol.id).or_default();
        let before = stored.len();
        for candle in candles {
            stored.insert(candle.timestamp, candle);
        }
        Ok(stored.len() - before)
    }

    /// Load the latest `limit` candles of a symbol as a series.
    pub fn series(&self, symbol: &Symbol, limit: usize) -> Result<CandleSeries, StoreError> {
        let candles = self.fetch_latest_candles(symbol, limit)?;
        Ok(CandleSeries::new(symbol.clone(), candles)?)
    }

    pub fn signature_count(&self) -> Result<usize, StoreError> {
        Ok(read(&self.signatures, "signatures")?.len())
    }

    pub fn signal_count(&self) -> Result<usize, StoreError> {
        Ok(read(&self.signals, "signals")?.len())
    }

    pub fn trade_setup_count(&self) -> Result<usize, StoreError> {
        Ok(read(&self.setups, "setups")?.len())
    }

    fn with_candles<T>(
        &self,
        symbol: &Symbol,
        f: impl FnOnce(&BTreeMap<i64, Candle>) -> T,
    ) -> Result<T, StoreError> {
        let all = read(&self.candles, "candles")?;
        match all.get(&symbol.id) {
            Some(stored) => Ok(f(stored)),
            None => Ok(f(&BTreeMap::new())),
        }
    }
}

impl CandleStore for InMemoryStore {
    fn fetch_symbol(
        &self,
        exchange: &str,
        name: &str,
        interval: Interval,
    ) -> Result<Symbol, StoreError> {
        read(&self.symbols, "symbols")?
            .iter()
            .find(|s| s.exchange == exchange && s.name == name && s.interval == interval)
            .cloned()
            .ok_or_else(|| StoreError::SymbolNotFound {
                exchange: exchange.to_string(),
                name: name.to_string(),
                interval,
            })
    }

    /// Nothing to pull from in memory: the refresh only restamps `updated_at`.
    fn update_candles(&self, symbol: &Symbol) -> Result<Symbol, StoreError> {
        let mut symbols = write(&self.symbols, "symbols")?;
        let stored = symbols
            .iter_mut()
            .find(|s| s.id == symbol.id)
            .ok_or(StoreError::UnknownSymbol(symbol.id))?;
        stored.updated_at = chrono::Utc::now().timestamp();
        debug!(symbol = %stored.name, interval = %stored.interval, "candles refreshed");
        Ok(stored.clone())
    }

    fn fetch_candles_between(
        &self,
        symbol: &Symbol,
        start: i64,
        end: i64,
    ) -> Result<Vec<Candle>, StoreError> {
        if start > end {
            return Ok(Vec::new());
        }
        self.with_candles(symbol, |c| c.range(start..=end).map(|(_, v)| *v).collect())
    }

    fn fetch_candles_limit(
        &self,
        symbol: &Symbol,
        from: i64,
        limit: usize,
    ) -> Result<Vec<Candle>, StoreError> {
        self.with_candles(symbol, |c| c.range(from..).take(limit).map(|(_, v)| *v).collect())
    }

    fn fetch_latest_candles(
        &self,
        symbol: &Symbol,
        limit: usize,
    ) -> Result<Vec<Candle>, StoreError> {
        self.with_candles(symbol, |c| {
            let mut latest: Vec<Candle> = c.values().rev().take(limit).copied().collect();
            latest.reverse();
            latest
        })
    }

    fn fetch_next_candle(&self, symbol: &Symbol, after: i64) -> Result<Option<Candle>, StoreError> {
        self.with_candles(symbol, |c| {
            c.range((std::ops::Bound::Excluded(after), std::ops::Bound::Unbounded))
                .next()
                .map(|(_, v)| *v)
        })
    }

    /// The signal executes when its observation window closes.
    fn price_date(&self, symbol: &Symbol, from: i64, to: Option<i64>) -> Result<i64, StoreError> {
        Ok(to.unwrap_or(from + symbol.interval.seconds()))
    }
}

impl SignalStore for InMemoryStore {
    fn register(&self, payload: &SignaturePayload) -> Result<Signature, StoreError> {
        let canonical = payload.canonical_json()?;
        let signature = Signature::from_bytes(canonical.as_bytes());
        write(&self.signatures, "signatures")?
            .entry(signature.clone())
            .or_insert(canonical);
        Ok(signature)
    }

    fn upsert_signal(&self, signal: &Signal) -> Result<(), StoreError> {
        write(&self.signals, "signals")?.insert(signal.key(), signal.clone());
        Ok(())
    }

    fn upsert_trade_setup(&self, setup: &TradeSetup) -> Result<(), StoreError> {
        write(&self.setups, "setups")?.insert(setup.key(), setup.clone());
        Ok(())
    }

    fn signals_for(
        &self,
        symbol_id: SymbolId,
        signature: &Signature,
    ) -> Result<Vec<Signal>, StoreError> {
        Ok(read(&self.signals, "signals")?
            .values()
            .filter(|s| s.symbol_id == symbol_id && &s.indicator_signature == signature)
            .cloned()
            .collect())
    }

    fn trade_setups_for(
        &self,
        symbol_id: SymbolId,
        signature: &Signature,
    ) -> Result<Vec<TradeSetup>, StoreError> {
        Ok(read(&self.setups, "setups")?
            .values()
            .filter(|s| s.symbol_id == symbol_id && &s.signature_id == signature)
            .cloned()
            .collect())
    }
}
