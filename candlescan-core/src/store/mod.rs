//! Collaborator interfaces for candle data and signal persistence.
//!
//! The engine and composer receive these as injected trait objects; they
//! never reach for process-wide state. `InMemoryStore` implements both and
//! backs the runner and the tests.

pub mod memory;

pub use memory::InMemoryStore;

use thiserror::Error;

use crate::domain::{
    Candle, Interval, SeriesError, Signal, Signature, Symbol, SymbolId, TradeSetup,
};
use crate::signature::SignaturePayload;

/// Structured errors from a storage collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("symbol not found: {exchange}:{name} @ {interval}")]
    SymbolNotFound {
        exchange: String,
        name: String,
        interval: Interval,
    },

    #[error("unknown symbol id {0}")]
    UnknownSymbol(SymbolId),

    #[error("signature payload could not be serialized: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("stored candles do not form a series: {0}")]
    Series(#[from] SeriesError),

    #[error("store lock poisoned: {0}")]
    Poisoned(&'static str),

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Symbol resolution and candle window queries.
pub trait CandleStore: Send + Sync {
    /// Resolve an exchange market at one interval.
    fn fetch_symbol(&self, exchange: &str, name: &str, interval: Interval)
        -> Result<Symbol, StoreError>;

    /// Refresh the symbol's candles and return it with its new `updated_at`.
    fn update_candles(&self, symbol: &Symbol) -> Result<Symbol, StoreError>;

    /// Refresh only when the last update is more than `age_seconds` old.
    fn update_candles_if_older_than(
        &self,
        symbol: &Symbol,
        age_seconds: i64,
    ) -> Result<Symbol, StoreError> {
        let now = chrono::Utc::now().timestamp();
        if now - symbol.updated_at > age_seconds {
            self.update_candles(symbol)
        } else {
            Ok(symbol.clone())
        }
    }

    /// Candles with `start <= timestamp <= end`, ascending.
    fn fetch_candles_between(
        &self,
        symbol: &Symbol,
        start: i64,
        end: i64,
    ) -> Result<Vec<Candle>, StoreError>;

    /// At most `limit` candles at or after `from`, ascending.
    fn fetch_candles_limit(
        &self,
        symbol: &Symbol,
        from: i64,
        limit: usize,
    ) -> Result<Vec<Candle>, StoreError>;

    /// The most recent `limit` candles, ascending.
    fn fetch_latest_candles(&self, symbol: &Symbol, limit: usize)
        -> Result<Vec<Candle>, StoreError>;

    /// First candle strictly after `after`.
    fn fetch_next_candle(&self, symbol: &Symbol, after: i64) -> Result<Option<Candle>, StoreError>;

    /// Execution price-date of a signal observed over `[from, to)`.
    fn price_date(&self, symbol: &Symbol, from: i64, to: Option<i64>) -> Result<i64, StoreError>;
}

/// Signature registry and idempotent signal/setup persistence.
///
/// Each upsert is one atomic write: a setup is never visible without its
/// signals.
pub trait SignalStore: Send + Sync {
    /// Compute and record the signature of a configuration.
    fn register(&self, payload: &SignaturePayload) -> Result<Signature, StoreError>;

    /// Insert or replace the signal stored under the same [`crate::domain::SignalKey`].
    fn upsert_signal(&self, signal: &Signal) -> Result<(), StoreError>;

    /// Insert or replace the setup stored under the same [`crate::domain::TradeSetupKey`].
    fn upsert_trade_setup(&self, setup: &TradeSetup) -> Result<(), StoreError>;

    fn signals_for(&self, symbol_id: SymbolId, signature: &Signature)
        -> Result<Vec<Signal>, StoreError>;

    fn trade_setups_for(
        &self,
        symbol_id: SymbolId,
        signature: &Signature,
    ) -> Result<Vec<TradeSetup>, StoreError>;
}
