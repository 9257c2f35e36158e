//! Signals and trade setups — the records a scan and a strategy emit.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Signature, SymbolId};

/// Direction of a signal or setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// What a detector returns: the market event without its stamping.
///
/// The engine fills in symbol, signature, timestamp, price-date and (when
/// unset) the price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalDraft {
    pub side: Side,
    pub name: String,
    pub price: Option<f64>,
}

impl SignalDraft {
    pub fn new(side: Side, name: impl Into<String>) -> Self {
        Self {
            side,
            name: name.into(),
            price: None,
        }
    }

    pub fn buy(name: impl Into<String>) -> Self {
        Self::new(Side::Buy, name)
    }

    pub fn sell(name: impl Into<String>) -> Self {
        Self::new(Side::Sell, name)
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }
}

/// A signal emitted by one indicator scan, persisted idempotently under
/// [`SignalKey`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub symbol_id: SymbolId,
    pub indicator_signature: Signature,
    pub side: Side,
    pub name: String,
    pub timestamp: i64,
    pub price: f64,
    pub price_date: i64,
}

/// Unique key of a persisted signal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SignalKey {
    pub symbol_id: SymbolId,
    pub indicator_signature: Signature,
    pub timestamp: i64,
    pub name: String,
}

impl Signal {
    pub fn key(&self) -> SignalKey {
        SignalKey {
            symbol_id: self.symbol_id,
            indicator_signature: self.indicator_signature.clone(),
            timestamp: self.timestamp,
            name: self.name.clone(),
        }
    }
}

/// Ordered, same-side signals matched across indicators by a setup rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSetup {
    pub symbol_id: SymbolId,
    pub side: Side,
    /// Component signal names joined with `|`.
    pub name: String,
    pub signal_count: usize,
    pub timestamp: i64,
    pub price: f64,
    pub price_date: i64,
    pub signature_id: Signature,
    pub signals: Vec<Signal>,
}

/// Unique key of a persisted trade setup.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TradeSetupKey {
    pub symbol_id: SymbolId,
    pub signature_id: Signature,
    pub timestamp: i64,
    pub name: String,
}

impl TradeSetup {
    pub fn key(&self) -> TradeSetupKey {
        TradeSetupKey {
            symbol_id: self.symbol_id,
            signature_id: self.signature_id.clone(),
            timestamp: self.timestamp,
            name: self.name.clone(),
        }
    }
}
