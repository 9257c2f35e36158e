use serde::{Deserialize, Serialize};

use super::{Interval, SymbolId};

/// A market on an exchange, resolved at one candle interval.
///
/// The same market at two intervals is two `Symbol`s with distinct ids that
/// share `exchange` and `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub id: SymbolId,
    pub exchange: String,
    pub name: String,
    pub interval: Interval,
    /// Unix seconds of the last candle refresh.
    pub updated_at: i64,
}

impl Symbol {
    /// True when both symbols describe the same market, regardless of interval.
    pub fn same_market(&self, other: &Symbol) -> bool {
        self.exchange == other.exchange && self.name == other.name
    }
}
