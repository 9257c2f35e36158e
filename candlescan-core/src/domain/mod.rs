//! Domain types for candlescan

pub mod candle;
pub mod ids;
pub mod interval;
pub mod series;
pub mod signal;
pub mod symbol;
pub mod value;

pub use candle::Candle;
pub use ids::{Signature, SymbolId};
pub use interval::{Interval, IntervalError};
pub use series::{CandleSeries, PrevNext, SeriesError};
pub use signal::{Side, Signal, SignalDraft, SignalKey, TradeSetup, TradeSetupKey};
pub use symbol::Symbol;
pub use value::IndicatorValue;
