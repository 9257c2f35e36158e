//! Candlescan Core — indicator evaluation over OHLC candles.
//!
//! This crate contains:
//! - Domain types (candles, symbols, intervals, signals, trade setups)
//! - Indicator algorithms behind a pure `Indicator` trait
//! - `IndicatorEngine`: tail-aligned value series, progressive recalculation
//!   over merged finer candles, and the signal scan
//! - Detectors that turn values into buy/sell drafts
//! - `StrategyComposer`: chaining signals across indicators into trade setups
//! - Content signatures and the collaborator traits for candle and signal
//!   storage, with an in-memory implementation

pub mod composer;
pub mod detectors;
pub mod domain;
pub mod engine;
pub mod factory;
pub mod indicator;
pub mod indicators;
pub mod signature;
pub mod store;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: engines and composers can move to worker threads,
    /// one per symbol.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Candle>();
        require_sync::<domain::Candle>();
        require_send::<domain::CandleSeries>();
        require_sync::<domain::CandleSeries>();
        require_send::<domain::Signal>();
        require_sync::<domain::Signal>();
        require_send::<domain::TradeSetup>();
        require_sync::<domain::TradeSetup>();
        require_send::<domain::IndicatorValue>();
        require_sync::<domain::IndicatorValue>();

        // Engine and composer
        require_send::<engine::IndicatorEngine>();
        require_sync::<engine::IndicatorEngine>();
        require_send::<engine::Collaborators>();
        require_sync::<engine::Collaborators>();
        require_send::<composer::StrategyComposer>();
        require_sync::<composer::StrategyComposer>();

        // Stores
        require_send::<store::InMemoryStore>();
        require_sync::<store::InMemoryStore>();
    }

    /// Detectors read the engine through a shared reference only.
    #[test]
    fn detector_sees_engine_read_only() {
        fn _check_trait_object_builds(
            detector: &dyn detectors::Detector,
            engine: &engine::IndicatorEngine,
            value: &domain::IndicatorValue,
        ) -> Result<Option<domain::SignalDraft>, engine::EngineError> {
            detector.detect(None, engine, value)
        }
    }
}
