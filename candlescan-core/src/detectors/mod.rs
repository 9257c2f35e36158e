//! Signal detection — turns indicator values into buy/sell drafts.
//!
//! A detector sees the engine only through its read-only scan API (cursor
//! values, current price, shifted candles) plus the previous signal of the
//! same scan. It never persists anything; stamping and upserting is the
//! engine's job.

pub mod band;
pub mod cross;
pub mod threshold;

pub use band::BandBreak;
pub use cross::{PriceCross, ZeroCross};
pub use threshold::ThresholdCross;

use crate::domain::{IndicatorValue, Signal, SignalDraft};
use crate::engine::{EngineError, IndicatorEngine};

/// Per-step signal detection driven by [`IndicatorEngine::scan`].
pub trait Detector: Send + Sync {
    /// Stable identity, folded into the engine signature. Must be non-empty
    /// and must change whenever the detection logic or its parameters do.
    fn id(&self) -> &str;

    /// Inspect `value` at the engine's cursor; `prior` is the last signal
    /// emitted by this scan.
    fn detect(
        &self,
        prior: Option<&Signal>,
        engine: &IndicatorEngine,
        value: &IndicatorValue,
    ) -> Result<Option<SignalDraft>, EngineError>;
}

/// A closure with a caller-supplied id.
pub struct FnDetector<F> {
    id: String,
    f: F,
}

impl<F> FnDetector<F>
where
    F: Fn(Option<&Signal>, &IndicatorEngine, &IndicatorValue) -> Result<Option<SignalDraft>, EngineError>
        + Send
        + Sync,
{
    pub fn new(id: impl Into<String>, f: F) -> Self {
        Self { id: id.into(), f }
    }
}

impl<F> Detector for FnDetector<F>
where
    F: Fn(Option<&Signal>, &IndicatorEngine, &IndicatorValue) -> Result<Option<SignalDraft>, EngineError>
        + Send
        + Sync,
{
    fn id(&self) -> &str {
        &self.id
    }

    fn detect(
        &self,
        prior: Option<&Signal>,
        engine: &IndicatorEngine,
        value: &IndicatorValue,
    ) -> Result<Option<SignalDraft>, EngineError> {
        (self.f)(prior, engine, value)
    }
}

/// `true` when `prior` already points the same way as `draft`.
pub(crate) fn repeats_prior(prior: Option<&Signal>, draft: &SignalDraft) -> bool {
    prior.is_some_and(|p| p.side == draft.side)
}

fn bind_label(bind: Option<&str>) -> &str {
    bind.unwrap_or("value")
}
