//! Signal scanning: walking the value series with a cursor and a detector.
//!
//! `scan` is the only place a cursor exists. It is set before each step,
//! read by the detector through the engine, and cleared when the scan ends.
//! At most one signal is persisted per base step, also in progressive mode
//! where the detector runs once per merged sub-candle.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::progressive::recalculate;
use super::{EngineError, IndicatorEngine};
use crate::detectors::Detector;
use crate::domain::{Candle, IndicatorValue, Signal, SignalDraft, Signature, Symbol};
use crate::signature::SignaturePayload;
use crate::store::StoreError;

/// Cursor over the value series during a scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanState {
    /// Position in the value series.
    pub index: usize,
    pub prev: Option<i64>,
    pub current: i64,
    pub next: Option<i64>,
    /// Value handed to the detector (recomputed in progressive mode).
    pub value: IndicatorValue,
    /// Candle handed to the detector (merged sub-candle in progressive mode).
    pub candle: Candle,
}

/// One step of a scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanStep {
    pub signal: Option<Signal>,
    pub timestamp: i64,
    pub price_date: Option<i64>,
}

struct Detection {
    draft: SignalDraft,
    candle: Candle,
    from: i64,
    to: Option<i64>,
}

impl IndicatorEngine {
    /// The active cursor; `Logic` outside a scan.
    pub fn cursor(&self) -> Result<&ScanState, EngineError> {
        self.state.as_ref().ok_or_else(EngineError::not_in_loop)
    }

    /// Value the detector is currently looking at, resolved against `bind`.
    pub fn current_value(&self, bind: Option<&str>) -> Result<Option<IndicatorValue>, EngineError> {
        Ok(self.cursor()?.value.bind(bind))
    }

    /// Base value of the previous step.
    pub fn previous_value(&self, bind: Option<&str>) -> Result<Option<IndicatorValue>, EngineError> {
        match self.cursor()?.prev {
            Some(prev) => self.base_value(bind, Some(prev)),
            None => Ok(None),
        }
    }

    /// Base value of the following step.
    pub fn next_value(&self, bind: Option<&str>) -> Result<Option<IndicatorValue>, EngineError> {
        match self.cursor()?.next {
            Some(next) => self.base_value(bind, Some(next)),
            None => Ok(None),
        }
    }

    /// Register the signature of this engine driven by `detector`.
    pub fn register(&self, detector: Option<&dyn Detector>) -> Result<Signature, EngineError> {
        let config = serde_json::json!({
            "indicator": self.indicator.config(),
            "engine": self.config,
        });
        let payload = SignaturePayload::indicator(
            self.indicator.id(),
            &config,
            detector.map(|d| d.id()),
        )
        .map_err(StoreError::from)?;
        Ok(self.stores.signals.register(&payload)?)
    }

    /// Walk the value series in timestamp order.
    ///
    /// Without a detector every step is yielded with no signal. With one,
    /// each detected signal is stamped, upserted through the signal store
    /// and recorded in [`signals`](Self::signals). A detector with an empty
    /// id is rejected before the first step.
    pub fn scan(&mut self, detector: Option<&dyn Detector>) -> Result<Vec<ScanStep>, EngineError> {
        if let Some(detector) = detector {
            if detector.id().trim().is_empty() {
                return Err(EngineError::Argument(
                    "detector must declare a non-empty id".into(),
                ));
            }
        }
        let signature = self.register(detector)?;
        self.signature = Some(signature.clone());

        self.state = None;
        let result = self.walk(detector, &signature);
        self.state = None;
        self.merges.clear();

        if let Ok(steps) = &result {
            debug!(
                indicator = self.indicator.name(),
                symbol = %self.symbol().name,
                steps = steps.len(),
                signals = steps.iter().filter(|s| s.signal.is_some()).count(),
                "scan finished"
            );
        }
        result
    }

    fn walk(
        &mut self,
        detector: Option<&dyn Detector>,
        signature: &Signature,
    ) -> Result<Vec<ScanStep>, EngineError> {
        let mut steps = Vec::with_capacity(self.values.len());
        let mut prior: Option<Signal> = None;
        let progressive = self.progressive_symbol.clone();

        for index in 0..self.values.len() {
            let (timestamp, value) = self.values[index].clone();
            let candle_index = self.gap + index;
            let candle = self.candles.candles()[candle_index];
            self.state = Some(ScanState {
                index,
                prev: index.checked_sub(1).map(|i| self.values[i].0),
                current: timestamp,
                next: self.values.get(index + 1).map(|(t, _)| *t),
                value: value.clone(),
                candle,
            });

            let Some(detector) = detector else {
                steps.push(ScanStep {
                    signal: None,
                    timestamp,
                    price_date: None,
                });
                continue;
            };

            let detection = match &progressive {
                Some(fine) => self.detect_progressive(detector, fine, candle_index, prior.as_ref())?,
                None => detector
                    .detect(prior.as_ref(), self, &value)?
                    .map(|draft| Detection {
                        draft,
                        candle,
                        from: timestamp,
                        to: self.values.get(index + 1).map(|(t, _)| *t),
                    }),
            };

            let Some(detection) = detection else {
                steps.push(ScanStep {
                    signal: None,
                    timestamp,
                    price_date: None,
                });
                continue;
            };

            let price_symbol = progressive.as_ref().unwrap_or(self.candles.symbol());
            let price_date =
                self.stores
                    .candles
                    .price_date(price_symbol, detection.from, detection.to)?;
            let signal = Signal {
                symbol_id: self.symbol().id,
                indicator_signature: signature.clone(),
                side: detection.draft.side,
                name: detection.draft.name,
                timestamp,
                price: detection.draft.price.unwrap_or(detection.candle.close),
                price_date,
            };
            self.stores.signals.upsert_signal(&signal)?;
            self.signals.push(signal.clone());
            steps.push(ScanStep {
                signal: Some(signal.clone()),
                timestamp,
                price_date: Some(price_date),
            });
            prior = Some(signal);
        }

        Ok(steps)
    }

    /// Run the detector over the merged sub-candles of one base step,
    /// stopping at the first signal.
    fn detect_progressive(
        &mut self,
        detector: &dyn Detector,
        fine: &Symbol,
        candle_index: usize,
        prior: Option<&Signal>,
    ) -> Result<Option<Detection>, EngineError> {
        let current = self.candles.candles()[candle_index];
        let next_base = self.candles.candle_at(candle_index + 1).copied();
        let sequence = self.progressive_candles(fine, &current, next_base.as_ref())?;
        // Falls back to the store's next base candle past the window.
        let boundary = sequence.boundary();
        let merged: Vec<Candle> = sequence.collect();
        let base_value = self.cursor()?.value.clone();

        for (i, sub) in merged.iter().enumerate() {
            // With recalculation off every sub-candle sees the base value.
            let value = if self.config.recalculate {
                let history = self.candles.previous_candles(self.gap, candle_index);
                let value = recalculate(self.indicator.as_ref(), history, sub)?;
                self.progressive_data.insert(sub.timestamp, value.clone());
                value
            } else {
                base_value.clone()
            };
            if let Some(state) = self.state.as_mut() {
                state.value = value.clone();
                state.candle = *sub;
            }

            if let Some(draft) = detector.detect(prior, self, &value)? {
                let to = merged
                    .get(i + 1)
                    .map(|c| c.timestamp)
                    .or(boundary);
                return Ok(Some(Detection {
                    draft,
                    candle: *sub,
                    from: sub.timestamp,
                    to,
                }));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::{Detector, FnDetector};
    use crate::domain::{Side, SignalDraft};
    use crate::engine::test_support::engine_with;
    use crate::indicator::PriceSource;
    use crate::indicators::Sma;
    use crate::store::SignalStore;

    fn buy_every_step() -> impl Detector {
        FnDetector::new("always_buy", |_, _, _| Ok(Some(SignalDraft::buy("always"))))
    }

    #[test]
    fn scan_without_detector_yields_every_step() {
        let (_, mut engine) = engine_with(Box::new(Sma::new(2, PriceSource::Close)), &[1.0, 2.0, 3.0, 4.0]);
        let steps = engine.scan(None).unwrap();
        let ts: Vec<i64> = steps.iter().map(|s| s.timestamp).collect();
        assert_eq!(ts, vec![60, 120, 180]);
        assert!(steps.iter().all(|s| s.signal.is_none() && s.price_date.is_none()));
    }

    #[test]
    fn cursor_is_cleared_after_scan() {
        let (_, mut engine) = engine_with(Box::new(Sma::new(1, PriceSource::Close)), &[1.0, 2.0]);
        engine.scan(None).unwrap();
        assert!(matches!(engine.cursor(), Err(EngineError::Logic(_))));
        assert!(matches!(engine.current_value(None), Err(EngineError::Logic(_))));
    }

    #[test]
    fn cursor_exposes_neighbours_to_detector() {
        let (_, mut engine) = engine_with(Box::new(Sma::new(1, PriceSource::Close)), &[1.0, 2.0, 3.0]);
        let detector = FnDetector::new("neighbours", |_, engine: &IndicatorEngine, _: &IndicatorValue| {
            let state = engine.cursor()?;
            if state.index == 1 {
                assert_eq!(state.prev, Some(0));
                assert_eq!(state.next, Some(120));
                assert_eq!(engine.previous_value(None)?, Some(IndicatorValue::Scalar(1.0)));
                assert_eq!(engine.next_value(None)?, Some(IndicatorValue::Scalar(3.0)));
                assert_eq!(engine.price()?, 2.0);
            }
            Ok(None)
        });
        let steps = engine.scan(Some(&detector)).unwrap();
        assert_eq!(steps.len(), 3);
    }

    #[test]
    fn signals_are_stamped_and_persisted() {
        let (store, mut engine) = engine_with(Box::new(Sma::new(1, PriceSource::Close)), &[5.0, 6.0]);
        let detector = buy_every_step();
        let steps = engine.scan(Some(&detector)).unwrap();

        let signal = steps[1].signal.as_ref().unwrap();
        assert_eq!(signal.side, Side::Buy);
        assert_eq!(signal.timestamp, 60);
        assert_eq!(signal.price, 6.0);
        // Last step: no next timestamp, one base interval later.
        assert_eq!(signal.price_date, 120);
        assert_eq!(steps[0].price_date, Some(60));

        let signature = engine.signature().unwrap().clone();
        let stored = store.signals_for(engine.symbol().id, &signature).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(engine.signals().len(), 2);
    }

    #[test]
    fn draft_price_is_kept() {
        let (_, mut engine) = engine_with(Box::new(Sma::new(1, PriceSource::Close)), &[5.0]);
        let detector = FnDetector::new("priced", |_, _, _| {
            Ok(Some(SignalDraft::sell("priced").with_price(4.5)))
        });
        engine.scan(Some(&detector)).unwrap();
        assert_eq!(engine.signals()[0].price, 4.5);
    }

    #[test]
    fn empty_detector_id_is_rejected_before_any_step() {
        let (store, mut engine) = engine_with(Box::new(Sma::new(1, PriceSource::Close)), &[1.0, 2.0]);
        let detector = FnDetector::new("  ", |_, _, _| panic!("detector must not run"));
        let result = engine.scan(Some(&detector));
        assert!(matches!(result, Err(EngineError::Argument(_))));
        assert_eq!(store.signature_count().unwrap(), 0);
    }

    #[test]
    fn identical_setups_register_the_same_signature() {
        let (_, mut a) = engine_with(Box::new(Sma::new(3, PriceSource::Close)), &[1.0, 2.0, 3.0]);
        let (_, mut b) = engine_with(Box::new(Sma::new(3, PriceSource::Close)), &[1.0, 2.0, 3.0]);
        let detector = buy_every_step();
        a.scan(Some(&detector)).unwrap();
        b.scan(Some(&detector)).unwrap();
        assert_eq!(a.signature(), b.signature());

        let other = FnDetector::new("other", |_, _, _| Ok(None));
        b.scan(Some(&other)).unwrap();
        assert_ne!(a.signature(), b.signature());
    }

    #[test]
    fn detector_errors_abort_the_scan_and_clear_the_cursor() {
        let (_, mut engine) = engine_with(Box::new(Sma::new(1, PriceSource::Close)), &[1.0, 2.0]);
        let detector = FnDetector::new("failing", |_, _, _| {
            Err(EngineError::Configuration("missing threshold".into()))
        });
        assert!(matches!(
            engine.scan(Some(&detector)),
            Err(EngineError::Configuration(_))
        ));
        assert!(engine.cursor().is_err());
    }
}
