//! Threshold crossing (RSI style): buy on the way back up through `lower`,
//! sell on the way back down through `upper`.

use super::{bind_label, repeats_prior, Detector};
use crate::domain::{IndicatorValue, Signal, SignalDraft};
use crate::engine::{EngineError, IndicatorEngine};

#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdCross {
    bind: Option<String>,
    lower: f64,
    upper: f64,
    id: String,
}

impl ThresholdCross {
    pub fn new(bind: Option<String>, lower: f64, upper: f64) -> Self {
        let id = format!(
            "threshold_cross({},{lower},{upper})",
            bind_label(bind.as_deref())
        );
        Self {
            bind,
            lower,
            upper,
            id,
        }
    }
}

impl Detector for ThresholdCross {
    fn id(&self) -> &str {
        &self.id
    }

    fn detect(
        &self,
        prior: Option<&Signal>,
        engine: &IndicatorEngine,
        value: &IndicatorValue,
    ) -> Result<Option<SignalDraft>, EngineError> {
        let bind = self.bind.as_deref();
        let Some(current) = value.get(bind) else {
            return Ok(None);
        };
        let Some(previous) = engine.previous_value(bind)?.and_then(|v| v.as_f64()) else {
            return Ok(None);
        };

        let draft = if previous < self.lower && current >= self.lower {
            SignalDraft::buy("cross_above_lower")
        } else if previous > self.upper && current <= self.upper {
            SignalDraft::sell("cross_below_upper")
        } else {
            return Ok(None);
        };

        if repeats_prior(prior, &draft) {
            return Ok(None);
        }
        Ok(Some(draft))
    }
}
