//! Band breakouts (Bollinger): the close leaving the band.

use super::Detector;
use crate::domain::{IndicatorValue, Signal, SignalDraft};
use crate::engine::{EngineError, IndicatorEngine};

/// Buy when the close pierces below `lower`, sell when it pierces above
/// `upper`. Only the bar that leaves the band fires.
#[derive(Debug, Clone, PartialEq)]
pub struct BandBreak {
    upper: String,
    lower: String,
    id: String,
}

impl BandBreak {
    pub fn new(upper: impl Into<String>, lower: impl Into<String>) -> Self {
        let upper = upper.into();
        let lower = lower.into();
        let id = format!("band_break({upper},{lower})");
        Self { upper, lower, id }
    }
}

impl Default for BandBreak {
    fn default() -> Self {
        Self::new("upper", "lower")
    }
}

impl Detector for BandBreak {
    fn id(&self) -> &str {
        &self.id
    }

    fn detect(
        &self,
        _prior: Option<&Signal>,
        engine: &IndicatorEngine,
        value: &IndicatorValue,
    ) -> Result<Option<SignalDraft>, EngineError> {
        let (Some(upper), Some(lower)) = (value.get(Some(&self.upper)), value.get(Some(&self.lower)))
        else {
            return Ok(None);
        };
        let close = engine.price()?;

        // Inside the band on the previous step, or no previous step at all.
        let was_inside = match (engine.previous_value(None)?, engine.candle(-1, None)?) {
            (Some(previous), Some(candle)) => {
                let above = previous.get(Some(&self.upper)).is_some_and(|u| candle.close > u);
                let below = previous.get(Some(&self.lower)).is_some_and(|l| candle.close < l);
                !above && !below
            }
            _ => true,
        };
        if !was_inside {
            return Ok(None);
        }

        if close < lower {
            Ok(Some(SignalDraft::buy("band_break_lower")))
        } else if close > upper {
            Ok(Some(SignalDraft::sell("band_break_upper")))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Side;
    use crate::engine::test_support::scan_with;
    use crate::indicator::PriceSource;
    use crate::indicators::Bollinger;

    #[test]
    fn fires_once_when_leaving_the_band() {
        let mut closes = vec![100.0, 101.0, 99.0, 100.0, 101.0, 99.0, 100.0];
        // The drop to 80 leaves the band; the step after it started outside.
        closes.extend([80.0, 79.0]);
        let signals = scan_with(
            Box::new(Bollinger::new(5, 1.5, PriceSource::Close)),
            &closes,
            &BandBreak::default(),
        );
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].side, Side::Buy);
        assert_eq!(signals[0].name, "band_break_lower");
        assert_eq!(signals[0].timestamp, 420);
    }
}
