//! Factory system: typed component configs into runtime trait objects.
//!
//! `create_indicator` and `create_detector` validate parameters up front so a
//! strategy with a bad period fails before any candle is touched.

use serde::{Deserialize, Serialize};

use crate::detectors::{BandBreak, Detector, PriceCross, ThresholdCross, ZeroCross};
use crate::indicator::{Indicator, PriceSource};
use crate::indicators::{Bollinger, Ema, Macd, Rsi, Sma};

// ─── Error type ──────────────────────────────────────────────────────

/// Errors that can occur during component construction.
#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
    #[error("Invalid {component} parameter '{param}': {reason}")]
    InvalidParam {
        component: &'static str,
        param: &'static str,
        reason: String,
    },
}

fn invalid(component: &'static str, param: &'static str, reason: impl Into<String>) -> FactoryError {
    FactoryError::InvalidParam {
        component,
        param,
        reason: reason.into(),
    }
}

fn require_period(component: &'static str, param: &'static str, value: usize) -> Result<(), FactoryError> {
    if value == 0 {
        return Err(invalid(component, param, "must be >= 1"));
    }
    Ok(())
}

// ─── Configs ─────────────────────────────────────────────────────────

fn default_period() -> usize {
    14
}

fn default_fast() -> usize {
    12
}

fn default_slow() -> usize {
    26
}

fn default_signal() -> usize {
    9
}

fn default_bollinger_period() -> usize {
    20
}

fn default_std_dev() -> f64 {
    2.0
}

fn default_lower() -> f64 {
    30.0
}

fn default_upper() -> f64 {
    70.0
}

fn default_upper_field() -> String {
    "upper".into()
}

fn default_lower_field() -> String {
    "lower".into()
}

/// One built-in indicator with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum IndicatorConfig {
    Sma {
        #[serde(default = "default_period")]
        period: usize,
        #[serde(default)]
        source: PriceSource,
    },
    Ema {
        #[serde(default = "default_period")]
        period: usize,
        #[serde(default)]
        source: PriceSource,
    },
    Rsi {
        #[serde(default = "default_period")]
        period: usize,
        #[serde(default)]
        source: PriceSource,
    },
    Macd {
        #[serde(default = "default_fast")]
        fast: usize,
        #[serde(default = "default_slow")]
        slow: usize,
        #[serde(default = "default_signal")]
        signal: usize,
        #[serde(default)]
        source: PriceSource,
    },
    Bollinger {
        #[serde(default = "default_bollinger_period")]
        period: usize,
        #[serde(default = "default_std_dev")]
        std_dev: f64,
        #[serde(default)]
        source: PriceSource,
    },
}

/// One built-in detector with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum DetectorConfig {
    ThresholdCross {
        #[serde(default)]
        bind: Option<String>,
        #[serde(default = "default_lower")]
        lower: f64,
        #[serde(default = "default_upper")]
        upper: f64,
    },
    ZeroCross {
        #[serde(default)]
        bind: Option<String>,
    },
    PriceCross {
        #[serde(default)]
        bind: Option<String>,
    },
    BandBreak {
        #[serde(default = "default_upper_field")]
        upper: String,
        #[serde(default = "default_lower_field")]
        lower: String,
    },
}

// ─── Indicator factory ───────────────────────────────────────────────

/// Create an indicator from an `IndicatorConfig`.
pub fn create_indicator(config: &IndicatorConfig) -> Result<Box<dyn Indicator>, FactoryError> {
    match *config {
        IndicatorConfig::Sma { period, source } => {
            require_period("sma", "period", period)?;
            Ok(Box::new(Sma::new(period, source)))
        }
        IndicatorConfig::Ema { period, source } => {
            require_period("ema", "period", period)?;
            Ok(Box::new(Ema::new(period, source)))
        }
        IndicatorConfig::Rsi { period, source } => {
            require_period("rsi", "period", period)?;
            Ok(Box::new(Rsi::new(period, source)))
        }
        IndicatorConfig::Macd {
            fast,
            slow,
            signal,
            source,
        } => {
            require_period("macd", "fast", fast)?;
            require_period("macd", "signal", signal)?;
            if slow <= fast {
                return Err(invalid("macd", "slow", format!("{slow} must be > fast ({fast})")));
            }
            Ok(Box::new(Macd::new(fast, slow, signal, source)))
        }
        IndicatorConfig::Bollinger {
            period,
            std_dev,
            source,
        } => {
            require_period("bollinger", "period", period)?;
            if !(std_dev.is_finite() && std_dev > 0.0) {
                return Err(invalid("bollinger", "std_dev", format!("{std_dev} must be > 0")));
            }
            Ok(Box::new(Bollinger::new(period, std_dev, source)))
        }
    }
}

// ─── Detector factory ────────────────────────────────────────────────

/// Create a detector from a `DetectorConfig`.
pub fn create_detector(config: &DetectorConfig) -> Result<Box<dyn Detector>, FactoryError> {
    match config {
        DetectorConfig::ThresholdCross { bind, lower, upper } => {
            if lower >= upper {
                return Err(invalid(
                    "threshold_cross",
                    "lower",
                    format!("{lower} must be < upper ({upper})"),
                ));
            }
            Ok(Box::new(ThresholdCross::new(bind.clone(), *lower, *upper)))
        }
        DetectorConfig::ZeroCross { bind } => Ok(Box::new(ZeroCross::new(bind.clone()))),
        DetectorConfig::PriceCross { bind } => Ok(Box::new(PriceCross::new(bind.clone()))),
        DetectorConfig::BandBreak { upper, lower } => {
            if upper.is_empty() || lower.is_empty() {
                return Err(invalid("band_break", "upper", "band field names must be non-empty"));
            }
            Ok(Box::new(BandBreak::new(upper.clone(), lower.clone())))
        }
    }
}
