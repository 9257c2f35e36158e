use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One indicator output: a single number or a set of named fields
/// (e.g. `{macd, signal, histogram}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndicatorValue {
    Scalar(f64),
    Fields(BTreeMap<String, f64>),
}

impl IndicatorValue {
    pub fn fields<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self::Fields(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Resolve a bind against this value.
    ///
    /// A scalar is returned as-is whatever the bind; a field set yields the
    /// named field, or the whole set when `bind` is `None`.
    pub fn bind(&self, bind: Option<&str>) -> Option<IndicatorValue> {
        match (self, bind) {
            (IndicatorValue::Scalar(_), _) | (IndicatorValue::Fields(_), None) => Some(self.clone()),
            (IndicatorValue::Fields(fields), Some(name)) => {
                fields.get(name).map(|v| IndicatorValue::Scalar(*v))
            }
        }
    }

    /// Numeric view of a bind: the scalar itself or the named field.
    pub fn get(&self, bind: Option<&str>) -> Option<f64> {
        match self.bind(bind)? {
            IndicatorValue::Scalar(v) => Some(v),
            IndicatorValue::Fields(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            IndicatorValue::Scalar(v) => Some(*v),
            IndicatorValue::Fields(_) => None,
        }
    }
}

impl From<f64> for IndicatorValue {
    fn from(value: f64) -> Self {
        IndicatorValue::Scalar(value)
    }
}
