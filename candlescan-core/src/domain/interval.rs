//! Candle interval, stored as a whole number of seconds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntervalError {
    #[error("empty interval")]
    Empty,

    #[error("invalid interval '{0}' (expected e.g. 1m, 15m, 1h, 1d)")]
    Invalid(String),
}

/// Length of one candle. Parses and prints as `30s`, `5m`, `4h`, `1d`, `1w`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Interval(i64);

const UNITS: &[(char, i64)] = &[('w', 604_800), ('d', 86_400), ('h', 3_600), ('m', 60), ('s', 1)];

impl Interval {
    pub fn from_seconds(seconds: i64) -> Result<Self, IntervalError> {
        if seconds <= 0 {
            return Err(IntervalError::Invalid(format!("{seconds}s")));
        }
        Ok(Self(seconds))
    }

    pub fn minutes(n: i64) -> Self {
        Self(n.max(1).saturating_mul(60))
    }

    pub fn hours(n: i64) -> Self {
        Self(n.max(1).saturating_mul(3_600))
    }

    pub fn days(n: i64) -> Self {
        Self(n.max(1).saturating_mul(86_400))
    }

    pub fn seconds(&self) -> i64 {
        self.0
    }
}

impl FromStr for Interval {
    type Err = IntervalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let unit = s.chars().last().ok_or(IntervalError::Empty)?;
        let (_, scale) = UNITS
            .iter()
            .find(|(u, _)| *u == unit)
            .ok_or_else(|| IntervalError::Invalid(s.to_string()))?;
        let count: i64 = s[..s.len() - unit.len_utf8()]
            .parse()
            .map_err(|_| IntervalError::Invalid(s.to_string()))?;
        if count <= 0 {
            return Err(IntervalError::Invalid(s.to_string()));
        }
        count
            .checked_mul(*scale)
            .map(Self)
            .ok_or_else(|| IntervalError::Invalid(s.to_string()))
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (unit, scale) in UNITS {
            if self.0 % scale == 0 {
                return write!(f, "{}{}", self.0 / scale, unit);
            }
        }
        write!(f, "{}s", self.0)
    }
}

impl TryFrom<String> for Interval {
    type Error = IntervalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Interval> for String {
    fn from(value: Interval) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_intervals() {
        assert_eq!("1m".parse::<Interval>().unwrap().seconds(), 60);
        assert_eq!("15m".parse::<Interval>().unwrap().seconds(), 900);
        assert_eq!("4h".parse::<Interval>().unwrap().seconds(), 14_400);
        assert_eq!("1d".parse::<Interval>().unwrap().seconds(), 86_400);
    }

    #[test]
    fn display_uses_largest_unit() {
        assert_eq!(Interval::minutes(60).to_string(), "1h");
        assert_eq!(Interval::minutes(90).to_string(), "90m");
        assert_eq!(Interval::days(7).to_string(), "1w");
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!("".parse::<Interval>(), Err(IntervalError::Empty));
        assert!("1x".parse::<Interval>().is_err());
        assert!("0m".parse::<Interval>().is_err());
        assert!("m".parse::<Interval>().is_err());
        assert!(matches!(
            "999999999999999999w".parse::<Interval>(),
            Err(IntervalError::Invalid(_))
        ));
    }

    #[test]
    fn oversized_constructors_saturate() {
        assert_eq!(Interval::days(i64::MAX).seconds(), i64::MAX);
        assert_eq!(Interval::minutes(i64::MAX / 2).seconds(), i64::MAX);
    }

    #[test]
    fn serde_as_string() {
        let json = serde_json::to_string(&Interval::hours(1)).unwrap();
        assert_eq!(json, "\"1h\"");
        let back: Interval = serde_json::from_str("\"5m\"").unwrap();
        assert_eq!(back, Interval::minutes(5));
    }
}
