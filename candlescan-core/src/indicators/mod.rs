//! Concrete indicator implementations.
//!
//! Every indicator implements [`Indicator`](crate::indicator::Indicator) and
//! returns tail-aligned values: `candles.len() - lookback()` of them once the
//! window is long enough, none before.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use bollinger::Bollinger;
pub use ema::{ema_of_series, Ema};
pub use macd::Macd;
pub use rsi::Rsi;
pub use sma::{sma_of_series, Sma};

/// Create synthetic candles from close prices for testing.
///
/// One-minute spacing from t=0: open = prev_close (or close for the first
/// candle), high = max(open,close) + 1.0, low = min(open,close) - 1.0,
/// volume = 1000.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<crate::domain::Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            crate::domain::Candle::new(
                i as i64 * 60,
                open,
                open.max(close) + 1.0,
                open.min(close) - 1.0,
                close,
                1000.0,
            )
        })
        .collect()
}

/// Unwrap scalar outputs for assertions.
#[cfg(test)]
pub fn scalars(values: &[crate::domain::IndicatorValue]) -> Vec<f64> {
    values
        .iter()
        .map(|v| v.as_f64().expect("scalar indicator value"))
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
