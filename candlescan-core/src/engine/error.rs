use thiserror::Error;

use crate::store::StoreError;

/// Failures of indicator evaluation. None of them is retried here; refetching
/// missing candles belongs to the store collaborator.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Bad indicator or strategy setup (e.g. more values than candles).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Caller passed a mismatched symbol/interval or an unusable detector.
    #[error("invalid argument: {0}")]
    Argument(String),

    /// Finer-resolution candles missing or outside `[start, boundary)`.
    #[error("sub-candles for [{start}, {boundary:?}) out of range: {reason}")]
    Range {
        start: i64,
        boundary: Option<i64>,
        reason: String,
    },

    /// Contract violation, e.g. reading the cursor outside a scan.
    #[error("logic error: {0}")]
    Logic(String),

    /// Progressive sub-candles ran out before reaching the target timestamp.
    #[error("progressive recalculation never reached timestamp {timestamp}")]
    Recalculation { timestamp: i64 },

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl EngineError {
    pub(crate) fn not_in_loop() -> Self {
        EngineError::Logic("not in a loop: the scan cursor is only readable during scan()".into())
    }
}
