// =============================================================================
// Result Store - per-ticker registry of pending predictions
// =============================================================================
//
// Maps a ticker to the result handle of its most recent job. Polling is
// non-blocking and consumes a resolved outcome exactly once: the entry is
// removed under the same lock that observed the value, so the next poll for
// that ticker reports `Idle`.
//
// Re-registering a ticker keeps "latest wins" semantics. The displaced job
// still runs to completion but its outcome is discarded; this is logged so it
// never happens silently.
// =============================================================================

use std::collections::HashMap;
use std::task::Poll;

use parking_lot::Mutex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::handle::ResultHandle;
use super::PredictionOutcome;

/// What a poll observed for a ticker.
#[derive(Debug, Clone, PartialEq)]
pub enum PollStatus {
    /// Nothing registered (never submitted, or already consumed).
    Idle,
    /// A job is registered but has not produced a result yet.
    Pending,
    Success(Map<String, Value>),
    Failed(String),
}

impl PollStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pending => "pending",
            Self::Success(_) => "success",
            Self::Failed(_) => "failed",
        }
    }
}

impl From<PredictionOutcome> for PollStatus {
    fn from(outcome: PredictionOutcome) -> Self {
        match outcome {
            PredictionOutcome::Success(data) => Self::Success(data),
            PredictionOutcome::Failed(cause) => Self::Failed(cause),
        }
    }
}

/// Thread-safe ticker → result handle registry.
#[derive(Default)]
pub struct ResultStore {
    entries: Mutex<HashMap<String, ResultHandle>>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handle` under `ticker`, replacing any earlier entry.
    ///
    /// Returns `true` when an unconsumed entry was displaced.
    pub fn register(&self, ticker: impl Into<String>, handle: ResultHandle) -> bool {
        let ticker = ticker.into();
        let displaced = self.entries.lock().insert(ticker.clone(), handle).is_some();

        if displaced {
            warn!(ticker = %ticker, "replaced unconsumed prediction - earlier outcome will be discarded");
        } else {
            debug!(ticker = %ticker, "prediction registered");
        }
        displaced
    }

    /// Non-blocking check of the job registered under `ticker`.
    pub fn poll(&self, ticker: &str) -> PollStatus {
        let mut entries = self.entries.lock();

        let Some(handle) = entries.get_mut(ticker) else {
            return PollStatus::Idle;
        };

        match handle.try_take() {
            Poll::Pending => PollStatus::Pending,
            Poll::Ready(outcome) => {
                entries.remove(ticker);
                let status = outcome.map(PollStatus::from).unwrap_or(PollStatus::Idle);
                debug!(ticker, status = status.as_str(), "prediction consumed");
                status
            }
        }
    }

    /// Number of tickers with an unconsumed entry.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
