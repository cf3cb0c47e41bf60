// =============================================================================
// Prediction Module
// =============================================================================
//
// Asynchronous model predictions for uploaded price files:
// - Remote client for the prediction service (multipart POST)
// - Bounded worker pool that forwards jobs and fails fast when saturated
// - One-shot result handles, written once by a worker
// - Per-ticker result store consumed by the `/poll` endpoint

pub mod client;
pub mod dispatcher;
pub mod handle;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

use serde_json::{Map, Value};
use thiserror::Error;

pub use client::PredictionClient;
pub use dispatcher::PredictionDispatcher;
pub use handle::ResultHandle;
pub use store::{PollStatus, ResultStore};

/// Terminal outcome of one prediction job.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionOutcome {
    /// The service answered with a JSON object.
    Success(Map<String, Value>),
    /// The job failed; the string is the cause shown to pollers.
    Failed(String),
}

/// Every way a prediction job can fail before producing data.
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("prediction service busy, try again later")]
    Busy,

    #[error("prediction service is shutting down")]
    Closed,

    #[error("ML backend URL is not configured")]
    NotConfigured,

    #[error("prediction request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("prediction service returned {status}: {body}")]
    BadStatus {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to decode prediction response: {0}")]
    Decode(String),

    #[error("prediction job dropped before completion")]
    Dropped,
}

impl From<PredictionError> for PredictionOutcome {
    fn from(err: PredictionError) -> Self {
        Self::Failed(err.to_string())
    }
}
