// =============================================================================
// Central Application State
// =============================================================================
//
// Shared by every request handler via `Arc<AppState>`.
//
// Thread safety:
//   - The dispatcher owns its queue and worker tasks; submission is `&self`.
//   - The result store guards its map with a single mutex.
//   - Everything else is read-only after construction.
// =============================================================================

use std::time::Instant;

use anyhow::Result;

use crate::prediction::{PredictionClient, PredictionDispatcher, ResultStore};
use crate::runtime_config::RuntimeConfig;

pub struct AppState {
    pub config: RuntimeConfig,
    pub dispatcher: PredictionDispatcher,
    pub results: ResultStore,
    /// Instant when the service was started. Used for uptime reporting.
    pub start_time: Instant,
}

impl AppState {
    /// Build the prediction client and worker pool from `config`.
    ///
    /// Spawns the dispatcher workers, so it must run inside a Tokio runtime.
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        let client = PredictionClient::new(config.ml_backend_url.clone(), config.prediction_timeout())?;
        let dispatcher = PredictionDispatcher::new(
            client,
            config.prediction_workers,
            config.prediction_queue_capacity,
        );

        Ok(Self {
            config,
            dispatcher,
            results: ResultStore::new(),
            start_time: Instant::now(),
        })
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
