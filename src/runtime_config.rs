// =============================================================================
// Runtime Configuration - service settings from JSON + environment
// =============================================================================
//
// Settings are read from an optional JSON file and then overridden from the
// environment (after `.env` has been loaded). All fields carry
// `#[serde(default)]` so that a partial file still deserialises.
// =============================================================================

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_prediction_workers() -> usize {
    4
}

fn default_prediction_queue_capacity() -> usize {
    100
}

fn default_prediction_timeout_secs() -> u64 {
    60
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level configuration for the backend service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Address the HTTP API listens on.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Base URL of the remote prediction service. Without it every
    /// prediction job fails.
    #[serde(default)]
    pub ml_backend_url: Option<String>,

    /// Number of prediction workers (fixed pool size).
    #[serde(default = "default_prediction_workers")]
    pub prediction_workers: usize,

    /// Bounded queue capacity; submissions beyond it fail immediately.
    #[serde(default = "default_prediction_queue_capacity")]
    pub prediction_queue_capacity: usize,

    /// Timeout for one remote prediction call.
    #[serde(default = "default_prediction_timeout_secs")]
    pub prediction_timeout_secs: u64,

    /// Largest accepted `/metric` request body.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            ml_backend_url: None,
            prediction_workers: default_prediction_workers(),
            prediction_queue_capacity: default_prediction_queue_capacity(),
            prediction_timeout_secs: default_prediction_timeout_secs(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(path = %path.display(), "runtime config loaded");
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`. Blank values are ignored, and so are
    /// numbers that fail to parse (with a warning).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(url) = get("ML_BACKEND") {
            self.ml_backend_url = Some(url);
        }
        if let Some(addr) = get("BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(n) = parse_override(get("PREDICTION_WORKERS"), "PREDICTION_WORKERS") {
            self.prediction_workers = n;
        }
        if let Some(n) = parse_override(get("PREDICTION_QUEUE_CAPACITY"), "PREDICTION_QUEUE_CAPACITY") {
            self.prediction_queue_capacity = n;
        }
        if let Some(n) = parse_override(get("PREDICTION_TIMEOUT_SECS"), "PREDICTION_TIMEOUT_SECS") {
            self.prediction_timeout_secs = n;
        }
    }

    pub fn prediction_timeout(&self) -> Duration {
        Duration::from_secs(self.prediction_timeout_secs)
    }
}

fn parse_override<T: FromStr>(raw: Option<String>, key: &str) -> Option<T> {
    let raw = raw?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparsable config override");
            None
        }
    }
}
