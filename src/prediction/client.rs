// =============================================================================
// Prediction Service Client - multipart upload of the raw price file
// =============================================================================
//
// One POST per job to `<base>/api/v1/predict` with the uploaded CSV under the
// form field `file`. A non-2xx status, a transport failure, or a body that is
// not a JSON object all surface as a `PredictionError`; the caller turns that
// into a failed outcome. There are no retries at this layer.
// =============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use super::PredictionError;

/// Path of the prediction endpoint relative to the configured base URL.
const PREDICT_PATH: &str = "/api/v1/predict";

/// Upper bound on how much of an error body is kept in the failure cause.
const MAX_ERROR_BODY: usize = 512;

/// HTTP client for the remote prediction service.
#[derive(Clone)]
pub struct PredictionClient {
    base_url: Option<String>,
    client: reqwest::Client,
}

impl PredictionClient {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Create a new client.
    ///
    /// # Arguments
    /// * `base_url` - service root, e.g. `http://ml:8000`. `None` leaves the
    ///   client unconfigured and every job fails with `NotConfigured`.
    /// * `timeout`  - bound on the whole request, including the body read.
    pub fn new(base_url: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build prediction HTTP client")?;

        let base_url = base_url.map(|url| url.trim_end_matches('/').to_string());
        debug!(base_url = ?base_url, timeout_secs = timeout.as_secs(), "PredictionClient initialised");

        Ok(Self { base_url, client })
    }

    /// The normalised base URL, if any.
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    // -------------------------------------------------------------------------
    // Prediction
    // -------------------------------------------------------------------------

    /// POST /api/v1/predict with `payload` as the `file` form part.
    #[instrument(skip(self, payload), fields(bytes = payload.len()), name = "prediction::predict")]
    pub async fn predict(
        &self,
        file_name: &str,
        payload: Vec<u8>,
    ) -> Result<Map<String, Value>, PredictionError> {
        let base = self.base_url.as_deref().ok_or(PredictionError::NotConfigured)?;
        let url = format!("{base}{PREDICT_PATH}");

        let form = Form::new().part("file", Part::bytes(payload).file_name(file_name.to_string()));

        let resp = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(PredictionError::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            let mut body = resp.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(PredictionError::BadStatus {
                status,
                body: body.trim().to_string(),
            });
        }

        let data: Map<String, Value> = resp.json().await.map_err(|e| {
            if e.is_decode() {
                PredictionError::Decode(e.to_string())
            } else {
                PredictionError::Transport(e)
            }
        })?;

        debug!(keys = data.len(), "prediction response decoded");
        Ok(data)
    }
}
