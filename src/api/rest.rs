// =============================================================================
// REST API Endpoints - Axum 0.7
// =============================================================================
//
//   GET  /health            liveness + queue depth
//   POST /metric            multipart {file, ticker}: indicators now,
//                           prediction queued in the background
//   GET  /poll?ticker=X     non-blocking prediction status for a ticker
//
// CORS is permissive so the dashboard can call the API from another origin.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::api::ApiError;
use crate::app_state::AppState;
use crate::indicators::{compute_indicators, IndicatorSet};
use crate::ingest::close_prices;
use crate::prediction::PollStatus;

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health))
        .route("/metric", post(metric))
        .route("/poll", get(poll))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    server_time: i64,
    uptime_secs: u64,
    prediction_workers: usize,
    queued_predictions: usize,
    unconsumed_results: usize,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        server_time: chrono::Utc::now().timestamp_millis(),
        uptime_secs: state.uptime_secs(),
        prediction_workers: state.dispatcher.workers(),
        queued_predictions: state.dispatcher.queued(),
        unconsumed_results: state.results.len(),
    })
}

// =============================================================================
// Metric - indicators now, prediction later
// =============================================================================

struct MetricUpload {
    file: Option<(String, Vec<u8>)>,
    ticker: Option<String>,
}

async fn read_upload(mut multipart: Multipart) -> Result<MetricUpload, ApiError> {
    let mut upload = MetricUpload {
        file: None,
        ticker: None,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::multipart("Invalid multipart body", e))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload.csv").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::multipart("Failed to read uploaded file", e))?;
                upload.file = Some((file_name, bytes.to_vec()));
            }
            Some("ticker") => {
                let ticker = field
                    .text()
                    .await
                    .map_err(|e| ApiError::multipart("Failed to read ticker", e))?;
                upload.ticker = Some(ticker);
            }
            _ => {}
        }
    }

    Ok(upload)
}

async fn metric(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<IndicatorSet>, ApiError> {
    let multipart = multipart.map_err(|_| ApiError::bad_request("CSV file is required"))?;
    let upload = read_upload(multipart).await?;

    let (file_name, bytes) = upload
        .file
        .ok_or_else(|| ApiError::bad_request("CSV file is required"))?;
    let ticker = upload
        .ticker
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::bad_request("Ticker is required"))?;

    let closes = close_prices(&bytes)?;
    let close_count = closes.len();

    let indicators = tokio::task::spawn_blocking(move || compute_indicators(&closes))
        .await
        .map_err(|e| ApiError::Internal(format!("indicator computation failed: {e}")))??;

    let handle = state.dispatcher.submit(file_name.as_str(), bytes);
    let replaced = state.results.register(ticker.as_str(), handle);

    info!(
        ticker = %ticker,
        file_name = %file_name,
        closes = close_count,
        replaced,
        "indicators computed, prediction submitted"
    );

    Ok(Json(indicators))
}

// =============================================================================
// Poll
// =============================================================================

#[derive(Deserialize)]
struct PollParams {
    #[serde(default)]
    ticker: Option<String>,
}

#[derive(Debug, Serialize)]
struct PollResponse {
    status: &'static str,
    predictions: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<PollStatus> for PollResponse {
    fn from(status: PollStatus) -> Self {
        let label = status.as_str();
        match status {
            PollStatus::Success(data) => Self {
                status: label,
                predictions: Some(data),
                error: None,
            },
            PollStatus::Failed(cause) => Self {
                status: label,
                predictions: None,
                error: Some(cause),
            },
            PollStatus::Idle | PollStatus::Pending => Self {
                status: label,
                predictions: None,
                error: None,
            },
        }
    }
}

async fn poll(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PollParams>,
) -> Result<Json<PollResponse>, ApiError> {
    let ticker = params
        .ticker
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::bad_request("ticker parameter required"))?;

    Ok(Json(state.results.poll(&ticker).into()))
}
