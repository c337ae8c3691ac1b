//! Record processing endpoints
//!
//! JSON in, JSON out. Each endpoint exposes one pipeline stage, plus
//! `/api/process` for the whole pipeline.
//!
//! - `POST /api/extract`  `{"text": "..."}` → `{"partial": ..., "remaining": "..."}`
//! - `POST /api/merge`    `{"high_trust": ..., "low_trust": ...}` → canonical record
//! - `POST /api/skr`      canonical record → SKR result
//! - `POST /api/process`  `{"text": "..."}` → processed record

use crate::extractors::{self, Extraction};
use crate::fusion;
use crate::record::CanonicalRecord;
use crate::skr::SkrResult;
use crate::workflow::ProcessedRecord;
use crate::{ApiError, ApiResult, AppState};
use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use tracing::debug;

/// Raw telemetry payload
#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

/// Two records to merge
#[derive(Debug, Deserialize)]
pub struct MergeRequest {
    pub high_trust: CanonicalRecord,
    pub low_trust: CanonicalRecord,
}

fn require_text(request: &TextRequest) -> ApiResult<()> {
    if request.text.trim().is_empty() {
        return Err(ApiError::BadRequest("text cannot be empty".to_string()));
    }
    Ok(())
}

/// POST /api/extract
///
/// Any text is accepted; empty input yields an empty extraction.
pub async fn extract(Json(request): Json<TextRequest>) -> Json<Extraction> {
    debug!("Extract request: {} bytes", request.text.len());
    Json(extractors::extract(&request.text))
}

/// POST /api/merge
pub async fn merge(Json(request): Json<MergeRequest>) -> Json<CanonicalRecord> {
    Json(fusion::merge(&request.high_trust, &request.low_trust))
}

/// POST /api/skr
///
/// Always 200: calculation failures are reported in the result's `error`.
pub async fn skr(
    State(state): State<AppState>,
    Json(record): Json<CanonicalRecord>,
) -> Json<SkrResult> {
    Json(state.pipeline.calculator().compute(&record))
}

/// POST /api/process
///
/// **Errors:**
/// - 400 Bad Request: Empty text
/// - 502 Bad Gateway: Enrichment failed and enrichment is required
pub async fn process(
    State(state): State<AppState>,
    Json(request): Json<TextRequest>,
) -> ApiResult<Json<ProcessedRecord>> {
    require_text(&request)?;
    let processed = state.pipeline.process(&request.text).await?;
    Ok(Json(processed))
}

/// Build record processing routes
pub fn record_routes() -> Router<AppState> {
    Router::new()
        .route("/api/extract", post(extract))
        .route("/api/merge", post(merge))
        .route("/api/skr", post(skr))
        .route("/api/process", post(process))
}
