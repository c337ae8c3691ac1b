//! qkd-ingest library interface
//!
//! Turns free-form QKD link telemetry into a canonical record and derives its
//! finite-key secure key rate.

pub mod api;
pub mod enrichment;
pub mod error;
pub mod extractors;
pub mod fusion;
pub mod record;
pub mod skr;
pub mod workflow;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use workflow::RecordPipeline;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Configured record pipeline
    pub pipeline: Arc<RecordPipeline>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(pipeline: RecordPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::record_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
