//! Common error types for QKD telemetry ingest

use thiserror::Error;

/// Common result type for ingest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the ingest workspace
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Enrichment collaborator unreachable or returned an unusable response
    #[error("Enrichment error: {0}")]
    Enrichment(String),
}
