//! Enrichment collaborator boundary
//!
//! The collaborator receives the pre-extractor's output (`{partial, remaining}`)
//! and returns a low-trust `CanonicalRecord` with its own provenance list. Its
//! field extraction logic is opaque to this crate; only the message exchange
//! lives here.

pub mod http_client;

pub use http_client::HttpEnricher;

use crate::extractors::Extraction;
use crate::record::CanonicalRecord;
use async_trait::async_trait;
use qkd_common::config::EnrichmentConfig;
use qkd_common::{Error, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Enrichment collaborator
#[async_trait]
pub trait Enricher: Send + Sync {
    /// Collaborator identifier for logs (e.g. "http", "file", "none")
    fn source_id(&self) -> &'static str;

    /// Send the pre-extraction output, receive the low-trust record
    async fn enrich(&self, request: &Extraction) -> Result<CanonicalRecord>;
}

/// Offline mode: the low-trust record is always empty
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEnrichment;

#[async_trait]
impl Enricher for NoEnrichment {
    fn source_id(&self) -> &'static str {
        "none"
    }

    async fn enrich(&self, _request: &Extraction) -> Result<CanonicalRecord> {
        Ok(CanonicalRecord::default())
    }
}

/// Replays a captured collaborator response from disk
#[derive(Debug, Clone)]
pub struct FileEnrichment {
    path: PathBuf,
}

impl FileEnrichment {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Enricher for FileEnrichment {
    fn source_id(&self) -> &'static str {
        "file"
    }

    async fn enrich(&self, _request: &Extraction) -> Result<CanonicalRecord> {
        debug!("Loading enrichment record from {}", self.path.display());
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            Error::Enrichment(format!("Read {} failed: {}", self.path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            Error::Enrichment(format!(
                "{} is not a canonical record: {}",
                self.path.display(),
                e
            ))
        })
    }
}

/// Build the enricher described by configuration
///
/// HTTP when an endpoint is configured, offline otherwise.
pub fn from_config(config: &EnrichmentConfig) -> Result<Arc<dyn Enricher>> {
    match &config.endpoint {
        Some(endpoint) => {
            info!("Enrichment collaborator: {}", endpoint);
            Ok(Arc::new(HttpEnricher::from_config(endpoint, config)?))
        }
        None => {
            info!("No enrichment endpoint configured, running offline");
            Ok(Arc::new(NoEnrichment))
        }
    }
}
