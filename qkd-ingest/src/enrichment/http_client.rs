// Enrichment HTTP Client
//
// Concept: POST the pre-extraction output to the enrichment collaborator and
// read back a low-trust canonical record
//
// Request:  {"partial": CanonicalRecord, "remaining": "..."}
// Response: CanonicalRecord (same JSON shape, own `_provenance`)

use super::Enricher;
use crate::extractors::Extraction;
use crate::record::CanonicalRecord;
use async_trait::async_trait;
use qkd_common::config::EnrichmentConfig;
use qkd_common::{Error, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

/// Enrichment collaborator reached over HTTP
pub struct HttpEnricher {
    /// HTTP client with configured timeouts
    client: Client,
    /// Collaborator URL
    endpoint: String,
}

impl HttpEnricher {
    /// Create a client for `endpoint`
    ///
    /// # Errors
    /// `Error::Enrichment` if the HTTP client cannot be built
    pub fn new(endpoint: impl Into<String>, timeout: Duration, connect_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| Error::Enrichment(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(endpoint: &str, config: &EnrichmentConfig) -> Result<Self> {
        Self::new(
            endpoint,
            Duration::from_secs(config.timeout_secs),
            Duration::from_secs(config.connect_timeout_secs),
        )
    }
}

#[async_trait]
impl Enricher for HttpEnricher {
    fn source_id(&self) -> &'static str {
        "http"
    }

    async fn enrich(&self, request: &Extraction) -> Result<CanonicalRecord> {
        debug!(
            "Requesting enrichment: endpoint={}, partial_fields={}, remaining_bytes={}",
            self.endpoint,
            request.partial.provenance.len(),
            request.remaining.len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Enrichment(format!("Request to {} failed: {}", self.endpoint, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Enrichment(format!(
                "Collaborator returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let record: CanonicalRecord = response
            .json()
            .await
            .map_err(|e| Error::Enrichment(format!("Malformed enrichment response: {}", e)))?;

        info!(
            "Enrichment received: fields={}, provenance={}",
            record.leaf_paths().len(),
            record.provenance.len()
        );

        Ok(record)
    }
}
