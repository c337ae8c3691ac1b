//! # Finite-Key Secure Key Rate
//!
//! Derives the secure key rate (bits/second) of a QKD link session from its
//! canonical record, using finite-key correction terms:
//!
//! ```text
//! Leak_EC       = N · h₂(Q) · β
//! Δ             = 2·log₂(1/ε_cor) + 4·log₂(1/(2·ε_sec))·√(N·Q·(1−Q))
//! R_secure_bits = N·(1 − h₂(Q)) − Leak_EC − Δ
//! R_secure_bps  = max(0, R_secure_bits / N · S_bps)
//! ```
//!
//! The calculation is total: every failure is reported inside `SkrResult`
//! together with the trace recorded up to the failure point.

pub mod calculator;
pub mod entropy;

pub use calculator::{compute_skr, SkrCalculator, SkrParameters};
pub use entropy::binary_entropy;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Human-readable form of the secure key rate equation
pub const EQUATION: &str = "R_secure_bps = max(0, (N·(1 − h₂(Q)) − N·h₂(Q)·β − Δ) / N · S_bps), \
     Δ = 2·log₂(1/ε_cor) + 4·log₂(1/(2·ε_sec))·√(N·Q·(1 − Q))";

// ============================================================================
// Inputs and Intermediates
// ============================================================================

/// Resolved calculator inputs
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SkrInputs {
    /// Sifted key rate, bits/second
    #[serde(rename = "S_bps")]
    pub s_bps: f64,
    /// Total QBER
    #[serde(rename = "Q")]
    pub q: f64,
    /// Error-correction efficiency
    pub beta: f64,
    /// Sifted block size, bits
    #[serde(rename = "N")]
    pub n: f64,
    pub eps_sec: f64,
    pub eps_cor: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SkrIntermediates {
    #[serde(rename = "h2_Q")]
    pub h2_q: f64,
    pub leakage_ec_bits: f64,
    pub finite_penalty_bits: f64,
}

// ============================================================================
// Trace
// ============================================================================

/// One computation stage
///
/// Every stage records a number; `formula` says where it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceEntry {
    pub step: String,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
}

impl TraceEntry {
    pub fn number(step: impl Into<String>, value: f64, formula: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            value,
            formula: Some(formula.into()),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Why a secure key rate could not be produced
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkrError {
    /// Required inputs absent after default substitution (all of them listed)
    #[error("Missing required inputs: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    /// QBER above the protocol's error threshold
    #[error("Security limit exceeded: QBER {qber} exceeds the BB84 threshold {threshold}")]
    SecurityThresholdExceeded { qber: f64, threshold: f64 },

    /// Arithmetic domain failure
    #[error("Computation error: {0}")]
    Computation(String),
}

// ============================================================================
// Result
// ============================================================================

/// Outcome of one calculation
///
/// On failure `r_secure_bps` is `None` and `error` is set; `trace` always holds
/// every entry recorded before the failure point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkrResult {
    pub equation: String,
    #[serde(serialize_with = "some_or_empty_map")]
    pub inputs: Option<SkrInputs>,
    #[serde(serialize_with = "some_or_empty_map")]
    pub intermediates: Option<SkrIntermediates>,
    #[serde(rename = "R_secure_bps")]
    pub r_secure_bps: Option<f64>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "error_message"
    )]
    pub error: Option<SkrError>,
    pub trace: Vec<TraceEntry>,
}

impl SkrResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.r_secure_bps.is_some()
    }
}

fn some_or_empty_map<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Serialize,
    S: Serializer,
{
    match value {
        Some(inner) => inner.serialize(serializer),
        None => serializer.serialize_map(Some(0))?.end(),
    }
}

fn error_message<S>(error: &Option<SkrError>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match error {
        Some(err) => serializer.serialize_str(&err.to_string()),
        None => serializer.serialize_none(),
    }
}
