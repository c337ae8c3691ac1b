//! Test Helper Utilities
//!
//! Shared fixtures for testing qkd-ingest

#![allow(dead_code)]

use qkd_ingest::record::{CanonicalRecord, FieldValue, ProvenanceEntry};
use std::io::Write;
use tempfile::NamedTempFile;

/// Telemetry that carries every input the SKR calculator needs
pub const TELEMETRY: &str = "\
Vendor: Toshiba
Device ID: QKD-TX-07
QBER Total: 0.026
Sifted Bits: 1_500_000
Sifted Key Rate bps: 180000
Epsilon: 1e-9
operator note: link re-aligned at 09:14
Fiber loss was roughly 9 dB on the long span";

/// Telemetry without any recognized key
pub const FREE_TEXT: &str = "\
session started after maintenance window
no counters were exported";

/// Low-trust record as the enrichment collaborator would return it
///
/// Conflicts with `TELEMETRY` on `security.qber_total`.
pub fn enrichment_record() -> CanonicalRecord {
    let mut record = CanonicalRecord::default();
    record.set("security.qber_total", FieldValue::Number(0.031));
    record.set("link.channel_loss_db", FieldValue::Number(9.0));
    record.set("link.distance_km", FieldValue::Number(42.5));
    record.provenance = vec![
        ProvenanceEntry::new("security.qber_total", "QBER around 3.1%", 0.6),
        ProvenanceEntry::new("link.channel_loss_db", "Fiber loss was roughly 9 dB", 0.7),
        ProvenanceEntry::new("link.distance_km", "long span", 0.4),
    ];
    record.notes = Some("loss estimated from operator notes".to_string());
    record
}

/// Write `record` as JSON to a temporary file
pub fn write_record(record: &CanonicalRecord) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    serde_json::to_writer(&mut file, record).expect("Failed to write record");
    file.flush().expect("Failed to flush record");
    file
}

/// Provenance field paths in list order
pub fn provenance_fields(record: &CanonicalRecord) -> Vec<&str> {
    record.provenance.iter().map(|e| e.field.as_str()).collect()
}
