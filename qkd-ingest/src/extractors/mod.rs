// Structured field extraction
//
// The pre-extractor is the high-trust source: it only accepts lines whose key
// is in the canonical table, so every value it emits is attributed with
// confidence 1.0. Free-text understanding is left to the enrichment
// collaborator.

pub mod field_map;
pub mod pre_extractor;

pub use pre_extractor::{extract, is_structured_document, Extraction, PreExtractor, ScannedLine};
