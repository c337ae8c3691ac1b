// Field Pre-Extractor
//
// Concept: Pull well-formed `key: value` lines out of vendor telemetry before
// the text reaches the enrichment collaborator.
// Synchronization: Accepts raw text, outputs Extraction { partial, remaining }
//
// Algorithm:
// 1. Structured documents (JSON object/array, CSV) are passed through untouched
// 2. Each line is matched against `key: value`
// 3. Recognized keys set their canonical path with a coerced value and a
//    confidence 1.0 provenance entry; a repeated key keeps its last line
// 4. Everything else, superseded repeats included, is kept verbatim and in
//    order as remaining text

use crate::extractors::field_map::{lookup, normalize_key};
use crate::record::{CanonicalRecord, FieldValue, ProvenanceEntry};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// Optional leading whitespace, a key without colons, a colon, the rest of the line
static KEY_VALUE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([^:]+):(.*)$").expect("key/value pattern is valid"));

/// Output of a pre-extraction pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    /// High-trust partial record
    pub partial: CanonicalRecord,
    /// Lines not consumed by the extractor, in original order
    pub remaining: String,
}

/// One classified input line
#[derive(Debug, Clone, PartialEq)]
pub enum ScannedLine<'a> {
    /// Recognized key with its canonical path and coerced value
    Field {
        path: &'static str,
        value: FieldValue,
        snippet: &'a str,
    },
    /// Line left for the enrichment collaborator
    Unmatched(&'a str),
}

/// Classify each line of `raw`
///
/// Lazy and restartable: calling it again on the same text yields the same
/// sequence. Does not apply the structured-document guard.
pub fn scan(raw: &str) -> impl Iterator<Item = ScannedLine<'_>> + '_ {
    raw.lines().map(classify_line)
}

fn classify_line(line: &str) -> ScannedLine<'_> {
    let Some(caps) = KEY_VALUE_LINE.captures(line) else {
        return ScannedLine::Unmatched(line);
    };

    let key = normalize_key(&caps[1]);
    let value = caps[2].trim();

    match lookup(&key) {
        Some(path) if !value.is_empty() => ScannedLine::Field {
            path,
            value: FieldValue::coerce(value),
            snippet: line,
        },
        _ => ScannedLine::Unmatched(line),
    }
}

/// True for inputs that line-oriented scanning must not touch
///
/// JSON objects/arrays (trimmed text wrapped in `{}` or `[]`) and CSV (a comma
/// on the first line).
pub fn is_structured_document(raw: &str) -> bool {
    let trimmed = raw.trim();
    let json_object = trimmed.starts_with('{') && trimmed.ends_with('}');
    let json_array = trimmed.starts_with('[') && trimmed.ends_with(']');
    let csv = trimmed
        .lines()
        .next()
        .map(|first| first.contains(','))
        .unwrap_or(false);
    json_object || json_array || csv
}

/// Field pre-extractor
///
/// Pure and stateless; provenance entries always carry confidence 1.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreExtractor;

impl PreExtractor {
    /// Confidence attached to every pre-extracted field
    pub const CONFIDENCE: f64 = 1.0;

    /// Extract recognized fields from raw telemetry text
    ///
    /// A key repeated within the same text keeps its last value; the lines it
    /// supersedes go to `remaining` like any other unconsumed line.
    pub fn extract(&self, raw: &str) -> Extraction {
        if is_structured_document(raw) {
            debug!("Structured document detected, skipping pre-extraction");
            return Extraction {
                partial: CanonicalRecord::default(),
                remaining: raw.to_string(),
            };
        }

        let lines: Vec<ScannedLine<'_>> = scan(raw).collect();
        let last_occurrence: HashMap<&str, usize> = lines
            .iter()
            .enumerate()
            .filter_map(|(index, line)| match line {
                ScannedLine::Field { path, .. } => Some((*path, index)),
                ScannedLine::Unmatched(_) => None,
            })
            .collect();

        let mut partial = CanonicalRecord::default();
        let mut remaining: Vec<&str> = Vec::new();

        for (index, line) in lines.into_iter().enumerate() {
            match line {
                ScannedLine::Field {
                    path,
                    value,
                    snippet,
                } if last_occurrence.get(path) == Some(&index) => {
                    debug!("  {} = {:?}", path, value);
                    partial.set(path, value);
                    partial
                        .provenance
                        .push(ProvenanceEntry::new(path, snippet, Self::CONFIDENCE));
                }
                ScannedLine::Field { path, snippet, .. } => {
                    debug!("  {} repeated later, line kept as text", path);
                    remaining.push(snippet);
                }
                ScannedLine::Unmatched(text) => remaining.push(text),
            }
        }

        info!(
            "Pre-extraction complete: fields={}, remaining_lines={}",
            partial.provenance.len(),
            remaining.len()
        );

        Extraction {
            partial,
            remaining: remaining.join("\n"),
        }
    }
}

/// Extract with the default pre-extractor
pub fn extract(raw: &str) -> Extraction {
    PreExtractor.extract(raw)
}
