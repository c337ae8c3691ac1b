// Canonical Record: Shared Data Contract
//
// Every stage of the ingest pipeline speaks this type. The pre-extractor
// produces a partial record, the enrichment collaborator returns one in the
// same JSON shape, the provenance merger combines two of them, and the SKR
// calculator reads one.
//
// JSON shape (stable contract):
//   { meta, link, security, detector, dwdm, optics, dv_specific,
//     _provenance: [{field, snippet, confidence_score}], notes }

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Leaf Values
// ============================================================================

/// Leaf value of a canonical record section
///
/// Every leaf is nullable. Lists are tolerated for collaborator output that
/// carries multi-valued fields (e.g. decoy intensities).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<FieldValue>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Numeric view of the value
    ///
    /// Numbers are returned as-is when finite; text is accepted when it parses
    /// as a number under the same rule the pre-extractor uses.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) if n.is_finite() => Some(*n),
            FieldValue::Text(s) => parse_numeric(s),
            _ => None,
        }
    }

    /// Coerce a raw telemetry value: numeric when it parses, trimmed text otherwise
    pub fn coerce(raw: &str) -> Self {
        let trimmed = raw.trim();
        match parse_numeric(trimmed) {
            Some(n) => FieldValue::Number(n),
            None => FieldValue::Text(trimmed.to_string()),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

/// Parse a numeral, allowing `_` digit grouping (`1_050_000`)
///
/// Non-finite results (`inf`, `NaN`) are rejected so that every stored number
/// survives a JSON round trip.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != '_').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

// ============================================================================
// Sections
// ============================================================================

/// Leaf name → value
///
/// Ordered so that serialization is deterministic.
pub type Section = BTreeMap<String, FieldValue>;

/// Top-level sections of the canonical record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordSection {
    Meta,
    Link,
    Security,
    Detector,
    Dwdm,
    Optics,
    DvSpecific,
}

impl RecordSection {
    /// All sections in JSON order
    pub const ALL: [RecordSection; 7] = [
        RecordSection::Meta,
        RecordSection::Link,
        RecordSection::Security,
        RecordSection::Detector,
        RecordSection::Dwdm,
        RecordSection::Optics,
        RecordSection::DvSpecific,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Meta => "meta",
            Self::Link => "link",
            Self::Security => "security",
            Self::Detector => "detector",
            Self::Dwdm => "dwdm",
            Self::Optics => "optics",
            Self::DvSpecific => "dv_specific",
        }
    }
}

impl fmt::Display for RecordSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordSection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordSection::ALL
            .into_iter()
            .find(|section| section.as_str() == s)
            .ok_or_else(|| format!("unknown record section '{}'", s))
    }
}

/// Split a dotted field path (`security.qber_total`) into section and leaf
pub fn split_path(path: &str) -> Option<(RecordSection, &str)> {
    let (section, leaf) = path.split_once('.')?;
    if leaf.is_empty() {
        return None;
    }
    let section = section.parse().ok()?;
    Some((section, leaf))
}

// ============================================================================
// Provenance
// ============================================================================

/// Where a field value came from
///
/// Created once per extracted field and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceEntry {
    /// Dotted field path
    pub field: String,
    /// Source text the value was taken from
    pub snippet: String,
    /// [0.0, 1.0], clamped on construction and on deserialization
    #[serde(deserialize_with = "clamped_confidence")]
    pub confidence_score: f64,
}

fn clamped_confidence<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(f64::deserialize(deserializer)?.clamp(0.0, 1.0))
}

impl ProvenanceEntry {
    pub fn new(field: impl Into<String>, snippet: impl Into<String>, confidence: f64) -> Self {
        Self {
            field: field.into(),
            snippet: snippet.into(),
            confidence_score: confidence.clamp(0.0, 1.0),
        }
    }
}

// ============================================================================
// Canonical Record
// ============================================================================

/// Standardized QKD link session record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    #[serde(default, deserialize_with = "nullable")]
    pub meta: Section,
    #[serde(default, deserialize_with = "nullable")]
    pub link: Section,
    #[serde(default, deserialize_with = "nullable")]
    pub security: Section,
    #[serde(default, deserialize_with = "nullable")]
    pub detector: Section,
    #[serde(default, deserialize_with = "nullable")]
    pub dwdm: Section,
    #[serde(default, deserialize_with = "nullable")]
    pub optics: Section,
    #[serde(default, deserialize_with = "nullable")]
    pub dv_specific: Section,
    #[serde(rename = "_provenance", default, deserialize_with = "nullable")]
    pub provenance: Vec<ProvenanceEntry>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Treat an explicit JSON `null` like an absent key
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl CanonicalRecord {
    pub fn section(&self, section: RecordSection) -> &Section {
        match section {
            RecordSection::Meta => &self.meta,
            RecordSection::Link => &self.link,
            RecordSection::Security => &self.security,
            RecordSection::Detector => &self.detector,
            RecordSection::Dwdm => &self.dwdm,
            RecordSection::Optics => &self.optics,
            RecordSection::DvSpecific => &self.dv_specific,
        }
    }

    pub fn section_mut(&mut self, section: RecordSection) -> &mut Section {
        match section {
            RecordSection::Meta => &mut self.meta,
            RecordSection::Link => &mut self.link,
            RecordSection::Security => &mut self.security,
            RecordSection::Detector => &mut self.detector,
            RecordSection::Dwdm => &mut self.dwdm,
            RecordSection::Optics => &mut self.optics,
            RecordSection::DvSpecific => &mut self.dv_specific,
        }
    }

    /// Non-null value at a dotted path
    pub fn get(&self, path: &str) -> Option<&FieldValue> {
        let (section, leaf) = split_path(path)?;
        self.section(section).get(leaf).filter(|v| !v.is_null())
    }

    /// Numeric value at a dotted path (see `FieldValue::as_f64`)
    pub fn get_f64(&self, path: &str) -> Option<f64> {
        self.get(path).and_then(FieldValue::as_f64)
    }

    /// Set the value at a dotted path
    ///
    /// Returns false (and leaves the record untouched) when the path does not
    /// name a known section.
    pub fn set(&mut self, path: &str, value: FieldValue) -> bool {
        match split_path(path) {
            Some((section, leaf)) => {
                self.section_mut(section).insert(leaf.to_string(), value);
                true
            }
            None => false,
        }
    }

    /// Dotted paths of all non-null leaves, in section then leaf order
    pub fn leaf_paths(&self) -> Vec<String> {
        RecordSection::ALL
            .into_iter()
            .flat_map(|section| {
                self.section(section)
                    .iter()
                    .filter(|(_, v)| !v.is_null())
                    .map(move |(leaf, _)| format!("{}.{}", section, leaf))
            })
            .collect()
    }

    /// True when the record carries no values, provenance, or notes
    pub fn is_empty(&self) -> bool {
        RecordSection::ALL
            .into_iter()
            .all(|section| self.section(section).is_empty())
            && self.provenance.is_empty()
            && self.notes.is_none()
    }
}
