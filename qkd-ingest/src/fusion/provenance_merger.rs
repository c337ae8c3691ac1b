// Provenance Merger
//
// Concept: Combine the pre-extractor's high-trust record with the enrichment
// collaborator's low-trust record
// Synchronization: Accepts (high_trust, low_trust) CanonicalRecords, outputs
// one CanonicalRecord
//
// Algorithm:
// 1. Values: start from every low-trust leaf, overwrite with every non-null
//    high-trust leaf (high trust wins on conflict)
// 2. Provenance: high-trust entries in original order, then low-trust entries
//    whose field path is not already covered, in original order

use crate::record::{CanonicalRecord, RecordSection};
use std::collections::HashSet;
use tracing::{debug, info};

/// Provenance merger (fusion concept)
///
/// Pure: no side effects, never fails. A field path appears at most once in
/// the merged provenance list, and high-trust entries are never dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProvenanceMerger;

impl ProvenanceMerger {
    /// Merge a high-trust and a low-trust record
    pub fn merge(&self, high_trust: &CanonicalRecord, low_trust: &CanonicalRecord) -> CanonicalRecord {
        let mut merged = combine_values(high_trust, low_trust);

        let mut covered: HashSet<&str> = high_trust
            .provenance
            .iter()
            .map(|entry| entry.field.as_str())
            .collect();

        let mut provenance = high_trust.provenance.clone();
        let mut discarded = 0usize;

        for entry in &low_trust.provenance {
            if covered.insert(entry.field.as_str()) {
                provenance.push(entry.clone());
            } else {
                debug!("Discarding low-trust provenance for {}", entry.field);
                discarded += 1;
            }
        }

        info!(
            "Provenance merged: high_trust={}, low_trust_kept={}, discarded={}",
            high_trust.provenance.len(),
            provenance.len() - high_trust.provenance.len(),
            discarded
        );

        merged.provenance = provenance;
        merged
    }
}

/// Merge with the default merger
pub fn merge(high_trust: &CanonicalRecord, low_trust: &CanonicalRecord) -> CanonicalRecord {
    ProvenanceMerger.merge(high_trust, low_trust)
}

/// Leaf-wise value combination where high trust wins
///
/// Null high-trust leaves do not erase low-trust values. The result carries no
/// provenance; `merge` reconciles it.
pub fn combine_values(high_trust: &CanonicalRecord, low_trust: &CanonicalRecord) -> CanonicalRecord {
    let mut combined = CanonicalRecord {
        notes: high_trust.notes.clone().or_else(|| low_trust.notes.clone()),
        ..Default::default()
    };

    for section in RecordSection::ALL {
        let target = combined.section_mut(section);
        target.extend(
            low_trust
                .section(section)
                .iter()
                .map(|(leaf, value)| (leaf.clone(), value.clone())),
        );
        for (leaf, value) in high_trust.section(section) {
            if !value.is_null() {
                target.insert(leaf.clone(), value.clone());
            }
        }
    }

    combined
}
