// Record fusion
//
// Reconciles the pre-extractor's partial record (high trust) with the
// enrichment collaborator's record (low trust).

pub mod provenance_merger;

pub use provenance_merger::{combine_values, merge, ProvenanceMerger};
