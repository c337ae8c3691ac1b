// Canonical key → field path table
//
// One normalized telemetry key per canonical field path. Keys are the leaf
// name of the path, so `QBER Total: 0.02` and `qber_total: 0.02` land on the
// same field after normalization.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Normalized key → dotted field path
pub const FIELD_MAP: &[(&str, &str)] = &[
    // meta
    ("vendor", "meta.vendor"),
    ("device_id", "meta.device_id"),
    ("session_id", "meta.session_id"),
    ("timestamp", "meta.timestamp"),
    ("firmware_version", "meta.firmware_version"),
    ("protocol", "meta.protocol"),
    // link
    ("link_id", "link.link_id"),
    ("node_a", "link.node_a"),
    ("node_b", "link.node_b"),
    ("distance_km", "link.distance_km"),
    ("fiber_type", "link.fiber_type"),
    ("channel_loss_db", "link.channel_loss_db"),
    ("wavelength_nm", "link.wavelength_nm"),
    // security
    ("qber_total", "security.qber_total"),
    ("sifted_key_rate_bps", "security.sifted_key_rate_bps"),
    ("sifted_bits", "security.sifted_bits"),
    ("epsilon", "security.epsilon"),
    ("epsilon_sec", "security.epsilon_sec"),
    ("epsilon_cor", "security.epsilon_cor"),
    ("secure_key_rate_bps", "security.secure_key_rate_bps"),
    ("pa_compression_ratio", "security.pa_compression_ratio"),
    // detector
    ("detector_type", "detector.detector_type"),
    ("detection_efficiency", "detector.detection_efficiency"),
    ("dark_count_rate_hz", "detector.dark_count_rate_hz"),
    ("dead_time_ns", "detector.dead_time_ns"),
    ("afterpulse_probability", "detector.afterpulse_probability"),
    ("detector_temperature_k", "detector.detector_temperature_k"),
    // dwdm
    ("dwdm_channel", "dwdm.dwdm_channel"),
    ("grid_spacing_ghz", "dwdm.grid_spacing_ghz"),
    ("classical_launch_power_dbm", "dwdm.classical_launch_power_dbm"),
    ("raman_noise_counts", "dwdm.raman_noise_counts"),
    ("isolation_db", "dwdm.isolation_db"),
    // optics
    ("source_type", "optics.source_type"),
    ("clock_rate_hz", "optics.clock_rate_hz"),
    ("mean_photon_number", "optics.mean_photon_number"),
    ("pulse_width_ps", "optics.pulse_width_ps"),
    ("insertion_loss_db", "optics.insertion_loss_db"),
    // dv_specific
    ("ec_efficiency_beta", "dv_specific.ec_efficiency_beta"),
    ("ec_protocol", "dv_specific.ec_protocol"),
    ("basis_sift_ratio", "dv_specific.basis_sift_ratio"),
    ("decoy_protocol", "dv_specific.decoy_protocol"),
];

static FIELD_INDEX: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| FIELD_MAP.iter().copied().collect());

/// Lowercase a raw key and join its whitespace-separated words with `_`
///
/// `"  QBER Total "` → `"qber_total"`
pub fn normalize_key(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Field path for a normalized key
pub fn lookup(normalized_key: &str) -> Option<&'static str> {
    FIELD_INDEX.get(normalized_key).copied()
}
