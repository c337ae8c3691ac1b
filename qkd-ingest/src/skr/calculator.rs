// Finite-Key SKR Calculator
//
// Concept: Derive the secure key rate of a link session from its canonical record
// Synchronization: Accepts &CanonicalRecord, outputs SkrResult (never fails)
//
// Algorithm:
// 1. Resolve inputs (S_bps, Q, N, ε_sec, ε_cor, β), substituting the combined
//    ε and the default β with a trace entry each
// 2. Refuse when any required input is still missing (all of them named)
// 3. Trace every resolved input in fixed order
// 4. Refuse inputs outside the formula's domain (S_bps ≥ 0, Q ≥ 0, N > 0, β > 0),
//    then Q above the BB84 threshold
// 5. h₂(Q) → Leak_EC → Δ → R_secure_bits → R_secure_bps (clamped at 0)

use super::entropy::binary_entropy;
use super::{SkrError, SkrInputs, SkrIntermediates, SkrResult, TraceEntry, EQUATION};
use crate::record::CanonicalRecord;
use qkd_common::config::SkrConfig;
use tracing::{debug, info, warn};

const SIFTED_KEY_RATE: &str = "security.sifted_key_rate_bps";
const QBER_TOTAL: &str = "security.qber_total";
const SIFTED_BITS: &str = "security.sifted_bits";
const EPSILON: &str = "security.epsilon";
const EPSILON_SEC: &str = "security.epsilon_sec";
const EPSILON_COR: &str = "security.epsilon_cor";
const EC_EFFICIENCY: &str = "dv_specific.ec_efficiency_beta";

/// Calculator parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkrParameters {
    /// β used when the record carries none (typical for Cascade/LDPC reconciliation)
    pub default_ec_efficiency: f64,
    /// Highest QBER accepted; the check is strict (`Q > threshold` fails)
    pub qber_threshold: f64,
}

impl Default for SkrParameters {
    fn default() -> Self {
        Self {
            default_ec_efficiency: 1.1,
            qber_threshold: 0.11,
        }
    }
}

impl From<&SkrConfig> for SkrParameters {
    fn from(config: &SkrConfig) -> Self {
        Self {
            default_ec_efficiency: config.default_ec_efficiency,
            qber_threshold: config.qber_threshold,
        }
    }
}

/// Finite-key secure key rate calculator
///
/// Pure: no I/O, no shared state, identical input gives bit-identical output.
#[derive(Debug, Clone, Default)]
pub struct SkrCalculator {
    params: SkrParameters,
}

impl SkrCalculator {
    pub fn new(params: SkrParameters) -> Self {
        Self { params }
    }

    pub fn parameters(&self) -> SkrParameters {
        self.params
    }

    /// Compute the secure key rate of a canonical record
    pub fn compute(&self, record: &CanonicalRecord) -> SkrResult {
        let mut trace = Vec::new();

        let s_bps = record.get_f64(SIFTED_KEY_RATE);
        let q = record.get_f64(QBER_TOTAL);
        let n = record.get_f64(SIFTED_BITS);

        let mut eps_sec = record.get_f64(EPSILON_SEC);
        let mut eps_cor = record.get_f64(EPSILON_COR);
        if eps_sec.is_none() && eps_cor.is_none() {
            if let Some(eps) = record.get_f64(EPSILON) {
                debug!("Using combined ε = {} for ε_sec and ε_cor", eps);
                eps_sec = Some(eps);
                eps_cor = Some(eps);
                trace.push(TraceEntry::number(
                    "Default: ε_sec = ε_cor = ε",
                    eps,
                    format!("{} and {} absent, both taken from {}", EPSILON_SEC, EPSILON_COR, EPSILON),
                ));
            }
        }

        let beta = match record.get_f64(EC_EFFICIENCY) {
            Some(beta) => beta,
            None => {
                let beta = self.params.default_ec_efficiency;
                trace.push(TraceEntry::number(
                    "Default: β",
                    beta,
                    format!("{} absent, typical reconciliation efficiency assumed", EC_EFFICIENCY),
                ));
                beta
            }
        };

        let (s_bps, q, n, eps_sec, eps_cor) = match (s_bps, q, n, eps_sec, eps_cor) {
            (Some(s), Some(q), Some(n), Some(es), Some(ec)) => (s, q, n, es, ec),
            _ => {
                let missing: Vec<String> = [
                    ("S_bps", s_bps),
                    ("Q", q),
                    ("N", n),
                    ("eps_sec", eps_sec),
                    ("eps_cor", eps_cor),
                ]
                .into_iter()
                .filter(|(_, value)| value.is_none())
                .map(|(name, _)| name.to_string())
                .collect();
                return failure(SkrError::MissingFields(missing), None, trace);
            }
        };

        let inputs = SkrInputs {
            s_bps,
            q,
            beta,
            n,
            eps_sec,
            eps_cor,
        };

        trace.push(TraceEntry::number("Input: S_bps", s_bps, SIFTED_KEY_RATE));
        trace.push(TraceEntry::number("Input: Q", q, QBER_TOTAL));
        trace.push(TraceEntry::number(
            "Input or Default: β",
            beta,
            format!("{} or default", EC_EFFICIENCY),
        ));
        trace.push(TraceEntry::number("Input: N", n, SIFTED_BITS));
        trace.push(TraceEntry::number(
            "Input or Default: ε_sec",
            eps_sec,
            format!("{} or {}", EPSILON_SEC, EPSILON),
        ));
        trace.push(TraceEntry::number(
            "Input or Default: ε_cor",
            eps_cor,
            format!("{} or {}", EPSILON_COR, EPSILON),
        ));

        if let Err(err) = check_domain(&inputs) {
            return failure(err, Some(inputs), trace);
        }

        if q > self.params.qber_threshold {
            return failure(
                SkrError::SecurityThresholdExceeded {
                    qber: q,
                    threshold: self.params.qber_threshold,
                },
                Some(inputs),
                trace,
            );
        }

        let h2_q = binary_entropy(q);
        trace.push(TraceEntry::number(
            "h₂(Q)",
            h2_q,
            "−Q·log₂(Q) − (1 − Q)·log₂(1 − Q)",
        ));

        let leakage_ec_bits = n * h2_q * beta;
        trace.push(TraceEntry::number("Leak_EC", leakage_ec_bits, "N · h₂(Q) · β"));

        let finite_penalty_bits = match finite_size_penalty(n, q, eps_sec, eps_cor) {
            Ok(delta) => delta,
            Err(err) => return failure(err, Some(inputs), trace),
        };
        trace.push(TraceEntry::number(
            "Δ (finite-size penalty)",
            finite_penalty_bits,
            "2·log₂(1/ε_cor) + 4·log₂(1/(2·ε_sec))·√(N·Q·(1 − Q))",
        ));

        let r_secure_bits = n * (1.0 - h2_q) - leakage_ec_bits - finite_penalty_bits;
        if !r_secure_bits.is_finite() {
            return failure(
                SkrError::Computation(format!("R_secure_bits is not finite ({})", r_secure_bits)),
                Some(inputs),
                trace,
            );
        }
        trace.push(TraceEntry::number(
            "R_secure_bits",
            r_secure_bits,
            "N·(1 − h₂(Q)) − Leak_EC − Δ",
        ));

        let raw_rate = r_secure_bits / n * s_bps;
        if !raw_rate.is_finite() {
            return failure(
                SkrError::Computation(format!(
                    "R_secure_bits / N · S_bps is not finite (N = {})",
                    n
                )),
                Some(inputs),
                trace,
            );
        }
        let r_secure_bps = if raw_rate > 0.0 { raw_rate } else { 0.0 };
        let formula = if raw_rate < 0.0 {
            format!("max(0, R_secure_bits / N · S_bps), negative rate {} clamped to 0", raw_rate)
        } else {
            "max(0, R_secure_bits / N · S_bps)".to_string()
        };
        trace.push(TraceEntry::number("R_secure_bps", r_secure_bps, formula));

        info!(
            "Secure key rate computed: Q={}, N={}, R_secure_bps={:.3}",
            q, n, r_secure_bps
        );

        SkrResult {
            equation: EQUATION.to_string(),
            inputs: Some(inputs),
            intermediates: Some(SkrIntermediates {
                h2_q,
                leakage_ec_bits,
                finite_penalty_bits,
            }),
            r_secure_bps: Some(r_secure_bps),
            error: None,
            trace,
        }
    }
}

/// S_bps ≥ 0, Q ≥ 0, N > 0, β > 0
fn check_domain(inputs: &SkrInputs) -> Result<(), SkrError> {
    let checks = [
        ("S_bps", inputs.s_bps, inputs.s_bps >= 0.0, "must be ≥ 0"),
        ("Q", inputs.q, inputs.q >= 0.0, "must be ≥ 0"),
        ("N", inputs.n, inputs.n > 0.0, "must be > 0"),
        ("β", inputs.beta, inputs.beta > 0.0, "must be > 0"),
    ];
    match checks.into_iter().find(|(_, _, ok, _)| !ok) {
        Some((name, value, _, rule)) => Err(SkrError::Computation(format!(
            "{} {}, got {}",
            name, rule, value
        ))),
        None => Ok(()),
    }
}

/// Δ = 2·log₂(1/ε_cor) + 4·log₂(1/(2·ε_sec))·√(N·Q·(1−Q))
///
/// Both ε must be finite and in (0, 1).
fn finite_size_penalty(n: f64, q: f64, eps_sec: f64, eps_cor: f64) -> Result<f64, SkrError> {
    for (name, eps) in [("ε_sec", eps_sec), ("ε_cor", eps_cor)] {
        if !(eps > 0.0 && eps < 1.0) {
            return Err(SkrError::Computation(format!(
                "{} must lie in (0, 1), got {}",
                name, eps
            )));
        }
    }

    let variance = n * q * (1.0 - q);

    let delta = 2.0 * (1.0 / eps_cor).log2() + 4.0 * (1.0 / (2.0 * eps_sec)).log2() * variance.sqrt();
    if !delta.is_finite() {
        return Err(SkrError::Computation(format!("Δ is not finite ({})", delta)));
    }
    Ok(delta)
}

fn failure(error: SkrError, inputs: Option<SkrInputs>, trace: Vec<TraceEntry>) -> SkrResult {
    warn!("Secure key rate not computed: {}", error);
    SkrResult {
        equation: EQUATION.to_string(),
        inputs,
        intermediates: None,
        r_secure_bps: None,
        error: Some(error),
        trace,
    }
}

/// Compute with default parameters (β = 1.1, QBER threshold 0.11)
pub fn compute_skr(record: &CanonicalRecord) -> SkrResult {
    SkrCalculator::default().compute(record)
}
