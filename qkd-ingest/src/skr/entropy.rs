//! Binary entropy

/// Shannon entropy of a Bernoulli(q) variable, in bits
///
/// Defined as 0 outside the open interval (0, 1) so boundary and out-of-range
/// inputs never produce NaN.
pub fn binary_entropy(q: f64) -> f64 {
    if q <= 0.0 || q >= 1.0 {
        return 0.0;
    }
    -q * q.log2() - (1.0 - q) * (1.0 - q).log2()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_are_zero() {
        assert_eq!(binary_entropy(0.0), 0.0);
        assert_eq!(binary_entropy(1.0), 0.0);
        assert_eq!(binary_entropy(-0.3), 0.0);
        assert_eq!(binary_entropy(1.5), 0.0);
    }

    #[test]
    fn test_maximum_at_half() {
        assert!((binary_entropy(0.5) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_symmetry() {
        for q in [0.01, 0.026, 0.11, 0.3] {
            assert!((binary_entropy(q) - binary_entropy(1.0 - q)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_known_values() {
        assert!((binary_entropy(0.11) - 0.4999).abs() < 1e-3);
        assert!((binary_entropy(0.026) - 0.1739).abs() < 1e-3);
    }
}
