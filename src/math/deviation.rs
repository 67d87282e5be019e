//! Deviation metrics between two curves sampled on the same grid.
//!
//! Both metrics come from one difference vector:
//!
//! ```text
//! sse     = Σ_i (a_i - b_i)^2
//! max_abs = max_i |a_i - b_i|
//! ```
//!
//! `sse` ranks candidates; `max_abs` is the tolerance later used as the
//! acceptance bound during classification.

use nalgebra::DVectorView;

/// SSE and worst-case deviation of one curve pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviationStats {
    pub sse: f64,
    pub max_abs: f64,
}

/// Sum of squared deviations between two columns of equal length.
pub fn sum_squared_deviation(a: DVectorView<'_, f64>, b: DVectorView<'_, f64>) -> f64 {
    (&a - &b).norm_squared()
}

/// Maximum absolute pointwise deviation (0 for empty columns).
pub fn max_abs_deviation(a: DVectorView<'_, f64>, b: DVectorView<'_, f64>) -> f64 {
    if a.is_empty() {
        return 0.0;
    }
    (&a - &b).amax()
}

/// Both metrics from a single difference vector.
pub fn deviation_stats(a: DVectorView<'_, f64>, b: DVectorView<'_, f64>) -> DeviationStats {
    let diff = &a - &b;
    let max_abs = if diff.is_empty() { 0.0 } else { diff.amax() };
    DeviationStats {
        sse: diff.norm_squared(),
        max_abs,
    }
}

/// Acceptance test used by the classifier.
///
/// A zero tolerance still accepts exact hits (`deviation == 0`).
pub fn within_bound(deviation: f64, tolerance: f64, factor: f64) -> bool {
    deviation <= factor * tolerance
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DVector;

    #[test]
    fn metrics_on_simple_columns() {
        let a = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        let b = DVector::from_vec(vec![1.0, 0.0, 4.0]);

        let sse = sum_squared_deviation(a.column(0), b.column(0));
        assert!((sse - 5.0).abs() < 1e-12);

        let max_abs = max_abs_deviation(a.column(0), b.column(0));
        assert!((max_abs - 2.0).abs() < 1e-12);

        let stats = deviation_stats(a.column(0), b.column(0));
        assert_eq!(stats, DeviationStats { sse, max_abs });
    }

    #[test]
    fn max_abs_uses_absolute_value() {
        let a = DVector::from_vec(vec![0.0, 0.0]);
        let b = DVector::from_vec(vec![0.5, -3.0]);
        assert_eq!(max_abs_deviation(a.column(0), b.column(0)), 3.0);
    }

    #[test]
    fn zero_tolerance_accepts_only_exact_hits() {
        assert!(within_bound(0.0, 0.0, std::f64::consts::SQRT_2));
        assert!(!within_bound(1e-12, 0.0, 10.0));
        assert!(within_bound(1.4, 1.0, std::f64::consts::SQRT_2));
    }
}
