//! Welch's unequal-variance two-sample t-test.
//!
//! The test never pools variances. Degrees of freedom come from the
//! Welch–Satterthwaite approximation:
//!
//! ```text
//! s_a = var(a) / n_a,   s_b = var(b) / n_b
//! t   = (mean(a) - mean(b)) / sqrt(s_a + s_b)
//! df  = (s_a + s_b)^2 / (s_a^2 / (n_a - 1) + s_b^2 / (n_b - 1))
//! ```
//!
//! and the two-tailed p-value is `2 * P(T_df > |t|)`.

use crate::model::HypothesisError;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};
use statrs::statistics::Statistics;

/// Smallest sample size for which a variance is defined.
pub const MIN_SAMPLE_SIZE: usize = 2;

/// A sample together with the label used in error messages.
#[derive(Debug, Clone, Copy)]
pub struct LabeledSample<'a> {
    pub label: &'a str,
    pub values: &'a [f64],
}

impl<'a> LabeledSample<'a> {
    pub fn new(label: &'a str, values: &'a [f64]) -> Self {
        Self { label, values }
    }

    fn ensure_sized(&self) -> Result<(), HypothesisError> {
        if self.values.len() < MIN_SAMPLE_SIZE {
            return Err(HypothesisError::InsufficientSample {
                label: self.label.to_string(),
                n: self.values.len(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WelchOutcome {
    pub t_statistic: f64,
    pub degrees_of_freedom: f64,
    /// Two-tailed.
    pub p_value: f64,
}

/// Run Welch's t-test of `a` against `b`.
///
/// Errors with `InsufficientSample` when either side has fewer than two
/// observations and `ZeroVariance` when both sides are constant.
pub fn welch_t_test(a: LabeledSample<'_>, b: LabeledSample<'_>) -> Result<WelchOutcome, HypothesisError> {
    a.ensure_sized()?;
    b.ensure_sized()?;

    let n_a = a.values.len() as f64;
    let n_b = b.values.len() as f64;
    let s_a = a.values.variance() / n_a;
    let s_b = b.values.variance() / n_b;
    let se_sq = s_a + s_b;

    if se_sq <= 0.0 {
        return Err(HypothesisError::ZeroVariance);
    }

    let t_statistic = (a.values.mean() - b.values.mean()) / se_sq.sqrt();
    let degrees_of_freedom =
        se_sq * se_sq / (s_a * s_a / (n_a - 1.0) + s_b * s_b / (n_b - 1.0));

    let dist = StudentsT::new(0.0, 1.0, degrees_of_freedom)
        .map_err(|e| HypothesisError::Distribution(e.to_string()))?;
    let p_value = (2.0 * dist.sf(t_statistic.abs())).min(1.0);

    Ok(WelchOutcome {
        t_statistic,
        degrees_of_freedom,
        p_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(a: &[f64], b: &[f64]) -> Result<WelchOutcome, HypothesisError> {
        welch_t_test(LabeledSample::new("a", a), LabeledSample::new("b", b))
    }

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() < tol,
            "expected {} ± {}, got {}",
            expected,
            tol,
            actual
        );
    }

    #[test]
    fn test_unequal_variance_reference_values() {
        let out = run(&[100.0, 200.0, 300.0, 400.0], &[50.0, 60.0, 70.0, 80.0]).unwrap();
        assert_close(out.t_statistic, 2.851_784_225_239_829, 1e-9);
        assert_close(out.degrees_of_freedom, 3.059_994_000_599_94, 1e-9);
        assert_close(out.p_value, 0.063_512_5, 1e-5);
    }

    #[test]
    fn test_unequal_sizes_reference_values() {
        let out = run(
            &[10.0, 12.0, 11.0, 13.0, 12.0, 11.0],
            &[20.0, 22.0, 21.0, 23.0, 22.0, 21.0, 24.0],
        )
        .unwrap();
        assert_close(out.t_statistic, -15.581_492_545_026_487, 1e-9);
        assert_close(out.degrees_of_freedom, 10.930_825_462_317_37, 1e-9);
        assert!(out.p_value < 1e-7, "p-value should be tiny, got {}", out.p_value);
    }

    #[test]
    fn test_identical_means_give_zero_t_and_unit_p() {
        let out = run(&[100.0, 101.0, 99.0, 100.0], &[100.0, 99.0, 101.0, 100.0]).unwrap();
        assert_close(out.t_statistic, 0.0, 1e-12);
        assert_close(out.degrees_of_freedom, 6.0, 1e-9);
        assert_close(out.p_value, 1.0, 1e-12);
    }

    #[test]
    fn test_swapping_samples_negates_t_and_keeps_p() {
        let a = [1200.0, 1500.0, 1800.0, 2100.0, 2400.0];
        let b = [900.0, 1000.0, 1100.0, 1200.0, 1300.0];
        let ab = run(&a, &b).unwrap();
        let ba = run(&b, &a).unwrap();

        assert_eq!(ab.t_statistic, -ba.t_statistic);
        assert_eq!(ab.degrees_of_freedom, ba.degrees_of_freedom);
        assert_eq!(ab.p_value, ba.p_value);
    }

    #[test]
    fn test_one_constant_sample_is_allowed() {
        let out = run(&[5.0, 5.0, 5.0], &[1.0, 2.0, 3.0]).unwrap();
        assert_close(out.degrees_of_freedom, 2.0, 1e-9);
        assert!(out.t_statistic > 0.0);
    }

    #[test]
    fn test_both_constant_samples_is_zero_variance() {
        assert_eq!(run(&[5.0, 5.0], &[7.0, 7.0, 7.0]), Err(HypothesisError::ZeroVariance));
    }

    #[test]
    fn test_single_observation_is_insufficient() {
        assert_eq!(
            run(&[10.0], &[1.0, 2.0, 3.0]),
            Err(HypothesisError::InsufficientSample { label: "a".to_string(), n: 1 })
        );
        assert_eq!(
            run(&[1.0, 2.0], &[]),
            Err(HypothesisError::InsufficientSample { label: "b".to_string(), n: 0 })
        );
    }
}
