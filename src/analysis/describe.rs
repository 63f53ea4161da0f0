//! Descriptive statistics for a numeric sample.
//!
//! Mirrors the usual "describe" summary: count, mean, sample standard
//! deviation (n - 1 denominator), min, quartiles and max. Quartiles use
//! linear interpolation between the two nearest order statistics at
//! position `q * (n - 1)` of the sorted sample.

use serde::Serialize;
use statrs::statistics::Statistics;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    /// `None` for single-observation samples, where it is undefined.
    pub std: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Summarize `sample`. Returns `None` for an empty sample.
pub fn describe(sample: &[f64]) -> Option<Summary> {
    if sample.is_empty() {
        return None;
    }

    let mut sorted = sample.to_vec();
    sorted.sort_by(f64::total_cmp);

    let std = (sample.len() >= 2).then(|| sample.std_dev());

    Some(Summary {
        count: sample.len(),
        mean: sample.mean(),
        std,
        min: sorted[0],
        q25: quantile_sorted(&sorted, 0.25)?,
        median: quantile_sorted(&sorted, 0.5)?,
        q75: quantile_sorted(&sorted, 0.75)?,
        max: sorted[sorted.len() - 1],
    })
}

/// Linear-interpolated quantile of an already sorted slice; `None` when empty.
fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_empty_sample_has_no_summary() {
        assert_eq!(describe(&[]), None);
    }

    #[test]
    fn test_summary_of_four_values() {
        let s = describe(&[400.0, 100.0, 300.0, 200.0]).expect("non-empty");
        assert_eq!(s.count, 4);
        assert_close(s.mean, 250.0);
        assert_close(s.std.unwrap(), (50_000.0f64 / 3.0).sqrt());
        assert_close(s.min, 100.0);
        assert_close(s.q25, 175.0);
        assert_close(s.median, 250.0);
        assert_close(s.q75, 325.0);
        assert_close(s.max, 400.0);
    }

    #[test]
    fn test_odd_length_median_is_middle_value() {
        let s = describe(&[3.0, 1.0, 2.0, 5.0, 4.0]).unwrap();
        assert_close(s.median, 3.0);
        assert_close(s.q25, 2.0);
        assert_close(s.q75, 4.0);
    }

    #[test]
    fn test_single_value_has_undefined_std() {
        let s = describe(&[1800.0]).unwrap();
        assert_eq!(s.count, 1);
        assert_eq!(s.std, None);
        assert_close(s.min, 1800.0);
        assert_close(s.median, 1800.0);
        assert_close(s.max, 1800.0);
    }

    #[test]
    fn test_quantile_endpoints() {
        let sorted = [10.0, 20.0, 30.0];
        assert_close(quantile_sorted(&sorted, 0.0).unwrap(), 10.0);
        assert_close(quantile_sorted(&sorted, 1.0).unwrap(), 30.0);
        assert_close(quantile_sorted(&sorted, 0.75).unwrap(), 25.0);
    }

    #[test]
    fn test_quantile_of_empty_slice_is_none() {
        assert_eq!(quantile_sorted(&[], 0.5), None);
        assert_eq!(quantile_sorted(&[], 0.0), None);
    }
}
