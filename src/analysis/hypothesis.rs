//! Weather vs. trip-duration hypothesis test.
//!
//! H0: mean trip duration is the same for trips recorded under "Bad" and
//! "Good" weather. H1: the means differ (two-tailed).
//!
//! `run_hypothesis_test` is a pure computation: it returns every
//! intermediate quantity in a `HypothesisResult` and leaves presentation to
//! `report`. Records with any other weather label are ignored.

use crate::analysis::describe::{describe, Summary};
use crate::analysis::welch::{welch_t_test, LabeledSample, WelchOutcome};
use crate::model::{HypothesisError, TripDurationRecord, WEATHER_BAD, WEATHER_GOOD};
use chrono::{Datelike, Weekday};
use serde::Serialize;
use statrs::statistics::Statistics;

/// Weekday the trip-duration dataset is expected to be restricted to.
pub const EXPECTED_WEEKDAY: Weekday = Weekday::Sat;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HypothesisParams {
    pub alpha: f64,
    pub remove_nonpositive: bool,
}

impl Default for HypothesisParams {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            remove_nonpositive: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    RejectNull,
    FailToReject,
}

/// Record counts around the non-positive duration filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FilterCounts {
    pub before: usize,
    pub after: usize,
}

/// Outcome of comparing two duration samples.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub t_statistic: f64,
    pub degrees_of_freedom: f64,
    pub p_value: f64,
    /// `mean(first) - mean(second)`, in seconds.
    pub mean_difference: f64,
    pub alpha: f64,
    pub decision: Decision,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HypothesisResult {
    /// Share of records starting on `EXPECTED_WEEKDAY`; `None` when there are no records.
    pub weekday_ratio: Option<f64>,
    /// Present only when the non-positive filter ran.
    pub filter: Option<FilterCounts>,
    pub bad: Summary,
    pub good: Summary,
    pub comparison: Comparison,
}

impl HypothesisResult {
    pub fn t_statistic(&self) -> f64 {
        self.comparison.t_statistic
    }

    pub fn p_value(&self) -> f64 {
        self.comparison.p_value
    }

    pub fn mean_difference(&self) -> f64 {
        self.comparison.mean_difference
    }

    pub fn decision(&self) -> Decision {
        self.comparison.decision
    }
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// Fraction of records whose start falls on `weekday`.
pub fn weekday_ratio(records: &[TripDurationRecord], weekday: Weekday) -> Option<f64> {
    if records.is_empty() {
        return None;
    }
    let hits = records
        .iter()
        .filter(|r| r.start_timestamp.weekday() == weekday)
        .count();
    Some(hits as f64 / records.len() as f64)
}

/// Keep only records with a strictly positive duration.
pub fn filter_nonpositive(records: &[TripDurationRecord]) -> Vec<&TripDurationRecord> {
    records.iter().filter(|r| r.duration_seconds > 0.0).collect()
}

/// Durations of the records labelled exactly `label`, in input order.
pub fn sample_for<'a, I>(records: I, label: &str) -> Vec<f64>
where
    I: IntoIterator<Item = &'a TripDurationRecord>,
{
    records
        .into_iter()
        .filter(|r| r.weather_conditions == label)
        .map(|r| r.duration_seconds)
        .collect()
}

/// `RejectNull` iff `p_value < alpha`.
pub fn decide(p_value: f64, alpha: f64) -> Decision {
    if p_value < alpha {
        Decision::RejectNull
    } else {
        Decision::FailToReject
    }
}

fn check_alpha(alpha: f64) -> Result<(), HypothesisError> {
    if alpha > 0.0 && alpha < 1.0 {
        Ok(())
    } else {
        Err(HypothesisError::InvalidAlpha(alpha))
    }
}

/// Compare two labelled samples with Welch's test and apply the decision rule.
pub fn compare_samples(
    first: LabeledSample<'_>,
    second: LabeledSample<'_>,
    alpha: f64,
) -> Result<Comparison, HypothesisError> {
    check_alpha(alpha)?;
    let WelchOutcome {
        t_statistic,
        degrees_of_freedom,
        p_value,
    } = welch_t_test(first, second)?;

    let mean_difference = first.values.mean() - second.values.mean();

    Ok(Comparison {
        t_statistic,
        degrees_of_freedom,
        p_value,
        mean_difference,
        alpha,
        decision: decide(p_value, alpha),
    })
}

/// Everything measured on the trip records before the t-test runs.
///
/// Available even when a sample turns out too small to test, so the caller
/// can still report the weekday share, filter counts and sample sizes.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleOverview {
    pub weekday_ratio: Option<f64>,
    pub filter: Option<FilterCounts>,
    pub bad: Vec<f64>,
    pub good: Vec<f64>,
    /// `None` when the sample is empty.
    pub bad_summary: Option<Summary>,
    pub good_summary: Option<Summary>,
}

impl SampleOverview {
    pub fn n_bad(&self) -> usize {
        self.bad.len()
    }

    pub fn n_good(&self) -> usize {
        self.good.len()
    }
}

/// Weekday share, non-positive filter and Bad/Good partition, without testing.
pub fn prepare_samples(
    records: &[TripDurationRecord],
    params: &HypothesisParams,
) -> Result<SampleOverview, HypothesisError> {
    check_alpha(params.alpha)?;

    let weekday_ratio = weekday_ratio(records, EXPECTED_WEEKDAY);

    let (kept, filter) = if params.remove_nonpositive {
        let kept = filter_nonpositive(records);
        let counts = FilterCounts {
            before: records.len(),
            after: kept.len(),
        };
        (kept, Some(counts))
    } else {
        (records.iter().collect::<Vec<_>>(), None)
    };

    let bad = sample_for(kept.iter().copied(), WEATHER_BAD);
    let good = sample_for(kept.iter().copied(), WEATHER_GOOD);
    let bad_summary = describe(&bad);
    let good_summary = describe(&good);

    Ok(SampleOverview {
        weekday_ratio,
        filter,
        bad,
        good,
        bad_summary,
        good_summary,
    })
}

/// Run Welch's test on a prepared overview.
pub fn compare_overview(
    overview: &SampleOverview,
    alpha: f64,
) -> Result<HypothesisResult, HypothesisError> {
    let comparison = compare_samples(
        LabeledSample::new(WEATHER_BAD, &overview.bad),
        LabeledSample::new(WEATHER_GOOD, &overview.good),
        alpha,
    )?;

    // Both samples hold at least two values once the comparison succeeded.
    let (Some(bad), Some(good)) = (&overview.bad_summary, &overview.good_summary) else {
        return Err(HypothesisError::InsufficientSample {
            label: WEATHER_BAD.to_string(),
            n: overview.n_bad(),
        });
    };

    Ok(HypothesisResult {
        weekday_ratio: overview.weekday_ratio,
        filter: overview.filter,
        bad: bad.clone(),
        good: good.clone(),
        comparison,
    })
}

/// Run the full weather/duration test over the normalized trip records.
pub fn run_hypothesis_test(
    records: &[TripDurationRecord],
    params: &HypothesisParams,
) -> Result<HypothesisResult, HypothesisError> {
    let overview = prepare_samples(records, params)?;
    compare_overview(&overview, params.alpha)
}
