//! Console reporting for the trip analysis pipeline.
//!
//! Everything here turns already-computed values into lines of text (or a
//! JSON document) and hands them to `logging`. Nothing in this module
//! computes statistics.

use crate::analysis::describe::Summary;
use crate::analysis::hypothesis::{Decision, FilterCounts, HypothesisResult, SampleOverview};
use crate::logging::{self, Stage};
use crate::model::{CompanyTrips, DropoffAverage, TripDurationRecord, WEATHER_BAD, WEATHER_GOOD};
use crate::normalize::NormalizeReport;

/// Rows shown in a table preview.
pub const HEAD_ROWS: usize = 5;

// ---------------------------------------------------------------------------
// Table views
// ---------------------------------------------------------------------------

/// A typed row that can be printed as part of a table.
pub trait TableRow {
    /// Column names paired with a type label.
    fn columns() -> &'static [(&'static str, &'static str)];
    fn cells(&self) -> Vec<String>;
}

impl TableRow for CompanyTrips {
    fn columns() -> &'static [(&'static str, &'static str)] {
        &[("company_name", "text"), ("trips_amount", "float64")]
    }

    fn cells(&self) -> Vec<String> {
        vec![self.company_name.clone(), format_number(self.trips_amount)]
    }
}

impl TableRow for DropoffAverage {
    fn columns() -> &'static [(&'static str, &'static str)] {
        &[("dropoff_location_name", "text"), ("average_trips", "float64")]
    }

    fn cells(&self) -> Vec<String> {
        vec![self.dropoff_location_name.clone(), format_number(self.average_trips)]
    }
}

impl TableRow for TripDurationRecord {
    fn columns() -> &'static [(&'static str, &'static str)] {
        &[
            ("start_ts", "datetime"),
            ("weather_conditions", "text"),
            ("duration_seconds", "float64"),
        ]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.start_timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            self.weather_conditions.clone(),
            format_number(self.duration_seconds),
        ]
    }
}

/// Whole numbers print with one decimal; others with up to six, trailing zeros trimmed.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.1}", value)
    } else {
        let text = format!("{:.6}", value);
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Left-aligned fixed-width table with a header row.
pub fn format_table(headers: &[&str], rows: &[Vec<String>]) -> Vec<String> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let render = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(render(headers.to_vec()));
    for row in rows {
        lines.push(render(row.iter().map(String::as_str).collect()));
    }
    lines
}

/// Preview (first rows) plus a column listing with non-null counts.
pub fn overview_lines<T: TableRow>(title: &str, rows: &[T]) -> Vec<String> {
    let columns = T::columns();
    let headers: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();
    let head: Vec<Vec<String>> = rows.iter().take(HEAD_ROWS).map(TableRow::cells).collect();

    let mut lines = vec![format!("=== {} info ===", title)];
    lines.extend(format_table(&headers, &head));
    lines.push(format!("{} entries, {} columns", rows.len(), columns.len()));
    for (name, dtype) in columns {
        lines.push(format!(" {:<24} {} non-null  {}", name, rows.len(), dtype));
    }
    lines
}

pub fn normalize_lines(reports: &[NormalizeReport]) -> Vec<String> {
    reports
        .iter()
        .map(|r| {
            format!(
                "{}: {} -> {} rows ({} dropped during type coercion)",
                r.table,
                r.rows_before,
                r.rows_after,
                r.dropped()
            )
        })
        .collect()
}

pub fn top_dropoff_lines(top: &[DropoffAverage]) -> Vec<String> {
    let headers: Vec<&str> = DropoffAverage::columns().iter().map(|(name, _)| *name).collect();
    let rows: Vec<Vec<String>> = top.iter().map(TableRow::cells).collect();

    let mut lines = vec![format!("Top {} dropoff locations:", top.len())];
    lines.extend(format_table(&headers, &rows));
    lines
}

// ---------------------------------------------------------------------------
// Hypothesis report
// ---------------------------------------------------------------------------

fn summary_lines(label: &str, s: &Summary) -> Vec<String> {
    let std = s.std.map(|v| format!("{:.6}", v)).unwrap_or_else(|| "NaN".to_string());
    vec![
        format!("{}:", label),
        format!("  count  {}", s.count),
        format!("  mean   {:.6}", s.mean),
        format!("  std    {}", std),
        format!("  min    {:.6}", s.min),
        format!("  25%    {:.6}", s.q25),
        format!("  50%    {:.6}", s.median),
        format!("  75%    {:.6}", s.q75),
        format!("  max    {:.6}", s.max),
    ]
}

/// Human-readable conclusion for a decision and the sign of the mean difference.
pub fn decision_text(decision: Decision, mean_difference: f64) -> Vec<String> {
    match decision {
        Decision::RejectNull => {
            let mut lines = vec![
                "Reject H0: there is evidence that mean trip duration CHANGES between Bad and Good weather."
                    .to_string(),
            ];
            if mean_difference > 0.0 {
                lines.push(
                    "Mean duration under Bad weather is HIGHER than under Good (longer trips in bad weather)."
                        .to_string(),
                );
            } else if mean_difference < 0.0 {
                lines.push(
                    "Mean duration under Bad weather is LOWER than under Good (shorter trips in bad weather)."
                        .to_string(),
                );
            }
            lines
        }
        Decision::FailToReject => vec![
            "Fail to reject H0: not enough evidence of a change in mean trip duration.".to_string(),
        ],
    }
}

/// Weekday share, filter counts, sample sizes and descriptive statistics.
fn sample_lines(
    weekday_ratio: Option<f64>,
    filter: Option<FilterCounts>,
    samples: [(&str, usize, Option<&Summary>); 2],
) -> Vec<String> {
    let mut lines = Vec::new();

    match weekday_ratio {
        Some(ratio) => lines.push(format!("Share of Saturdays in the dataset: {:.3}", ratio)),
        None => lines.push("Share of Saturdays in the dataset: n/a (no records)".to_string()),
    }

    if let Some(filter) = filter {
        lines.push(format!(
            "Filtered duration_seconds > 0: {} -> {}",
            filter.before, filter.after
        ));
    }

    lines.push(String::new());
    lines.push("Sample sizes:".to_string());
    for (label, n, _) in &samples {
        lines.push(format!("n_{:<5}: {}", label, n));
    }

    lines.push(String::new());
    lines.push("Descriptive statistics (duration in seconds):".to_string());
    for (label, _, summary) in &samples {
        match summary {
            Some(s) => lines.extend(summary_lines(label, s)),
            None => lines.push(format!("{}: no observations", label)),
        }
    }
    lines
}

/// What was measured before the t-test. Printed on its own when a sample is
/// too small to test.
pub fn sample_overview_lines(overview: &SampleOverview) -> Vec<String> {
    sample_lines(
        overview.weekday_ratio,
        overview.filter,
        [
            (WEATHER_BAD, overview.n_bad(), overview.bad_summary.as_ref()),
            (WEATHER_GOOD, overview.n_good(), overview.good_summary.as_ref()),
        ],
    )
}

/// The full text report of a hypothesis test run.
pub fn hypothesis_lines(result: &HypothesisResult) -> Vec<String> {
    let cmp = &result.comparison;
    let mut lines = sample_lines(
        result.weekday_ratio,
        result.filter,
        [
            (WEATHER_BAD, result.bad.count, Some(&result.bad)),
            (WEATHER_GOOD, result.good.count, Some(&result.good)),
        ],
    );

    lines.push(String::new());
    lines.push("Welch t-test:".to_string());
    lines.push(format!("t-statistic: {}", cmp.t_statistic));
    lines.push(format!("degrees of freedom: {:.4}", cmp.degrees_of_freedom));
    lines.push(format!("p-value: {:.3e}", cmp.p_value));

    lines.push(String::new());
    lines.push(format!(
        "Difference in means (Bad - Good): {:.2} s (~{:.2} min)",
        cmp.mean_difference,
        cmp.mean_difference / 60.0
    ));

    lines.push(String::new());
    lines.push(format!("Decision (alpha = {}):", cmp.alpha));
    lines.extend(decision_text(cmp.decision, cmp.mean_difference));
    lines
}

pub fn hypothesis_json(result: &HypothesisResult) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(result)
}

/// Send each line to the logger at INFO under `stage`.
pub fn emit(stage: Stage, lines: &[String]) {
    for line in lines {
        logging::info(stage, None, line);
    }
}
