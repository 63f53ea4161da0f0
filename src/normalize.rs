/// Type coercion for the three input tables.
///
/// Each required cell is coerced to its target type: trimmed text, a finite
/// `f64`, or a naive timestamp. A cell that cannot be coerced becomes
/// missing and its row is dropped. In strict mode the first such cell fails
/// the whole table instead. Every table reports how many rows it lost.

use crate::ingest::csv_table::RawTable;
use crate::ingest::RawDatasets;
use crate::logging;
use crate::model::{
    CompanyTrips, Dataset, DropoffAverage, LoadError, NormalizeError, TripDurationRecord,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fmt;

/// Timestamp layouts accepted for `start_ts`, tried in order.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

// ---------------------------------------------------------------------------
// Errors and reports
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq)]
pub enum CleanError {
    /// The table lacks a required column.
    Load(LoadError),
    /// Strict mode hit an uncoercible cell.
    Normalize(NormalizeError),
}

impl fmt::Display for CleanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleanError::Load(e) => write!(f, "{}", e),
            CleanError::Normalize(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CleanError {}

impl From<LoadError> for CleanError {
    fn from(e: LoadError) -> Self {
        CleanError::Load(e)
    }
}

impl From<NormalizeError> for CleanError {
    fn from(e: NormalizeError) -> Self {
        CleanError::Normalize(e)
    }
}

/// Row counts for one table before and after coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeReport {
    pub table: Dataset,
    pub rows_before: usize,
    pub rows_after: usize,
}

impl NormalizeReport {
    pub fn dropped(&self) -> usize {
        self.rows_before - self.rows_after
    }
}

/// How uncoercible cells are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Drop the row (best-effort parse).
    Drop,
    /// Fail on the first bad cell.
    Strict,
}

impl Policy {
    pub fn from_strict(strict: bool) -> Self {
        if strict { Policy::Strict } else { Policy::Drop }
    }
}

/// All three typed tables with their discard reports.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedDatasets {
    pub company_trips: Vec<CompanyTrips>,
    pub dropoff_averages: Vec<DropoffAverage>,
    pub trip_durations: Vec<TripDurationRecord>,
    pub reports: [NormalizeReport; 3],
}

// ---------------------------------------------------------------------------
// Cell coercion
// ---------------------------------------------------------------------------

/// Trimmed text; empty after trimming counts as missing.
pub fn coerce_text(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Finite floating-point number; NaN and infinities count as missing.
pub fn coerce_number(raw: Option<&str>) -> Option<f64> {
    raw?.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Naive timestamp. Values with a UTC offset keep their wall-clock time.
pub fn coerce_timestamp(raw: Option<&str>) -> Option<NaiveDateTime> {
    let text = raw?.trim();
    if text.is_empty() {
        return None;
    }

    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(text, format) {
            return Some(ts);
        }
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.naive_local());
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

// ---------------------------------------------------------------------------
// Table coercion
// ---------------------------------------------------------------------------

/// Walk every row, apply `build`, and keep the rows it accepts.
///
/// `build` returns `Err((column, value))` naming the first cell it could not
/// coerce; under `Policy::Strict` that becomes a `StrictViolation`.
fn coerce_rows<T, F>(
    table: &RawTable,
    dataset: Dataset,
    policy: Policy,
    build: F,
) -> Result<(Vec<T>, NormalizeReport), CleanError>
where
    F: Fn(usize) -> Result<T, (&'static str, String)>,
{
    let mut out = Vec::with_capacity(table.len());
    for row in 0..table.len() {
        match build(row) {
            Ok(record) => out.push(record),
            Err((column, value)) => {
                if policy == Policy::Strict {
                    return Err(NormalizeError::StrictViolation {
                        table: dataset,
                        row,
                        column: column.to_string(),
                        value,
                    }
                    .into());
                }
            }
        }
    }

    let report = NormalizeReport {
        table: dataset,
        rows_before: table.len(),
        rows_after: out.len(),
    };
    Ok((out, report))
}

fn missing(table: &RawTable, row: usize, col: usize, column: &'static str) -> (&'static str, String) {
    (column, table.cell(row, col).unwrap_or_default().to_string())
}

pub fn normalize_company_trips(
    table: &RawTable,
    policy: Policy,
) -> Result<(Vec<CompanyTrips>, NormalizeReport), CleanError> {
    let cols = table.require_columns(Dataset::CompanyTrips.required_columns())?;
    let (name_col, amount_col) = (cols[0], cols[1]);

    coerce_rows(table, Dataset::CompanyTrips, policy, |row| {
        let company_name = coerce_text(table.cell(row, name_col))
            .ok_or_else(|| missing(table, row, name_col, "company_name"))?;
        let trips_amount = coerce_number(table.cell(row, amount_col))
            .ok_or_else(|| missing(table, row, amount_col, "trips_amount"))?;
        Ok(CompanyTrips { company_name, trips_amount })
    })
}

pub fn normalize_dropoff_averages(
    table: &RawTable,
    policy: Policy,
) -> Result<(Vec<DropoffAverage>, NormalizeReport), CleanError> {
    let cols = table.require_columns(Dataset::DropoffAverages.required_columns())?;
    let (name_col, avg_col) = (cols[0], cols[1]);

    coerce_rows(table, Dataset::DropoffAverages, policy, |row| {
        let dropoff_location_name = coerce_text(table.cell(row, name_col))
            .ok_or_else(|| missing(table, row, name_col, "dropoff_location_name"))?;
        let average_trips = coerce_number(table.cell(row, avg_col))
            .ok_or_else(|| missing(table, row, avg_col, "average_trips"))?;
        Ok(DropoffAverage { dropoff_location_name, average_trips })
    })
}

pub fn normalize_trip_durations(
    table: &RawTable,
    policy: Policy,
) -> Result<(Vec<TripDurationRecord>, NormalizeReport), CleanError> {
    let cols = table.require_columns(Dataset::TripDurations.required_columns())?;
    let (ts_col, weather_col, duration_col) = (cols[0], cols[1], cols[2]);

    coerce_rows(table, Dataset::TripDurations, policy, |row| {
        let start_timestamp = coerce_timestamp(table.cell(row, ts_col))
            .ok_or_else(|| missing(table, row, ts_col, "start_ts"))?;
        let weather_conditions = coerce_text(table.cell(row, weather_col))
            .ok_or_else(|| missing(table, row, weather_col, "weather_conditions"))?;
        let duration_seconds = coerce_number(table.cell(row, duration_col))
            .ok_or_else(|| missing(table, row, duration_col, "duration_seconds"))?;
        Ok(TripDurationRecord {
            start_timestamp,
            weather_conditions,
            duration_seconds,
        })
    })
}

/// Normalize all three tables and log each table's discard count.
pub fn normalize_all(raw: &RawDatasets, policy: Policy) -> Result<NormalizedDatasets, CleanError> {
    let (company_trips, company_report) = normalize_company_trips(&raw.company_trips, policy)?;
    let (dropoff_averages, dropoff_report) =
        normalize_dropoff_averages(&raw.dropoff_averages, policy)?;
    let (trip_durations, duration_report) = normalize_trip_durations(&raw.trip_durations, policy)?;

    let reports = [company_report, dropoff_report, duration_report];
    for report in &reports {
        logging::log_discard_summary(report.table.label(), report.rows_before, report.rows_after);
    }

    Ok(NormalizedDatasets {
        company_trips,
        dropoff_averages,
        trip_durations,
        reports,
    })
}

fn raw_from_cells(dataset: Dataset, rows: Vec<Vec<String>>) -> RawTable {
    RawTable {
        source: Default::default(),
        headers: dataset
            .required_columns()
            .iter()
            .map(|c| c.to_string())
            .collect(),
        rows,
    }
}

/// Render typed company rows back into a raw table. Normalizing the result
/// yields the same records.
pub fn company_trips_to_raw(records: &[CompanyTrips]) -> RawTable {
    let rows = records
        .iter()
        .map(|r| vec![r.company_name.clone(), r.trips_amount.to_string()])
        .collect();
    raw_from_cells(Dataset::CompanyTrips, rows)
}

/// Render typed dropoff rows back into a raw table.
pub fn dropoff_averages_to_raw(records: &[DropoffAverage]) -> RawTable {
    let rows = records
        .iter()
        .map(|r| vec![r.dropoff_location_name.clone(), r.average_trips.to_string()])
        .collect();
    raw_from_cells(Dataset::DropoffAverages, rows)
}

/// Render typed trip records back into a raw table, in the canonical
/// timestamp layout.
pub fn trip_durations_to_raw(records: &[TripDurationRecord]) -> RawTable {
    let rows = records
        .iter()
        .map(|r| {
            vec![
                r.start_timestamp.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
                r.weather_conditions.clone(),
                r.duration_seconds.to_string(),
            ]
        })
        .collect();
    raw_from_cells(Dataset::TripDurations, rows)
}
