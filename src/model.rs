/// Core data types for the Zuber trip analysis service.
///
/// This module defines the shared domain model imported by all other modules:
/// the three dataset identifiers, the typed rows produced by normalization,
/// and the error enums raised along the pipeline. It contains no logic
/// beyond identifier lookups and `Display` impls.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Dataset identifiers
// ---------------------------------------------------------------------------

/// Weather label for trips taken in bad conditions.
pub const WEATHER_BAD: &str = "Bad";

/// Weather label for trips taken in good conditions.
pub const WEATHER_GOOD: &str = "Good";

/// Prefix used when a dataset file has been relocated.
pub const MOVED_PREFIX: &str = "moved_";

/// The three input tables of the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    /// Trip counts per taxi company (15-16 Nov 2017).
    CompanyTrips,
    /// Average dropoffs per neighborhood (Nov 2017).
    DropoffAverages,
    /// Per-trip start time, weather and duration (Loop -> O'Hare, Saturdays).
    TripDurations,
}

impl Dataset {
    pub const ALL: [Dataset; 3] = [
        Dataset::CompanyTrips,
        Dataset::DropoffAverages,
        Dataset::TripDurations,
    ];

    /// Canonical file name of the dataset.
    pub fn file_name(&self) -> &'static str {
        match self {
            Dataset::CompanyTrips => "project_sql_result_01.csv",
            Dataset::DropoffAverages => "project_sql_result_04.csv",
            Dataset::TripDurations => "project_sql_result_07.csv",
        }
    }

    /// Alternate ("moved_") file name of the dataset.
    pub fn alternate_file_name(&self) -> String {
        format!("{}{}", MOVED_PREFIX, self.file_name())
    }

    /// Columns that must be present and non-missing after normalization.
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            Dataset::CompanyTrips => &["company_name", "trips_amount"],
            Dataset::DropoffAverages => &["dropoff_location_name", "average_trips"],
            Dataset::TripDurations => &["start_ts", "weather_conditions", "duration_seconds"],
        }
    }

    /// Short label used in logs and reports.
    pub fn label(&self) -> &'static str {
        match self {
            Dataset::CompanyTrips => "Dataset 01",
            Dataset::DropoffAverages => "Dataset 04",
            Dataset::TripDurations => "Dataset 07",
        }
    }
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ---------------------------------------------------------------------------
// Record types
// ---------------------------------------------------------------------------

/// One row of the company trip-count table after normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyTrips {
    pub company_name: String,
    pub trips_amount: f64,
}

/// One row of the dropoff-average table after normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DropoffAverage {
    pub dropoff_location_name: String,
    pub average_trips: f64,
}

/// One row of the trip-duration table after normalization.
///
/// Rows whose timestamp, weather label or duration could not be parsed
/// never reach this type; they are dropped by `normalize`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripDurationRecord {
    pub start_timestamp: NaiveDateTime,
    pub weather_conditions: String,
    pub duration_seconds: f64,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise while locating or reading the input datasets.
#[derive(Debug, PartialEq)]
pub enum LoadError {
    /// The configured base directory does not exist.
    PathNotFound(PathBuf),
    /// No file with the requested name exists anywhere under the base directory.
    FileNotFound { filename: String, base_dir: PathBuf },
    /// The file exists but could not be opened or read.
    Io(String),
    /// The file is not valid delimited text.
    Csv(String),
    /// The header row lacks a column the dataset requires.
    MissingColumn { file: PathBuf, column: String },
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::PathNotFound(path) => {
                write!(f, "Base path does not exist: {}", path.display())
            }
            LoadError::FileNotFound { filename, base_dir } => {
                write!(f, "Could not find {} under {}", filename, base_dir.display())
            }
            LoadError::Io(msg) => write!(f, "I/O error: {}", msg),
            LoadError::Csv(msg) => write!(f, "CSV error: {}", msg),
            LoadError::MissingColumn { file, column } => {
                write!(f, "Column '{}' missing from {}", column, file.display())
            }
        }
    }
}

impl std::error::Error for LoadError {}

/// Raised by the normalizer in strict mode instead of dropping a row.
#[derive(Debug, PartialEq)]
pub enum NormalizeError {
    StrictViolation {
        table: Dataset,
        row: usize,
        column: String,
        value: String,
    },
}

impl std::fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NormalizeError::StrictViolation { table, row, column, value } => write!(
                f,
                "{} row {}: cannot coerce column '{}' (value {:?})",
                table, row, column, value
            ),
        }
    }
}

impl std::error::Error for NormalizeError {}

/// Errors from the weather/duration hypothesis test.
#[derive(Debug, PartialEq)]
pub enum HypothesisError {
    /// Significance level outside the open interval (0, 1).
    InvalidAlpha(f64),
    /// A weather sample has fewer than two observations, so its variance
    /// (and the whole test) is undefined.
    InsufficientSample { label: String, n: usize },
    /// Both samples have zero variance; the t statistic is undefined.
    ZeroVariance,
    /// The reference t distribution could not be built for the computed
    /// degrees of freedom.
    Distribution(String),
}

impl std::fmt::Display for HypothesisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HypothesisError::InvalidAlpha(alpha) => {
                write!(f, "alpha must lie strictly between 0 and 1, got {}", alpha)
            }
            HypothesisError::InsufficientSample { label, n } => write!(
                f,
                "Insufficient sample for '{}': {} observation(s), need at least 2",
                label, n
            ),
            HypothesisError::ZeroVariance => {
                write!(f, "Both samples have zero variance; t statistic is undefined")
            }
            HypothesisError::Distribution(msg) => write!(f, "t distribution error: {}", msg),
        }
    }
}

impl std::error::Error for HypothesisError {}
