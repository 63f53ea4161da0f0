/// Dataset loading for the trip analysis pipeline.
///
/// Submodules:
/// - `locate`: resolves dataset file paths under a loosely organized folder.
/// - `csv_table`: parses a CSV file into an untyped `RawTable`.

pub mod csv_table;
pub mod locate;

use crate::logging::{self, Stage};
use crate::model::{Dataset, LoadError};
use csv_table::RawTable;
use std::path::{Path, PathBuf};

/// The three input tables, untyped, with the paths they were read from.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDatasets {
    pub company_trips: RawTable,
    pub dropoff_averages: RawTable,
    pub trip_durations: RawTable,
}

impl RawDatasets {
    pub fn get(&self, dataset: Dataset) -> &RawTable {
        match dataset {
            Dataset::CompanyTrips => &self.company_trips,
            Dataset::DropoffAverages => &self.dropoff_averages,
            Dataset::TripDurations => &self.trip_durations,
        }
    }

    pub fn paths(&self) -> [&Path; 3] {
        [
            self.company_trips.source.as_path(),
            self.dropoff_averages.source.as_path(),
            self.trip_durations.source.as_path(),
        ]
    }
}

/// Fail with `PathNotFound` unless `base_dir` is an existing directory.
pub fn ensure_base_dir(base_dir: &Path) -> Result<(), LoadError> {
    if base_dir.is_dir() {
        Ok(())
    } else {
        Err(LoadError::PathNotFound(base_dir.to_path_buf()))
    }
}

/// Resolve one dataset, read it, and check its required columns.
pub fn load_dataset(base_dir: &Path, dataset: Dataset) -> Result<RawTable, LoadError> {
    let path: PathBuf = locate::resolve_dataset(base_dir, dataset)?;
    logging::debug(
        Stage::Load,
        Some(dataset.label()),
        &format!("Resolved {}", path.display()),
    );

    let table = RawTable::read(&path)?;
    table.require_columns(dataset.required_columns())?;
    Ok(table)
}

/// Load all three datasets. Any missing file aborts the whole load.
pub fn load_datasets(base_dir: &Path) -> Result<RawDatasets, LoadError> {
    ensure_base_dir(base_dir)?;

    let datasets = RawDatasets {
        company_trips: load_dataset(base_dir, Dataset::CompanyTrips)?,
        dropoff_averages: load_dataset(base_dir, Dataset::DropoffAverages)?,
        trip_durations: load_dataset(base_dir, Dataset::TripDurations)?,
    };

    logging::info(Stage::Load, None, "Files loaded:");
    for path in datasets.paths() {
        logging::info(Stage::Load, None, &format!(" - {}", path.display()));
    }

    Ok(datasets)
}
