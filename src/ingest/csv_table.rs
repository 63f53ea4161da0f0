/// Raw delimited-text tables.
///
/// A `RawTable` holds the header row and every data row as untyped strings.
/// Typing happens later in `normalize`; this layer only checks that the file
/// is well-formed CSV and that the columns a dataset needs are present.

use crate::model::LoadError;
use csv::ReaderBuilder;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    /// File the table was read from (empty for in-memory tables).
    pub source: PathBuf,
    /// Column names from the header row, trimmed.
    pub headers: Vec<String>,
    /// Data rows. Short rows are kept as-is; missing trailing cells read as absent.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Read a CSV file with a header row.
    pub fn read(path: &Path) -> Result<Self, LoadError> {
        let file = File::open(path)
            .map_err(|e| LoadError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_reader(path.to_path_buf(), file)
    }

    /// Parse CSV text from any reader; `source` is recorded for error messages.
    pub fn from_reader<R: Read>(source: PathBuf, reader: R) -> Result<Self, LoadError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| LoadError::Csv(format!("{}: {}", source.display(), e)))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record.map_err(|e| LoadError::Csv(format!("{}: {}", source.display(), e)))?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(RawTable { source, headers, rows })
    }

    /// Build a table directly from string slices (used by tests and re-normalization).
    pub fn from_rows(headers: &[&str], rows: &[Vec<&str>]) -> Self {
        RawTable {
            source: PathBuf::new(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Indices of `columns`, in the given order, or `MissingColumn` for the
    /// first one the header lacks.
    pub fn require_columns(&self, columns: &[&str]) -> Result<Vec<usize>, LoadError> {
        columns
            .iter()
            .map(|name| {
                self.column_index(name).ok_or_else(|| LoadError::MissingColumn {
                    file: self.source.clone(),
                    column: name.to_string(),
                })
            })
            .collect()
    }

    /// Cell at `row`/`col`; `None` when the row is shorter than the header.
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row).and_then(|r| r.get(col)).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPANY_CSV: &str = "company_name,trips_amount\n\
                               Flash Cab,19558\n\
                               \"Taxi Affiliation Services, Inc.\",11422\n\
                               Medallion Leasin,10367\n";

    #[test]
    fn test_parses_headers_and_rows() {
        let table = RawTable::from_reader(PathBuf::from("01.csv"), COMPANY_CSV.as_bytes())
            .expect("valid csv should parse");

        assert_eq!(table.headers, vec!["company_name", "trips_amount"]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.cell(0, 0), Some("Flash Cab"));
        assert_eq!(table.cell(1, 0), Some("Taxi Affiliation Services, Inc."));
        assert_eq!(table.cell(2, 1), Some("10367"));
    }

    #[test]
    fn test_short_rows_are_kept_with_absent_cells() {
        let csv = "a,b,c\n1,2,3\n4,5\n";
        let table = RawTable::from_reader(PathBuf::new(), csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(1, 1), Some("5"));
        assert_eq!(table.cell(1, 2), None);
    }

    #[test]
    fn test_headers_are_trimmed() {
        let csv = " start_ts , weather_conditions ,duration_seconds\n";
        let table = RawTable::from_reader(PathBuf::new(), csv.as_bytes()).unwrap();
        assert_eq!(table.column_index("weather_conditions"), Some(1));
        assert!(table.is_empty());
    }

    #[test]
    fn test_require_columns_reports_first_missing() {
        let table = RawTable::from_reader(PathBuf::from("04.csv"), COMPANY_CSV.as_bytes()).unwrap();
        assert_eq!(table.require_columns(&["trips_amount", "company_name"]), Ok(vec![1, 0]));

        let result = table.require_columns(&["dropoff_location_name", "average_trips"]);
        assert_eq!(
            result,
            Err(LoadError::MissingColumn {
                file: PathBuf::from("04.csv"),
                column: "dropoff_location_name".to_string(),
            })
        );
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = RawTable::read(&dir.path().join("absent.csv"));
        assert!(matches!(result, Err(LoadError::Io(_))));
    }
}
