/// Dataset file resolution.
///
/// Input folders are loosely organized: the CSVs may sit directly in the
/// base directory, in a `datasets/` subfolder, or anywhere deeper. Files
/// that were relocated carry a `moved_` prefix. Lookups are resolved in a
/// fixed order and the recursive walk visits entries sorted by file name,
/// so the same tree always yields the same path.

use crate::model::{Dataset, LoadError};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Name of the conventional subfolder holding the datasets.
pub const DATASETS_SUBDIR: &str = "datasets";

/// Find `filename` under `base_dir`.
///
/// Resolution order, first match wins:
///   1. `base_dir/filename`
///   2. `base_dir/datasets/filename`
///   3. any file named `filename` found by a recursive walk of `base_dir`
///
/// Returns `LoadError::FileNotFound` when none of these match.
pub fn find_file(base_dir: &Path, filename: &str) -> Result<PathBuf, LoadError> {
    let direct = base_dir.join(filename);
    if direct.is_file() {
        return Ok(direct);
    }

    let in_datasets = base_dir.join(DATASETS_SUBDIR).join(filename);
    if in_datasets.is_file() {
        return Ok(in_datasets);
    }

    // Unreadable subfolders are skipped rather than aborting the search.
    WalkDir::new(base_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .find(|entry| entry.file_type().is_file() && entry.file_name() == filename)
        .map(|entry| entry.into_path())
        .ok_or_else(|| LoadError::FileNotFound {
            filename: filename.to_string(),
            base_dir: base_dir.to_path_buf(),
        })
}

/// Resolve a dataset by its canonical name, falling back to the `moved_`
/// variant. Each name goes through the full `find_file` order; when neither
/// exists the error names the canonical file.
pub fn resolve_dataset(base_dir: &Path, dataset: Dataset) -> Result<PathBuf, LoadError> {
    match find_file(base_dir, dataset.file_name()) {
        Ok(path) => Ok(path),
        Err(not_found @ LoadError::FileNotFound { .. }) => {
            find_file(base_dir, &dataset.alternate_file_name()).map_err(|_| not_found)
        }
        Err(other) => Err(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(path, "a,b\n1,2\n").expect("write file");
    }

    #[test]
    fn test_direct_match_wins_over_datasets_subdir() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path();
        touch(&base.join("trips.csv"));
        touch(&base.join("datasets/trips.csv"));

        let found = find_file(base, "trips.csv").expect("should be found");
        assert_eq!(found, base.join("trips.csv"));
    }

    #[test]
    fn test_datasets_subdir_wins_over_deeper_match() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path();
        touch(&base.join("aaa/nested/trips.csv"));
        touch(&base.join("datasets/trips.csv"));

        let found = find_file(base, "trips.csv").expect("should be found");
        assert_eq!(found, base.join("datasets/trips.csv"));
    }

    #[test]
    fn test_recursive_search_finds_nested_file() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path();
        touch(&base.join("archive/2017/november/trips.csv"));

        let found = find_file(base, "trips.csv").expect("should be found");
        assert_eq!(found, base.join("archive/2017/november/trips.csv"));
    }

    #[test]
    fn test_recursive_search_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path();
        touch(&base.join("zeta/trips.csv"));
        touch(&base.join("alpha/trips.csv"));
        touch(&base.join("mid/trips.csv"));

        let first = find_file(base, "trips.csv").expect("should be found");
        for _ in 0..5 {
            assert_eq!(find_file(base, "trips.csv").unwrap(), first);
        }
        assert_eq!(first, base.join("alpha/trips.csv"), "walk visits entries sorted by name");
    }

    #[test]
    fn test_directory_with_matching_name_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path();
        fs::create_dir_all(base.join("trips.csv")).unwrap();

        let result = find_file(base, "trips.csv");
        assert!(matches!(result, Err(LoadError::FileNotFound { .. })));
    }

    #[test]
    fn test_missing_file_reports_name_and_base() {
        let dir = tempfile::tempdir().unwrap();
        let result = find_file(dir.path(), "nowhere.csv");
        assert_eq!(
            result,
            Err(LoadError::FileNotFound {
                filename: "nowhere.csv".to_string(),
                base_dir: dir.path().to_path_buf(),
            })
        );
    }

    #[test]
    fn test_resolve_dataset_prefers_canonical_name() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path();
        touch(&base.join("moved_project_sql_result_07.csv"));
        touch(&base.join("datasets/project_sql_result_07.csv"));

        let found = resolve_dataset(base, Dataset::TripDurations).unwrap();
        assert_eq!(found, base.join("datasets/project_sql_result_07.csv"));
    }

    #[test]
    fn test_resolve_dataset_falls_back_to_moved_variant() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path();
        touch(&base.join("datasets/moved_project_sql_result_01.csv"));

        let found = resolve_dataset(base, Dataset::CompanyTrips).unwrap();
        assert_eq!(found, base.join("datasets/moved_project_sql_result_01.csv"));
    }

    #[test]
    fn test_resolve_dataset_missing_reports_canonical_name() {
        let dir = tempfile::tempdir().unwrap();
        match resolve_dataset(dir.path(), Dataset::DropoffAverages) {
            Err(LoadError::FileNotFound { filename, .. }) => {
                assert_eq!(filename, "project_sql_result_04.csv");
            }
            other => panic!("expected FileNotFound, got {:?}", other),
        }
    }
}
