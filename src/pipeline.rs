//! End-to-end run: load -> normalize -> charts -> hypothesis test.
//!
//! Charts are drawn through a `ChartRenderer`; `run` writes PNG files.
//!
//! Every step is fatal on error; there is no partial-success mode. The base
//! directory is checked before anything else so a missing folder is
//! reported as `PathNotFound` without touching the filesystem.

use crate::analysis::hypothesis::{self, HypothesisParams, HypothesisResult};
use crate::config::{AnalysisConfig, ReportFormat};
use crate::ingest;
use crate::logging::{self, Stage};
use crate::model::{
    CompanyTrips, Dataset, DropoffAverage, HypothesisError, LoadError, TripDurationRecord,
};
use crate::normalize::{self, CleanError, Policy};
use crate::plots::{self, PlotError};
use crate::report;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum PipelineError {
    Load(LoadError),
    Clean(CleanError),
    Output(String),
    Plot(PlotError),
    Hypothesis(HypothesisError),
}

impl PipelineError {
    pub fn is_path_not_found(&self) -> bool {
        matches!(self, PipelineError::Load(LoadError::PathNotFound(_)))
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Load(e) => write!(f, "{}", e),
            PipelineError::Clean(e) => write!(f, "{}", e),
            PipelineError::Output(msg) => write!(f, "Cannot create output folder: {}", msg),
            PipelineError::Plot(e) => write!(f, "{}", e),
            PipelineError::Hypothesis(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<LoadError> for PipelineError {
    fn from(e: LoadError) -> Self {
        PipelineError::Load(e)
    }
}

impl From<CleanError> for PipelineError {
    fn from(e: CleanError) -> Self {
        PipelineError::Clean(e)
    }
}

impl From<PlotError> for PipelineError {
    fn from(e: PlotError) -> Self {
        PipelineError::Plot(e)
    }
}

impl From<HypothesisError> for PipelineError {
    fn from(e: HypothesisError) -> Self {
        PipelineError::Hypothesis(e)
    }
}

/// What a successful run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub charts: [PathBuf; 2],
    pub hypothesis: HypothesisResult,
}

/// Draws the two summary charts into the output folder.
pub trait ChartRenderer {
    fn company_chart(&self, rows: &[CompanyTrips], out_dir: &Path) -> Result<PathBuf, PlotError>;

    /// Returns the chart path and the rows shown, largest first.
    fn dropoff_chart(
        &self,
        rows: &[DropoffAverage],
        out_dir: &Path,
    ) -> Result<(PathBuf, Vec<DropoffAverage>), PlotError>;
}

/// PNG charts through `plotters`.
pub struct PngCharts;

impl ChartRenderer for PngCharts {
    fn company_chart(&self, rows: &[CompanyTrips], out_dir: &Path) -> Result<PathBuf, PlotError> {
        plots::render_company_chart(rows, out_dir)
    }

    fn dropoff_chart(
        &self,
        rows: &[DropoffAverage],
        out_dir: &Path,
    ) -> Result<(PathBuf, Vec<DropoffAverage>), PlotError> {
        plots::render_top_dropoffs_chart(rows, out_dir)
    }
}

/// Report lines for the weather test together with its outcome.
///
/// When a sample is too small to test, `lines` still carries the weekday
/// share, filter counts and sample sizes measured beforehand.
#[derive(Debug)]
pub struct HypothesisStage {
    pub lines: Vec<String>,
    pub outcome: Result<HypothesisResult, HypothesisError>,
}

pub fn hypothesis_stage(
    records: &[TripDurationRecord],
    params: &HypothesisParams,
    format: ReportFormat,
) -> HypothesisStage {
    let overview = match hypothesis::prepare_samples(records, params) {
        Ok(overview) => overview,
        Err(e) => {
            return HypothesisStage {
                lines: Vec::new(),
                outcome: Err(e),
            };
        }
    };

    let result = match hypothesis::compare_overview(&overview, params.alpha) {
        Ok(result) => result,
        Err(e) => {
            return HypothesisStage {
                lines: report::sample_overview_lines(&overview),
                outcome: Err(e),
            };
        }
    };

    let lines = match format {
        ReportFormat::Text => report::hypothesis_lines(&result),
        ReportFormat::Json => match report::hypothesis_json(&result) {
            Ok(json) => vec![json],
            Err(e) => {
                logging::warn(Stage::Stats, None, &format!("JSON report failed ({}); falling back to text", e));
                report::hypothesis_lines(&result)
            }
        },
    };

    HypothesisStage {
        lines,
        outcome: Ok(result),
    }
}

/// Run the whole analysis described by `config`.
pub fn run(config: &AnalysisConfig) -> Result<RunSummary, PipelineError> {
    run_with(config, &PngCharts)
}

/// Run the analysis, drawing charts through `charts`.
pub fn run_with<C: ChartRenderer>(config: &AnalysisConfig, charts: &C) -> Result<RunSummary, PipelineError> {
    ingest::ensure_base_dir(&config.base_dir)?;

    let out_dir = config.resolved_output_dir();
    fs::create_dir_all(&out_dir)
        .map_err(|e| PipelineError::Output(format!("{}: {}", out_dir.display(), e)))?;

    let raw = ingest::load_datasets(&config.base_dir)?;
    let data = normalize::normalize_all(&raw, Policy::from_strict(config.strict))?;

    report::emit(Stage::Clean, &report::normalize_lines(&data.reports));
    report::emit(
        Stage::Clean,
        &report::overview_lines(Dataset::CompanyTrips.label(), &data.company_trips),
    );
    report::emit(
        Stage::Clean,
        &report::overview_lines(Dataset::DropoffAverages.label(), &data.dropoff_averages),
    );
    report::emit(
        Stage::Clean,
        &report::overview_lines(Dataset::TripDurations.label(), &data.trip_durations),
    );

    let company_chart = charts.company_chart(&data.company_trips, &out_dir)?;
    let (dropoff_chart, top) = charts.dropoff_chart(&data.dropoff_averages, &out_dir)?;
    report::emit(Stage::Plot, &report::top_dropoff_lines(&top));

    logging::info(Stage::Stats, None, "=== Hypothesis test (Dataset 07) ===");
    let params = HypothesisParams {
        alpha: config.alpha,
        remove_nonpositive: config.remove_nonpositive,
    };
    let stage = hypothesis_stage(&data.trip_durations, &params, config.report_format);
    report::emit(Stage::Stats, &stage.lines);
    let result = stage.outcome?;

    Ok(RunSummary {
        charts: [company_chart, dropoff_chart],
        hypothesis: result,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::hypothesis::Decision;
    use crate::model::NormalizeError;

    /// Records what it was asked to draw without rendering anything.
    struct NoopCharts;

    impl ChartRenderer for NoopCharts {
        fn company_chart(&self, _rows: &[CompanyTrips], out_dir: &Path) -> Result<PathBuf, PlotError> {
            Ok(out_dir.join(plots::COMPANY_CHART_FILE))
        }

        fn dropoff_chart(
            &self,
            rows: &[DropoffAverage],
            out_dir: &Path,
        ) -> Result<(PathBuf, Vec<DropoffAverage>), PlotError> {
            Ok((
                out_dir.join(plots::DROPOFF_CHART_FILE),
                plots::top_dropoffs(rows, plots::TOP_N_DROPOFFS),
            ))
        }
    }

    fn write_datasets(base: &Path, durations_csv: &str) {
        fs::write(
            base.join("project_sql_result_01.csv"),
            "company_name,trips_amount\nFlash Cab,19558\nSun Taxi,7455\n",
        )
        .unwrap();
        fs::write(
            base.join("project_sql_result_04.csv"),
            "dropoff_location_name,average_trips\nLoop,10727.47\nRiver North,9523.67\n",
        )
        .unwrap();
        fs::write(base.join("project_sql_result_07.csv"), durations_csv).unwrap();
    }

    const SEPARATED_TRIPS: &str = "start_ts,weather_conditions,duration_seconds\n\
2017-11-25 10:00:00,Bad,1200\n\
2017-11-25 11:00:00,Bad,1500\n\
2017-11-25 12:00:00,Bad,1800\n\
2017-11-25 13:00:00,Bad,2100\n\
2017-11-25 14:00:00,Bad,2400\n\
2017-11-25 15:00:00,Good,900\n\
2017-11-25 16:00:00,Good,1000\n\
2017-11-25 17:00:00,Good,1100\n\
2017-11-25 18:00:00,Good,1200\n\
2017-11-25 19:00:00,Good,1300\n";

    fn config_for(base: &Path, format: ReportFormat) -> AnalysisConfig {
        AnalysisConfig {
            base_dir: base.to_path_buf(),
            report_format: format,
            ..AnalysisConfig::default()
        }
    }

    fn record(weather: &str, duration: f64) -> TripDurationRecord {
        TripDurationRecord {
            start_timestamp: chrono::NaiveDate::from_ymd_opt(2017, 11, 25)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            weather_conditions: weather.to_string(),
            duration_seconds: duration,
        }
    }

    #[test]
    fn test_missing_base_dir_fails_before_creating_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let config = AnalysisConfig {
            base_dir: dir.path().join("missing"),
            ..AnalysisConfig::default()
        };

        let err = run(&config).expect_err("missing base dir must fail");
        assert!(err.is_path_not_found(), "got {}", err);
        assert!(!dir.path().join("missing/outputs").exists());
    }

    #[test]
    fn test_missing_dataset_aborts_without_charts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("project_sql_result_01.csv"),
            "company_name,trips_amount\nFlash Cab,19558\n",
        )
        .unwrap();

        let config = AnalysisConfig {
            base_dir: dir.path().to_path_buf(),
            ..AnalysisConfig::default()
        };

        let err = run(&config).expect_err("missing dataset 04 must fail");
        assert!(matches!(err, PipelineError::Load(LoadError::FileNotFound { .. })));
        assert!(!dir.path().join("outputs").join(plots::COMPANY_CHART_FILE).exists());
    }

    #[test]
    fn test_successful_run_with_text_report() {
        let dir = tempfile::tempdir().unwrap();
        write_datasets(dir.path(), SEPARATED_TRIPS);

        let summary = run_with(&config_for(dir.path(), ReportFormat::Text), &NoopCharts)
            .expect("complete datasets should run");

        assert_eq!(summary.charts[0], dir.path().join("outputs").join(plots::COMPANY_CHART_FILE));
        assert_eq!(summary.charts[1], dir.path().join("outputs").join(plots::DROPOFF_CHART_FILE));
        assert!(dir.path().join("outputs").is_dir());
        assert_eq!(summary.hypothesis.decision(), Decision::RejectNull);
        assert!((summary.hypothesis.mean_difference() - 700.0).abs() < 1e-9);
    }

    #[test]
    fn test_successful_run_with_json_report() {
        let dir = tempfile::tempdir().unwrap();
        write_datasets(dir.path(), SEPARATED_TRIPS);

        let summary = run_with(&config_for(dir.path(), ReportFormat::Json), &NoopCharts)
            .expect("complete datasets should run");
        assert_eq!(summary.hypothesis.filter.map(|f| f.after), Some(10));
    }

    #[test]
    fn test_json_stage_emits_one_document() {
        let records: Vec<TripDurationRecord> = [2400.0, 2500.0, 2600.0]
            .iter()
            .map(|&d| record("Bad", d))
            .chain([1900.0, 2000.0, 2100.0].iter().map(|&d| record("Good", d)))
            .collect();

        let stage = hypothesis_stage(&records, &HypothesisParams::default(), ReportFormat::Json);
        assert!(stage.outcome.is_ok());
        assert_eq!(stage.lines.len(), 1);
        let value: serde_json::Value = serde_json::from_str(&stage.lines[0]).unwrap();
        assert_eq!(value["bad"]["count"], 3);
    }

    #[test]
    fn test_insufficient_sample_still_reports_overview() {
        let records = vec![
            record("Bad", 100.0),
            record("Bad", -3.0),
            record("Good", 10.0),
            record("Good", 20.0),
            record("Good", 0.0),
        ];

        let stage = hypothesis_stage(&records, &HypothesisParams::default(), ReportFormat::Text);
        assert_eq!(
            stage.outcome,
            Err(HypothesisError::InsufficientSample { label: "Bad".to_string(), n: 1 })
        );

        let text = stage.lines.join("\n");
        assert!(text.contains("Share of Saturdays in the dataset: 1.000"), "{}", text);
        assert!(text.contains("Filtered duration_seconds > 0: 5 -> 3"));
        assert!(text.contains("n_Bad  : 1"));
        assert!(text.contains("n_Good : 2"));
        assert!(!text.contains("p-value"));
    }

    #[test]
    fn test_run_with_tiny_sample_fails_after_charts() {
        let dir = tempfile::tempdir().unwrap();
        write_datasets(
            dir.path(),
            "start_ts,weather_conditions,duration_seconds\n\
2017-11-25 10:00:00,Bad,1200\n\
2017-11-25 11:00:00,Good,900\n\
2017-11-25 12:00:00,Good,1000\n",
        );

        let err = run_with(&config_for(dir.path(), ReportFormat::Text), &NoopCharts).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Hypothesis(HypothesisError::InsufficientSample { n: 1, .. })
        ));
    }

    #[test]
    fn test_strict_run_stops_at_dirty_row() {
        let dir = tempfile::tempdir().unwrap();
        write_datasets(
            dir.path(),
            "start_ts,weather_conditions,duration_seconds\nyesterday,Bad,1200\n",
        );
        let config = AnalysisConfig {
            strict: true,
            ..config_for(dir.path(), ReportFormat::Text)
        };

        let err = run_with(&config, &NoopCharts).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Clean(CleanError::Normalize(NormalizeError::StrictViolation { .. }))
        ));
    }
}
