//! Summary charts for the company and dropoff tables.
//!
//! Two PNG files are written to the output folder:
//! - `plot_01_company_trips.png`: trips per company, tallest bar first.
//! - `plot_04_top10_dropoffs.png`: the ten neighborhoods with the most
//!   average dropoffs, drawn as horizontal bars with the largest on top.
//!
//! Ordering and selection live in plain functions so they can be tested
//! without a font stack; the `render_*` functions only draw.

use crate::logging::{self, Stage};
use crate::model::{CompanyTrips, DropoffAverage};
use plotters::prelude::*;
use plotters::style::FontTransform;
use std::fmt;
use std::path::{Path, PathBuf};

pub const COMPANY_CHART_FILE: &str = "plot_01_company_trips.png";
pub const DROPOFF_CHART_FILE: &str = "plot_04_top10_dropoffs.png";

/// Number of neighborhoods shown in the dropoff chart.
pub const TOP_N_DROPOFFS: usize = 10;

const FONT: &str = "sans-serif";

#[derive(Debug, Clone, PartialEq)]
pub struct PlotError(pub String);

impl fmt::Display for PlotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Chart rendering failed: {}", self.0)
    }
}

impl std::error::Error for PlotError {}

fn plot_err<E: fmt::Display>(e: E) -> PlotError {
    PlotError(e.to_string())
}

// ---------------------------------------------------------------------------
// Data shaping
// ---------------------------------------------------------------------------

/// Companies ordered by trip count, largest first. Ties keep input order.
pub fn companies_by_trips_desc(rows: &[CompanyTrips]) -> Vec<&CompanyTrips> {
    let mut sorted: Vec<&CompanyTrips> = rows.iter().collect();
    sorted.sort_by(|a, b| b.trips_amount.total_cmp(&a.trips_amount));
    sorted
}

/// The `n` rows with the highest `average_trips`, largest first.
pub fn top_dropoffs(rows: &[DropoffAverage], n: usize) -> Vec<DropoffAverage> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| b.average_trips.total_cmp(&a.average_trips));
    sorted.truncate(n);
    sorted
}

/// Ascending order for a horizontal bar chart: the first bar is drawn at the
/// bottom, so the largest value ends up on top.
pub fn ascending_for_display(top: &[DropoffAverage]) -> Vec<&DropoffAverage> {
    let mut sorted: Vec<&DropoffAverage> = top.iter().collect();
    sorted.sort_by(|a, b| a.average_trips.total_cmp(&b.average_trips));
    sorted
}

/// Upper bound of the value axis with a little headroom above the tallest bar.
fn axis_upper(max_value: f64) -> f64 {
    if max_value > 0.0 { max_value * 1.05 } else { 1.0 }
}

fn label_at(labels: &[String], seg: &SegmentValue<u32>) -> String {
    match seg {
        SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
            labels.get(*i as usize).cloned().unwrap_or_default()
        }
        SegmentValue::Last => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Draw trips per company as vertical bars and save the PNG.
pub fn render_company_chart(rows: &[CompanyTrips], out_dir: &Path) -> Result<PathBuf, PlotError> {
    let path = out_dir.join(COMPANY_CHART_FILE);
    let sorted = companies_by_trips_desc(rows);
    let labels: Vec<String> = sorted.iter().map(|r| r.company_name.clone()).collect();
    let max_value = sorted.first().map(|r| r.trips_amount).unwrap_or(0.0);
    let n = sorted.len() as u32;

    {
        let root = BitMapBackend::new(&path, (2400, 1200)).into_drawing_area();
        root.fill(&WHITE).map_err(plot_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Trips per taxi company", (FONT, 40))
            .margin(20)
            .x_label_area_size(420)
            .y_label_area_size(120)
            .build_cartesian_2d((0u32..n.max(1)).into_segmented(), 0f64..axis_upper(max_value))
            .map_err(plot_err)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(labels.len().max(1))
            .x_label_formatter(&|seg| label_at(&labels, seg))
            .x_label_style((FONT, 16).into_font().transform(FontTransform::Rotate90))
            .y_desc("Number of trips (15-16 Nov 2017)")
            .draw()
            .map_err(plot_err)?;

        chart
            .draw_series(
                Histogram::vertical(&chart)
                    .style(BLUE.filled())
                    .margin(2)
                    .data(sorted.iter().enumerate().map(|(i, r)| (i as u32, r.trips_amount))),
            )
            .map_err(plot_err)?;

        root.present().map_err(plot_err)?;
    }

    logging::info(Stage::Plot, None, &format!("Chart saved: {}", path.display()));
    Ok(path)
}

/// Draw the top neighborhoods by average dropoffs as horizontal bars, save
/// the PNG, and return the selected rows (largest first) for reporting.
pub fn render_top_dropoffs_chart(
    rows: &[DropoffAverage],
    out_dir: &Path,
) -> Result<(PathBuf, Vec<DropoffAverage>), PlotError> {
    let path = out_dir.join(DROPOFF_CHART_FILE);
    let top = top_dropoffs(rows, TOP_N_DROPOFFS);
    let display = ascending_for_display(&top);
    let labels: Vec<String> = display.iter().map(|r| r.dropoff_location_name.clone()).collect();
    let max_value = top.first().map(|r| r.average_trips).unwrap_or(0.0);
    let n = display.len() as u32;

    {
        let root = BitMapBackend::new(&path, (2000, 1200)).into_drawing_area();
        root.fill(&WHITE).map_err(plot_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Top 10 neighborhoods by trip dropoffs", (FONT, 40))
            .margin(20)
            .x_label_area_size(80)
            .y_label_area_size(360)
            .build_cartesian_2d(0f64..axis_upper(max_value), (0u32..n.max(1)).into_segmented())
            .map_err(plot_err)?;

        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(labels.len().max(1))
            .y_label_formatter(&|seg| label_at(&labels, seg))
            .y_label_style((FONT, 18))
            .x_desc("Average trips (Nov 2017)")
            .draw()
            .map_err(plot_err)?;

        chart
            .draw_series(
                Histogram::horizontal(&chart)
                    .style(BLUE.filled())
                    .margin(4)
                    .data(display.iter().enumerate().map(|(i, r)| (i as u32, r.average_trips))),
            )
            .map_err(plot_err)?;

        root.present().map_err(plot_err)?;
    }

    logging::info(Stage::Plot, None, &format!("Chart saved: {}", path.display()));
    Ok((path, top))
}
