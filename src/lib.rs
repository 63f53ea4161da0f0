//! Exploratory analysis of Chicago taxi trip data.
//!
//! Loads three CSV extracts (trips per company, average dropoffs per
//! neighborhood, and per-trip duration with weather), cleans their column
//! types, draws two summary charts, and tests whether trip duration differs
//! between bad and good weather with Welch's t-test.

pub mod analysis;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod plots;
pub mod report;
