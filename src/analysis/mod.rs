/// Statistical analysis for the trip analysis service.
///
/// Submodules:
/// - `describe`: count/mean/std/quartile summaries of a numeric sample.
/// - `welch`: Welch's unequal-variance two-sample t-test.
/// - `hypothesis`: the Bad vs. Good weather trip-duration test built on both.

pub mod describe;
pub mod hypothesis;
pub mod welch;
