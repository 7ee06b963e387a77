//! Pipeline metrics.
//!
//! Recorded through the `metrics` facade; the API binary installs the
//! Prometheus recorder. Without a recorder these calls are no-ops.

use metrics::{counter, histogram};
use shorts_models::PipelineStep;

/// Metric names as constants for consistency.
pub mod names {
    pub const RUNS_TOTAL: &str = "shorts_pipeline_runs_total";
    pub const STAGE_DURATION_SECONDS: &str = "shorts_pipeline_stage_duration_seconds";
    pub const RUN_DURATION_SECONDS: &str = "shorts_pipeline_run_duration_seconds";
    pub const BEATS_FAILED_TOTAL: &str = "shorts_beats_failed_total";
    pub const ABSORBED_FAILURES_TOTAL: &str = "shorts_pipeline_absorbed_failures_total";
}

/// Record how long one stage took.
pub fn record_stage_duration(step: PipelineStep, duration_secs: f64) {
    let labels = [("stage", step.as_str().to_string())];
    histogram!(names::STAGE_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a finished run. `outcome` is "success" or an error kind.
pub fn record_run(outcome: &str, duration_secs: f64) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::RUNS_TOTAL, &labels).increment(1);
    histogram!(names::RUN_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record beats that failed generation.
pub fn record_beats_failed(count: usize) {
    counter!(names::BEATS_FAILED_TOTAL).increment(count as u64);
}

/// Record a thumbnail or publish failure that did not fail the run.
pub fn record_absorbed_failure(step: PipelineStep) {
    let labels = [("stage", step.as_str().to_string())];
    counter!(names::ABSORBED_FAILURES_TOTAL, &labels).increment(1);
}
