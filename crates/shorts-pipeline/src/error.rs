//! Pipeline error taxonomy.

use thiserror::Error;

use shorts_models::{BeatId, PipelineLogEntry};

pub type StageResult<T> = Result<T, PipelineError>;

/// Failure of one pipeline stage.
///
/// Whether a failure ends the run is a property of its kind, see
/// [`PipelineError::is_fatal`]. Individual beat failures are decided by the
/// orchestrator's drop policy and escalate to `TooManyBeatFailures`.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    #[error("Planning failed: {0}")]
    Planning(String),

    #[error("Beat {beat_id} failed: {message}")]
    BeatGeneration { beat_id: BeatId, message: String },

    #[error("Beat generation failed: {failed} of {total} beats failed")]
    TooManyBeatFailures { failed: usize, total: usize },

    #[error("Assembly failed: {0}")]
    Assembly(String),

    #[error("Thumbnail failed: {0}")]
    Thumbnail(String),

    #[error("Publishing failed: {0}")]
    Publish(String),

    #[error("Pipeline timed out after {0} seconds")]
    Timeout(u64),
}

impl PipelineError {
    pub fn planning(message: impl Into<String>) -> Self {
        Self::Planning(message.into())
    }

    pub fn beat(beat_id: &BeatId, message: impl Into<String>) -> Self {
        Self::BeatGeneration {
            beat_id: beat_id.clone(),
            message: message.into(),
        }
    }

    pub fn assembly(message: impl Into<String>) -> Self {
        Self::Assembly(message.into())
    }

    pub fn thumbnail(message: impl Into<String>) -> Self {
        Self::Thumbnail(message.into())
    }

    pub fn publish(message: impl Into<String>) -> Self {
        Self::Publish(message.into())
    }

    /// Whether this failure ends the run without a result.
    pub fn is_fatal(&self) -> bool {
        match self {
            PipelineError::Planning(_)
            | PipelineError::TooManyBeatFailures { .. }
            | PipelineError::Assembly(_)
            | PipelineError::Timeout(_) => true,
            PipelineError::BeatGeneration { .. } | PipelineError::Thumbnail(_) | PipelineError::Publish(_) => false,
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Planning(_) => "planning",
            PipelineError::BeatGeneration { .. } | PipelineError::TooManyBeatFailures { .. } => "beat_generation",
            PipelineError::Assembly(_) => "assembly",
            PipelineError::Thumbnail(_) => "thumbnail",
            PipelineError::Publish(_) => "publish",
            PipelineError::Timeout(_) => "timeout",
        }
    }
}

/// A run that ended without a result, with everything logged up to the
/// failure.
#[derive(Debug, Clone, Error)]
#[error("{error}")]
pub struct PipelineFailure {
    pub error: PipelineError,
    pub logs: Vec<PipelineLogEntry>,
}
