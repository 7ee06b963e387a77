//! Per-beat media generation.

use std::sync::Arc;

use tracing::debug;

use shorts_clients::{VisualService, VoiceService};
use shorts_models::{BeatMedia, PlanBeat};

use crate::error::{PipelineError, StageResult};
use crate::retry::{retry_async, RetryConfig, RetryResult};

/// Appended to every beat's visual prompt.
const FRAMING_HINT: &str = "Vertical 9:16 composition, subject centered, no text or captions.";

/// Produces the visual and narration for one beat.
pub struct BeatMediaGenerator {
    visual: Arc<dyn VisualService>,
    voice: Arc<dyn VoiceService>,
    visual_retry: RetryConfig,
    voice_retry: RetryConfig,
}

impl BeatMediaGenerator {
    pub fn new(visual: Arc<dyn VisualService>, voice: Arc<dyn VoiceService>, retry: RetryConfig) -> Self {
        let visual_retry = RetryConfig {
            operation_name: "visual",
            ..retry.clone()
        };
        let voice_retry = RetryConfig {
            operation_name: "narration",
            ..retry
        };
        Self {
            visual,
            voice,
            visual_retry,
            voice_retry,
        }
    }

    /// Generate both assets concurrently. Either sub-call failing after its
    /// retries fails the beat.
    pub async fn generate_beat_media(&self, beat: &PlanBeat) -> StageResult<BeatMedia> {
        let prompt = visual_prompt(beat);

        let (visual, narration) = tokio::join!(
            retry_async(&self.visual_retry, || self.visual.generate_visual(&prompt)),
            retry_async(&self.voice_retry, || self.voice.synthesize(&beat.narration)),
        );

        let visual = match visual {
            RetryResult::Success(v) => v,
            RetryResult::Failed { error, attempts } => {
                return Err(PipelineError::beat(
                    &beat.id,
                    format!("visual: {error} (after {attempts} attempt(s))"),
                ));
            }
        };
        let narration = match narration {
            RetryResult::Success(n) => n,
            RetryResult::Failed { error, attempts } => {
                return Err(PipelineError::beat(
                    &beat.id,
                    format!("narration: {error} (after {attempts} attempt(s))"),
                ));
            }
        };

        if !(narration.duration_seconds.is_finite() && narration.duration_seconds > 0.0) {
            return Err(PipelineError::beat(
                &beat.id,
                format!("narration has non-positive duration {}", narration.duration_seconds),
            ));
        }

        debug!(
            beat_id = %beat.id,
            planned = beat.duration_seconds,
            measured = narration.duration_seconds,
            "Beat media ready"
        );

        Ok(BeatMedia {
            beat_id: beat.id.clone(),
            visual,
            narration,
        })
    }
}

fn visual_prompt(beat: &PlanBeat) -> String {
    format!("{} {}", beat.visual_prompt.trim(), FRAMING_HINT)
}
