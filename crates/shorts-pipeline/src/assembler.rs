//! Video assembly in plan order.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use shorts_media::VideoEncoder;
use shorts_models::{AssembledVideo, BeatId, BeatMedia, ContentPlan};

use crate::error::{PipelineError, StageResult};

pub struct VideoAssembler {
    encoder: Arc<dyn VideoEncoder>,
}

impl VideoAssembler {
    pub fn new(encoder: Arc<dyn VideoEncoder>) -> Self {
        Self { encoder }
    }

    /// Encode every beat of `plan` in plan order. Each segment lasts its
    /// measured narration duration; the total is their exact sum.
    pub async fn assemble(&self, plan: &ContentPlan, media: HashMap<BeatId, BeatMedia>) -> StageResult<AssembledVideo> {
        let segments = order_segments(plan, media)?;
        let total: f64 = segments.iter().map(BeatMedia::duration_seconds).sum();

        let encoded = self
            .encoder
            .encode(segments)
            .await
            .map_err(|e| PipelineError::assembly(e.to_string()))?;

        if encoded.data.is_empty() {
            return Err(PipelineError::assembly("encoder returned an empty video"));
        }

        info!(
            segments = plan.beats.len(),
            duration = total,
            bytes = encoded.data.len(),
            "Assembled video"
        );

        Ok(AssembledVideo {
            data: encoded.data,
            duration_seconds: total,
            container: encoded.container,
        })
    }
}

/// Materialize the id-keyed buffer in plan order.
pub fn order_segments(plan: &ContentPlan, mut media: HashMap<BeatId, BeatMedia>) -> StageResult<Vec<BeatMedia>> {
    if plan.beats.is_empty() {
        return Err(PipelineError::assembly("plan has no beats to assemble"));
    }

    let mut ordered = Vec::with_capacity(plan.beats.len());
    for beat in &plan.beats {
        let segment = media
            .remove(&beat.id)
            .ok_or_else(|| PipelineError::assembly(format!("missing media for beat {}", beat.id)))?;
        ordered.push(segment);
    }

    if let Some(unknown) = media.keys().min() {
        return Err(PipelineError::assembly(format!("media for unknown beat {unknown}")));
    }

    Ok(ordered)
}
