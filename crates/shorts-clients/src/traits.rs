//! Capability contracts consumed by the pipeline.
//!
//! Each trait is one external capability. The pipeline only sees these,
//! so tests can substitute in-memory fakes for the HTTP clients.

use async_trait::async_trait;

use shorts_models::{AssembledVideo, ContentPlan, NarrationAudio, PublishResult, Thumbnail, VisualAsset};

use crate::error::ClientResult;

/// Brief handed to the narrative service.
#[derive(Debug, Clone)]
pub struct PlanBrief {
    pub topic: String,
    pub tone: String,
    pub audience: String,
    pub cta: Option<String>,
    pub duration_seconds: f64,
    pub min_beats: usize,
    pub max_beats: usize,
}

/// Metadata attached to an upload.
#[derive(Debug, Clone)]
pub struct PublishMetadata {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

impl PublishMetadata {
    pub fn from_plan(plan: &ContentPlan) -> Self {
        Self {
            title: plan.title.clone(),
            description: plan.description.clone(),
            tags: plan.tags.clone(),
        }
    }
}

/// Brief to draft plan. The draft is unvalidated.
#[async_trait]
pub trait NarrativeService: Send + Sync {
    async fn draft_plan(&self, brief: &PlanBrief) -> ClientResult<ContentPlan>;
}

/// Prompt to image or clip.
#[async_trait]
pub trait VisualService: Send + Sync {
    async fn generate_visual(&self, prompt: &str) -> ClientResult<VisualAsset>;
}

/// Text to narration audio with its measured duration.
#[async_trait]
pub trait VoiceService: Send + Sync {
    async fn synthesize(&self, text: &str) -> ClientResult<NarrationAudio>;
}

/// Upload of a finished video.
#[async_trait]
pub trait PublishPlatform: Send + Sync {
    async fn publish(
        &self,
        video: &AssembledVideo,
        thumbnail: &Thumbnail,
        metadata: &PublishMetadata,
    ) -> ClientResult<PublishResult>;
}
