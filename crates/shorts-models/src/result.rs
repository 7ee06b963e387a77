//! Final pipeline result.

use crate::artifact::{AssembledVideo, PublishResult, Thumbnail};
use crate::log::PipelineLogEntry;
use crate::plan::ContentPlan;

/// Everything a successful run produces. Built exactly once per run.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Plan as rendered (dropped beats removed, overrides applied)
    pub plan: ContentPlan,
    pub video: AssembledVideo,
    pub thumbnail: Thumbnail,
    pub total_duration: f64,
    /// `None` when publishing was not requested or failed
    pub publish: Option<PublishResult>,
    pub logs: Vec<PipelineLogEntry>,
}

impl PipelineResult {
    pub fn youtube_url(&self) -> Option<&str> {
        self.publish.as_ref().map(|p| p.url.as_str())
    }

    pub fn youtube_id(&self) -> Option<&str> {
        self.publish.as_ref().map(|p| p.video_id.as_str())
    }
}
