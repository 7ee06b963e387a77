//! Thumbnail generation.

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tracing::debug;

use shorts_clients::VisualService;
use shorts_media::{extract_frame_jpeg, normalize_to_jpeg, placeholder_thumbnail};
use shorts_models::{AssembledVideo, ContentPlan, Thumbnail, VisualAsset};

use crate::config::ThumbnailMode;
use crate::error::{PipelineError, StageResult};
use crate::retry::{retry_async, RetryConfig, RetryResult};

pub struct ThumbnailGenerator {
    visual: Arc<dyn VisualService>,
    mode: ThumbnailMode,
    retry: RetryConfig,
    work_dir: PathBuf,
    frame_timeout: Duration,
    placeholder: &'static [u8],
}

impl ThumbnailGenerator {
    pub fn new(
        visual: Arc<dyn VisualService>,
        mode: ThumbnailMode,
        retry: RetryConfig,
        work_dir: impl Into<PathBuf>,
        frame_timeout: Duration,
    ) -> StageResult<Self> {
        Ok(Self {
            visual,
            mode,
            retry,
            work_dir: work_dir.into(),
            frame_timeout,
            placeholder: placeholder_jpeg()?,
        })
    }

    pub fn mode(&self) -> ThumbnailMode {
        self.mode
    }

    /// Produce a JPEG thumbnail. `VideoFrame` mode needs `video`; without
    /// it this is a thumbnail failure.
    pub async fn generate_thumbnail(&self, plan: &ContentPlan, video: Option<&AssembledVideo>) -> StageResult<Thumbnail> {
        match (self.mode, video) {
            (ThumbnailMode::Generated, _) => self.from_plan(plan).await,
            (ThumbnailMode::VideoFrame, Some(video)) => self.from_video(video).await,
            (ThumbnailMode::VideoFrame, None) => Err(PipelineError::thumbnail("no video to take a frame from")),
        }
    }

    async fn from_plan(&self, plan: &ContentPlan) -> StageResult<Thumbnail> {
        let prompt = thumbnail_prompt(plan);
        let asset = match retry_async(&self.retry, || self.visual.generate_visual(&prompt)).await {
            RetryResult::Success(asset) => asset,
            RetryResult::Failed { error, .. } => return Err(PipelineError::thumbnail(error.to_string())),
        };

        let image = match asset {
            VisualAsset::Image { data, .. } => data,
            VisualAsset::Clip { .. } => {
                return Err(PipelineError::thumbnail("visual service returned a clip, expected an image"));
            }
        };

        let jpeg = tokio::task::spawn_blocking(move || normalize_to_jpeg(&image))
            .await
            .map_err(|e| PipelineError::thumbnail(format!("normalize task failed: {e}")))?
            .map_err(|e| PipelineError::thumbnail(e.to_string()))?;

        debug!(bytes = jpeg.len(), "Generated thumbnail from plan");
        Ok(Thumbnail::jpeg(jpeg))
    }

    async fn from_video(&self, video: &AssembledVideo) -> StageResult<Thumbnail> {
        let jpeg = extract_frame_jpeg(&video.data, &self.work_dir, self.frame_timeout)
            .await
            .map_err(|e| PipelineError::thumbnail(e.to_string()))?;

        debug!(bytes = jpeg.len(), "Extracted thumbnail frame");
        Ok(Thumbnail::jpeg(jpeg))
    }

    /// Branded placeholder used when thumbnail generation fails.
    pub fn fallback(&self) -> Thumbnail {
        Thumbnail {
            is_fallback: true,
            ..Thumbnail::jpeg(self.placeholder.to_vec())
        }
    }
}

static PLACEHOLDER: OnceLock<Vec<u8>> = OnceLock::new();

/// Encode the placeholder once per process.
fn placeholder_jpeg() -> StageResult<&'static [u8]> {
    if let Some(bytes) = PLACEHOLDER.get() {
        return Ok(bytes);
    }
    let bytes = placeholder_thumbnail()
        .map_err(|e| PipelineError::thumbnail(format!("placeholder could not be encoded: {e}")))?;
    Ok(PLACEHOLDER.get_or_init(|| bytes))
}

fn thumbnail_prompt(plan: &ContentPlan) -> String {
    let scene = plan
        .beats
        .first()
        .map(|b| b.visual_prompt.trim())
        .unwrap_or_default();

    format!(
        "Eye-catching vertical 9:16 YouTube Shorts thumbnail for a video titled \"{}\". {} \
         Bold colors, high contrast, a single clear focal point, no text.",
        plan.title.trim(),
        scene
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use shorts_clients::{ClientError, ClientResult};
    use shorts_models::{BeatId, PlanBeat};

    fn plan() -> ContentPlan {
        ContentPlan {
            title: "Morning routines".to_string(),
            description: String::new(),
            tags: Vec::new(),
            beats: vec![PlanBeat {
                id: BeatId::from("b1"),
                hook: String::new(),
                narration: "n".to_string(),
                visual_prompt: "Sunrise over a quiet kitchen".to_string(),
                duration_seconds: 10.0,
            }],
        }
    }

    struct ClipOnly;

    #[async_trait]
    impl VisualService for ClipOnly {
        async fn generate_visual(&self, _prompt: &str) -> ClientResult<VisualAsset> {
            Ok(VisualAsset::Clip {
                data: vec![0; 8],
                mime: "video/mp4".to_string(),
            })
        }
    }

    struct Broken;

    #[async_trait]
    impl VisualService for Broken {
        async fn generate_visual(&self, _prompt: &str) -> ClientResult<VisualAsset> {
            Err(ClientError::invalid_response("visual", "nothing"))
        }
    }

    fn generator(visual: Arc<dyn VisualService>, mode: ThumbnailMode) -> ThumbnailGenerator {
        ThumbnailGenerator::new(
            visual,
            mode,
            RetryConfig::new("thumbnail").with_max_retries(0),
            std::env::temp_dir(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_prompt_uses_title_and_first_scene() {
        let prompt = thumbnail_prompt(&plan());
        assert!(prompt.contains("\"Morning routines\""));
        assert!(prompt.contains("Sunrise over a quiet kitchen"));
    }

    #[tokio::test]
    async fn test_service_failure_is_thumbnail_failure() {
        let err = generator(Arc::new(Broken), ThumbnailMode::Generated)
            .generate_thumbnail(&plan(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Thumbnail(_)));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn test_clip_is_rejected() {
        let result = generator(Arc::new(ClipOnly), ThumbnailMode::Generated)
            .generate_thumbnail(&plan(), None)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_frame_mode_needs_video() {
        let err = generator(Arc::new(Broken), ThumbnailMode::VideoFrame)
            .generate_thumbnail(&plan(), None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no video"));
    }

    #[test]
    fn test_fallback_is_flagged_jpeg() {
        let thumb = generator(Arc::new(Broken), ThumbnailMode::Generated).fallback();
        assert!(thumb.is_fallback);
        assert_eq!(thumb.mime, "image/jpeg");
        assert_eq!(&thumb.data[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_fallback_is_never_empty_and_stable() {
        let first = generator(Arc::new(Broken), ThumbnailMode::Generated).fallback();
        let second = generator(Arc::new(ClipOnly), ThumbnailMode::VideoFrame).fallback();
        assert!(!first.data.is_empty());
        assert_eq!(first.data, second.data);
        assert!(std::ptr::eq(placeholder_jpeg().unwrap(), placeholder_jpeg().unwrap()));
    }
}
