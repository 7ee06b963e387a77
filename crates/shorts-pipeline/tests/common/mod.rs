//! In-memory fakes for pipeline tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use image::{ImageBuffer, ImageOutputFormat, Rgb};

use shorts_clients::{
    ClientError, ClientResult, NarrativeService, PlanBrief, PublishMetadata, PublishPlatform, VisualService,
    VoiceService,
};
use shorts_media::{EncodedVideo, MediaError, MediaResult, VideoEncoder};
use shorts_models::{
    AssembledVideo, BeatId, BeatMedia, ContainerDescriptor, ContentPlan, NarrationAudio, PlanBeat, PublishResult,
    Thumbnail, VisualAsset,
};
use shorts_pipeline::{Capabilities, PipelineConfig};

/// A full-size vertical PNG, built once.
pub fn vertical_png() -> Vec<u8> {
    static PNG: OnceLock<Vec<u8>> = OnceLock::new();
    PNG.get_or_init(|| {
        let img = ImageBuffer::from_pixel(1080, 1920, Rgb([40u8, 90, 160]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageOutputFormat::Png).unwrap();
        out.into_inner()
    })
    .clone()
}

pub fn beat(id: &str, duration: f64) -> PlanBeat {
    PlanBeat {
        id: BeatId::from(id),
        hook: format!("hook {id}"),
        narration: format!("narration {id}"),
        visual_prompt: format!("scene {id}"),
        duration_seconds: duration,
    }
}

pub fn plan(durations: &[f64]) -> ContentPlan {
    ContentPlan {
        title: "Morning routines that stick".to_string(),
        description: "Three habits for a better morning".to_string(),
        tags: vec!["morning".to_string(), "habits".to_string()],
        beats: durations
            .iter()
            .enumerate()
            .map(|(i, d)| beat(&format!("b{}", i + 1), *d))
            .collect(),
    }
}

/// Config with fast retries.
pub fn test_config() -> PipelineConfig {
    PipelineConfig {
        retry_base_delay: Duration::from_millis(1),
        ..Default::default()
    }
}

pub struct FakeNarrative {
    plan: Option<ContentPlan>,
}

impl FakeNarrative {
    pub fn returning(plan: ContentPlan) -> Self {
        Self { plan: Some(plan) }
    }

    pub fn failing() -> Self {
        Self { plan: None }
    }
}

#[async_trait]
impl NarrativeService for FakeNarrative {
    async fn draft_plan(&self, _brief: &PlanBrief) -> ClientResult<ContentPlan> {
        self.plan.clone().ok_or_else(|| ClientError::Rejected {
            service: "narrative",
            status: 400,
            message: "safety block".to_string(),
        })
    }
}

/// Fails any prompt containing one of `failing`; stalls on `slow` ones.
#[derive(Default)]
pub struct FakeVisual {
    failing: Vec<String>,
    slow: Vec<(String, Duration)>,
}

impl FakeVisual {
    pub fn failing_on(needles: &[&str]) -> Self {
        Self {
            failing: needles.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn with_delay_on(mut self, needle: &str, delay: Duration) -> Self {
        self.slow.push((needle.to_string(), delay));
        self
    }
}

#[async_trait]
impl VisualService for FakeVisual {
    async fn generate_visual(&self, prompt: &str) -> ClientResult<VisualAsset> {
        if let Some((_, delay)) = self.slow.iter().find(|(needle, _)| prompt.contains(needle.as_str())) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.iter().any(|needle| prompt.contains(needle.as_str())) {
            return Err(ClientError::Rejected {
                service: "visual",
                status: 400,
                message: "content policy".to_string(),
            });
        }
        Ok(VisualAsset::Image {
            data: vertical_png(),
            mime: "image/png".to_string(),
        })
    }
}

/// Narration keyed by text: measured duration and artificial latency.
#[derive(Default)]
pub struct FakeVoice {
    durations: HashMap<String, f64>,
    delays: HashMap<String, Duration>,
    active: AtomicUsize,
    pub max_active: AtomicUsize,
}

impl FakeVoice {
    /// Measured duration for beat `id`'s narration.
    pub fn with_duration(mut self, id: &str, seconds: f64) -> Self {
        self.durations.insert(format!("narration {id}"), seconds);
        self
    }

    pub fn with_delay(mut self, id: &str, delay: Duration) -> Self {
        self.delays.insert(format!("narration {id}"), delay);
        self
    }

    /// Same latency for every beat.
    pub fn with_uniform_delay(mut self, ids: &[&str], delay: Duration) -> Self {
        for id in ids {
            self.delays.insert(format!("narration {id}"), delay);
        }
        self
    }
}

#[async_trait]
impl VoiceService for FakeVoice {
    async fn synthesize(&self, text: &str) -> ClientResult<NarrationAudio> {
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(text) {
            tokio::time::sleep(*delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        Ok(NarrationAudio {
            data: vec![0; 8],
            mime: "audio/mpeg".to_string(),
            duration_seconds: self.durations.get(text).copied().unwrap_or(8.0),
        })
    }
}

#[derive(Default)]
pub struct FakeEncoder {
    fail: bool,
    pub order: Mutex<Vec<BeatId>>,
    pub durations: Mutex<Vec<f64>>,
}

impl FakeEncoder {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }
}

#[async_trait]
impl VideoEncoder for FakeEncoder {
    async fn encode(&self, segments: Vec<BeatMedia>) -> MediaResult<EncodedVideo> {
        let mut order = self.order.lock().unwrap();
        let mut durations = self.durations.lock().unwrap();
        for segment in &segments {
            order.push(segment.beat_id.clone());
            durations.push(segment.duration_seconds());
        }
        if self.fail {
            return Err(MediaError::internal("muxer crashed"));
        }
        Ok(EncodedVideo {
            data: vec![0; 64],
            container: ContainerDescriptor::default(),
        })
    }
}

#[derive(Default)]
pub struct FakePublisher {
    fail: bool,
    pub calls: AtomicUsize,
    pub titles: Mutex<Vec<String>>,
}

impl FakePublisher {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }
}

#[async_trait]
impl PublishPlatform for FakePublisher {
    async fn publish(
        &self,
        _video: &AssembledVideo,
        _thumbnail: &Thumbnail,
        metadata: &PublishMetadata,
    ) -> ClientResult<PublishResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.titles.lock().unwrap().push(metadata.title.clone());
        if self.fail {
            return Err(ClientError::Rejected {
                service: "youtube",
                status: 403,
                message: "quotaExceeded".to_string(),
            });
        }
        Ok(PublishResult {
            video_id: "dQw4w9WgXcQ".to_string(),
            url: "https://www.youtube.com/shorts/dQw4w9WgXcQ".to_string(),
        })
    }
}

/// Fakes wired together; keep the handles to inspect calls afterwards.
pub struct Harness {
    pub narrative: Arc<FakeNarrative>,
    pub visual: Arc<FakeVisual>,
    pub voice: Arc<FakeVoice>,
    pub encoder: Arc<FakeEncoder>,
    pub publisher: Option<Arc<FakePublisher>>,
}

impl Harness {
    pub fn new(narrative: FakeNarrative, visual: FakeVisual, voice: FakeVoice) -> Self {
        Self {
            narrative: Arc::new(narrative),
            visual: Arc::new(visual),
            voice: Arc::new(voice),
            encoder: Arc::new(FakeEncoder::default()),
            publisher: None,
        }
    }

    pub fn with_publisher(mut self, publisher: FakePublisher) -> Self {
        self.publisher = Some(Arc::new(publisher));
        self
    }

    pub fn with_encoder(mut self, encoder: FakeEncoder) -> Self {
        self.encoder = Arc::new(encoder);
        self
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            narrative: self.narrative.clone(),
            visual: self.visual.clone(),
            voice: self.voice.clone(),
            encoder: self.encoder.clone(),
            publisher: self
                .publisher
                .clone()
                .map(|p| p as Arc<dyn PublishPlatform>),
        }
    }

    pub fn encoded_order(&self) -> Vec<String> {
        self.encoder
            .order
            .lock()
            .unwrap()
            .iter()
            .map(|id| id.to_string())
            .collect()
    }
}
