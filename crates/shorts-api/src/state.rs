//! Application state.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use shorts_clients::{
    ClientsConfig, ElevenLabsVoice, GeminiNarrative, OpenAiImages, PublishPlatform, YouTubePublisher,
};
use shorts_media::FfmpegEncoder;
use shorts_models::{EncodingConfig, PipelineResult, ShortRequest};
use shorts_pipeline::{Capabilities, PipelineConfig, PipelineFailure, PipelineOrchestrator};

use crate::config::ApiConfig;

/// Something that turns a brief into a finished short.
#[async_trait]
pub trait ShortsPipeline: Send + Sync {
    async fn run(&self, request: &ShortRequest) -> Result<PipelineResult, PipelineFailure>;
}

#[async_trait]
impl ShortsPipeline for PipelineOrchestrator {
    async fn run(&self, request: &ShortRequest) -> Result<PipelineResult, PipelineFailure> {
        PipelineOrchestrator::run(self, request).await
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub pipeline: Arc<dyn ShortsPipeline>,
    /// Whether uploads can succeed; reported by the readiness probe.
    pub publishing_configured: bool,
}

impl AppState {
    /// Create application state with the production clients.
    pub fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let clients = ClientsConfig::from_env();
        let http = clients.http_client()?;

        let pipeline_config = PipelineConfig::from_env();
        std::fs::create_dir_all(&pipeline_config.work_dir)?;

        let publisher: Option<Arc<dyn PublishPlatform>> = if clients.youtube_configured() {
            Some(Arc::new(YouTubePublisher::new(&clients, http.clone())?))
        } else {
            warn!("YouTube credentials not set; uploads will be skipped");
            None
        };

        let encoder = FfmpegEncoder::new(EncodingConfig::default(), pipeline_config.work_dir.clone())
            .with_step_timeout(pipeline_config.call_timeout);

        let capabilities = Capabilities {
            narrative: Arc::new(GeminiNarrative::new(&clients, http.clone())?),
            visual: Arc::new(OpenAiImages::new(&clients, http.clone())?),
            voice: Arc::new(ElevenLabsVoice::new(&clients, http)?),
            encoder: Arc::new(encoder),
            publisher,
        };

        info!(
            deadline_secs = pipeline_config.deadline.as_secs(),
            max_parallel_beats = pipeline_config.max_parallel_beats,
            thumbnail_mode = ?pipeline_config.thumbnail_mode,
            "Pipeline configured"
        );

        let publishing_configured = capabilities.publisher.is_some();
        let orchestrator = PipelineOrchestrator::new(pipeline_config, capabilities)?;

        Ok(Self {
            config,
            pipeline: Arc::new(orchestrator),
            publishing_configured,
        })
    }

    /// State around an existing pipeline.
    pub fn with_pipeline(config: ApiConfig, pipeline: Arc<dyn ShortsPipeline>) -> Self {
        Self {
            config,
            pipeline,
            publishing_configured: false,
        }
    }
}
