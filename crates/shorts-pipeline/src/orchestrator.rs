//! Pipeline orchestration.
//!
//! Planning -> Generating -> Assembling (with the thumbnail alongside in
//! `Generated` mode) -> Publishing (optional) -> Done. The whole run sits
//! under one deadline; when it fires the run future is dropped, which
//! aborts beat tasks and kills any running FFmpeg child.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{warn, Instrument};
use uuid::Uuid;

use shorts_clients::{NarrativeService, PublishPlatform, VisualService, VoiceService};
use shorts_media::VideoEncoder;
use shorts_models::{
    AssembledVideo, BeatId, BeatMedia, ContentPlan, PipelineResult, PipelineStep, PublishResult, ShortRequest,
    Thumbnail,
};

use crate::assembler::VideoAssembler;
use crate::beat_media::BeatMediaGenerator;
use crate::config::{PipelineConfig, ThumbnailMode};
use crate::error::{PipelineError, PipelineFailure, StageResult};
use crate::log::PipelineLog;
use crate::metrics;
use crate::planner::{PlanGenerator, PlanRules};
use crate::publisher::Publisher;
use crate::thumbnail::ThumbnailGenerator;

/// External capabilities a run depends on.
#[derive(Clone)]
pub struct Capabilities {
    pub narrative: Arc<dyn NarrativeService>,
    pub visual: Arc<dyn VisualService>,
    pub voice: Arc<dyn VoiceService>,
    pub encoder: Arc<dyn VideoEncoder>,
    /// Absent when no platform is configured; publish requests then fail
    /// softly.
    pub publisher: Option<Arc<dyn PublishPlatform>>,
}

/// Artifacts of a run that reached `Done`.
struct Completed {
    plan: ContentPlan,
    video: AssembledVideo,
    thumbnail: Thumbnail,
    publish: Option<PublishResult>,
}

pub struct PipelineOrchestrator {
    config: PipelineConfig,
    planner: PlanGenerator,
    beat_media: Arc<BeatMediaGenerator>,
    assembler: VideoAssembler,
    thumbnails: ThumbnailGenerator,
    publisher: Option<Publisher>,
}

impl PipelineOrchestrator {
    pub fn new(config: PipelineConfig, capabilities: Capabilities) -> StageResult<Self> {
        let planner = PlanGenerator::new(
            capabilities.narrative,
            PlanRules::from(&config),
            config.retry_config("narrative", config.beat_retries),
        );
        let beat_media = Arc::new(BeatMediaGenerator::new(
            Arc::clone(&capabilities.visual),
            capabilities.voice,
            config.retry_config("beat", config.beat_retries),
        ));
        let thumbnails = ThumbnailGenerator::new(
            capabilities.visual,
            config.thumbnail_mode,
            config.retry_config("thumbnail", config.beat_retries),
            config.work_dir.clone(),
            config.call_timeout,
        )?;
        let publisher = capabilities
            .publisher
            .map(|platform| Publisher::new(platform, config.retry_config("publish", config.publish_retries)));

        Ok(Self {
            planner,
            beat_media,
            assembler: VideoAssembler::new(capabilities.encoder),
            thumbnails,
            publisher,
            config,
        })
    }

    /// Run the whole pipeline once.
    ///
    /// Returns the fully populated result, or the fatal error together with
    /// every log entry written before it.
    pub async fn run(&self, request: &ShortRequest) -> Result<PipelineResult, PipelineFailure> {
        let log = PipelineLog::new(Uuid::new_v4().to_string());
        let span = log.span();
        let started = Instant::now();

        let outcome = tokio::time::timeout(self.config.deadline, self.execute(request, &log))
            .instrument(span.clone())
            .await
            .unwrap_or_else(|_| Err(PipelineError::Timeout(self.config.deadline.as_secs())));
        let elapsed = started.elapsed().as_secs_f64();

        match outcome {
            Ok(done) => {
                metrics::record_run("success", elapsed);
                Ok(PipelineResult {
                    total_duration: done.video.duration_seconds,
                    plan: done.plan,
                    video: done.video,
                    thumbnail: done.thumbnail,
                    publish: done.publish,
                    logs: log.snapshot(),
                })
            }
            Err(error) => {
                span.in_scope(|| log.error(PipelineStep::Failed, error.to_string()));
                metrics::record_run(error.kind(), elapsed);
                Err(PipelineFailure {
                    error,
                    logs: log.snapshot(),
                })
            }
        }
    }

    async fn execute(&self, request: &ShortRequest, log: &PipelineLog) -> StageResult<Completed> {
        // Planning
        let stage = Instant::now();
        log.info(
            PipelineStep::Planning,
            format!(
                "Planning a {:.0}s short about \"{}\"",
                request.duration_seconds,
                request.topic.trim()
            ),
        );
        let mut plan = self.planner.generate_plan(request, log).await?;
        metrics::record_stage_duration(PipelineStep::Planning, stage.elapsed().as_secs_f64());
        log.info(
            PipelineStep::Planning,
            format!(
                "Plan \"{}\" with {} beats ({:.1}s planned)",
                plan.title,
                plan.beats.len(),
                plan.planned_duration()
            ),
        );

        // Generating
        let stage = Instant::now();
        log.info(
            PipelineStep::Generating,
            format!(
                "Generating media for {} beats, up to {} at a time",
                plan.beats.len(),
                self.config.max_parallel_beats
            ),
        );
        let (media, failed) = self.generate_beats(&plan, log).await;
        metrics::record_stage_duration(PipelineStep::Generating, stage.elapsed().as_secs_f64());

        if !failed.is_empty() {
            metrics::record_beats_failed(failed.len());
            let total = plan.beats.len();
            if beat_failures_are_fatal(total, failed.len(), &self.config) {
                return Err(PipelineError::TooManyBeatFailures {
                    failed: failed.len(),
                    total,
                });
            }

            let dropped: Vec<String> = plan
                .beats
                .iter()
                .filter(|b| failed.contains(&b.id))
                .map(|b| b.id.to_string())
                .collect();
            plan.drop_beats(&failed);
            log.info(
                PipelineStep::Generating,
                format!(
                    "Dropped beat(s) {}; continuing with {} beats",
                    dropped.join(", "),
                    plan.beats.len()
                ),
            );
        }

        // Assembling, with the thumbnail alongside when it does not need the
        // video. An assembly error drops the pending thumbnail.
        let (video, thumbnail) = match self.thumbnails.mode() {
            ThumbnailMode::Generated => tokio::try_join!(
                self.assemble_stage(&plan, media, log),
                async { Ok::<_, PipelineError>(self.thumbnail_stage(&plan, None, log).await) },
            )?,
            ThumbnailMode::VideoFrame => {
                let video = self.assemble_stage(&plan, media, log).await?;
                let thumbnail = self.thumbnail_stage(&plan, Some(&video), log).await;
                (video, thumbnail)
            }
        };

        // Publishing
        let publish = if request.upload_to_youtube {
            self.publish_stage(&video, &thumbnail, &plan, log).await
        } else {
            None
        };

        log.info(
            PipelineStep::Done,
            format!(
                "Short ready: {:.1}s across {} beats",
                video.duration_seconds,
                plan.beats.len()
            ),
        );

        Ok(Completed {
            plan,
            video,
            thumbnail,
            publish,
        })
    }

    /// Generate every beat under the concurrency limit. Returns the media
    /// buffer keyed by beat id and the ids of failed beats.
    async fn generate_beats(
        &self,
        plan: &ContentPlan,
        log: &PipelineLog,
    ) -> (HashMap<BeatId, BeatMedia>, HashSet<BeatId>) {
        let semaphore = Arc::new(Semaphore::new(self.config.max_parallel_beats.max(1)));
        let mut tasks = JoinSet::new();

        for beat in &plan.beats {
            let beat = beat.clone();
            let generator = Arc::clone(&self.beat_media);
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(
                async move {
                    let outcome = match semaphore.acquire_owned().await {
                        Ok(_permit) => generator.generate_beat_media(&beat).await,
                        Err(_) => Err(PipelineError::beat(&beat.id, "beat scheduler closed")),
                    };
                    (beat.id, outcome)
                }
                .in_current_span(),
            );
        }

        let mut buffer = HashMap::with_capacity(plan.beats.len());
        let mut failed = HashSet::new();

        while let Some(joined) = tasks.join_next().await {
            let (beat_id, outcome) = match joined {
                Ok(done) => done,
                Err(join_error) => {
                    // Its beat is caught by the sweep below
                    warn!(error = %join_error, "Beat task did not complete");
                    continue;
                }
            };

            match outcome {
                Ok(media) => {
                    log.info(
                        PipelineStep::Generating,
                        format!(
                            "Beat {} ready ({:.1}s narration)",
                            beat_id,
                            media.duration_seconds()
                        ),
                    );
                    // First write wins; the buffer is never overwritten
                    buffer.entry(beat_id).or_insert(media);
                }
                Err(e) => {
                    log.warn(PipelineStep::Generating, e.to_string());
                    failed.insert(beat_id);
                }
            }
        }

        for beat in &plan.beats {
            if !buffer.contains_key(&beat.id) && !failed.contains(&beat.id) {
                log.warn(
                    PipelineStep::Generating,
                    PipelineError::beat(&beat.id, "task aborted").to_string(),
                );
                failed.insert(beat.id.clone());
            }
        }

        (buffer, failed)
    }

    async fn assemble_stage(
        &self,
        plan: &ContentPlan,
        media: HashMap<BeatId, BeatMedia>,
        log: &PipelineLog,
    ) -> StageResult<AssembledVideo> {
        let stage = Instant::now();
        log.info(
            PipelineStep::Assembling,
            format!("Assembling {} segments", plan.beats.len()),
        );

        let video = self.assembler.assemble(plan, media).await?;

        metrics::record_stage_duration(PipelineStep::Assembling, stage.elapsed().as_secs_f64());
        log.info(
            PipelineStep::Assembling,
            format!(
                "Assembled {:.1}s video ({} bytes)",
                video.duration_seconds,
                video.data.len()
            ),
        );
        Ok(video)
    }

    /// Never fails: errors are logged once and replaced by the placeholder.
    async fn thumbnail_stage(
        &self,
        plan: &ContentPlan,
        video: Option<&AssembledVideo>,
        log: &PipelineLog,
    ) -> Thumbnail {
        let stage = Instant::now();
        log.info(
            PipelineStep::Thumbnail,
            match self.thumbnails.mode() {
                ThumbnailMode::Generated => "Generating thumbnail",
                ThumbnailMode::VideoFrame => "Extracting thumbnail frame",
            },
        );

        let thumbnail = match self.thumbnails.generate_thumbnail(plan, video).await {
            Ok(thumbnail) => {
                log.info(PipelineStep::Thumbnail, "Thumbnail ready");
                thumbnail
            }
            Err(e) => {
                log.warn(PipelineStep::Thumbnail, format!("{e}; using placeholder"));
                metrics::record_absorbed_failure(PipelineStep::Thumbnail);
                self.thumbnails.fallback()
            }
        };

        metrics::record_stage_duration(PipelineStep::Thumbnail, stage.elapsed().as_secs_f64());
        thumbnail
    }

    /// Never fails: errors are logged once and the publish fields stay empty.
    async fn publish_stage(
        &self,
        video: &AssembledVideo,
        thumbnail: &Thumbnail,
        plan: &ContentPlan,
        log: &PipelineLog,
    ) -> Option<PublishResult> {
        let Some(publisher) = &self.publisher else {
            log.warn(
                PipelineStep::Publishing,
                PipelineError::publish("no publishing platform configured").to_string(),
            );
            metrics::record_absorbed_failure(PipelineStep::Publishing);
            return None;
        };

        let stage = Instant::now();
        log.info(PipelineStep::Publishing, "Uploading to YouTube");

        let result = match publisher.publish(video, thumbnail, plan).await {
            Ok(result) => {
                log.info(PipelineStep::Publishing, format!("Published {}", result.url));
                Some(result)
            }
            Err(e) => {
                log.warn(PipelineStep::Publishing, e.to_string());
                metrics::record_absorbed_failure(PipelineStep::Publishing);
                None
            }
        };

        metrics::record_stage_duration(PipelineStep::Publishing, stage.elapsed().as_secs_f64());
        result
    }
}

/// Whether `failed` of `total` beats ends the run.
///
/// Short plans tolerate no failures; longer plans drop failed beats until
/// the failed fraction reaches the configured limit.
pub fn beat_failures_are_fatal(total: usize, failed: usize, config: &PipelineConfig) -> bool {
    if failed == 0 {
        return false;
    }
    if failed >= total || total <= config.strict_beat_count {
        return true;
    }
    failed as f64 / total as f64 >= config.max_failed_beat_fraction
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_plans_tolerate_no_failures() {
        let config = PipelineConfig::default();
        assert!(!beat_failures_are_fatal(3, 0, &config));
        assert!(beat_failures_are_fatal(3, 1, &config));
    }

    #[test]
    fn test_fraction_threshold() {
        let config = PipelineConfig::default();
        // 1 of 5 = 0.2 < 0.3: drop
        assert!(!beat_failures_are_fatal(5, 1, &config));
        // 2 of 5 = 0.4: fatal
        assert!(beat_failures_are_fatal(5, 2, &config));
        // 3 of 10 = 0.3: fatal at the threshold
        assert!(beat_failures_are_fatal(10, 3, &config));
        assert!(!beat_failures_are_fatal(10, 2, &config));
    }

    #[test]
    fn test_all_failed_is_fatal() {
        let config = PipelineConfig {
            strict_beat_count: 0,
            max_failed_beat_fraction: 2.0,
            ..Default::default()
        };
        assert!(beat_failures_are_fatal(4, 4, &config));
        assert!(!beat_failures_are_fatal(4, 3, &config));
    }
}
