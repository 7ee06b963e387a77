//! Segment rendering and concatenation.
//!
//! Each beat becomes one intermediate MP4 whose length is the beat's
//! measured narration duration. Still images are held for the whole
//! segment, clips are looped and trimmed. All intermediates share codec
//! parameters, so the final join is a stream copy through the concat
//! demuxer.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info, trace};

use shorts_models::{BeatMedia, ContainerDescriptor, EncodingConfig};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Encoded output of a `VideoEncoder`.
#[derive(Debug, Clone)]
pub struct EncodedVideo {
    pub data: Vec<u8>,
    pub container: ContainerDescriptor,
}

/// Capability that turns ordered beat media into one video container.
#[async_trait]
pub trait VideoEncoder: Send + Sync {
    /// Encode `segments` in the given order. Each segment lasts exactly its
    /// narration's measured duration.
    async fn encode(&self, segments: Vec<BeatMedia>) -> MediaResult<EncodedVideo>;
}

/// FFmpeg-backed encoder.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    encoding: EncodingConfig,
    /// Parent for per-run temporary directories
    work_dir: PathBuf,
    /// Timeout for each FFmpeg invocation
    step_timeout: Duration,
    /// Segments rendered concurrently
    max_parallel: usize,
}

impl FfmpegEncoder {
    pub fn new(encoding: EncodingConfig, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            encoding,
            work_dir: work_dir.into(),
            step_timeout: Duration::from_secs(120),
            max_parallel: 2,
        }
    }

    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = timeout;
        self
    }

    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    fn container(&self) -> ContainerDescriptor {
        ContainerDescriptor {
            width: self.encoding.width,
            height: self.encoding.height,
            fps: self.encoding.fps,
            ..ContainerDescriptor::default()
        }
    }

    async fn render_segment(&self, dir: &Path, index: usize, media: BeatMedia) -> MediaResult<PathBuf> {
        let duration = media.duration_seconds();
        if !(duration.is_finite() && duration > 0.0) {
            return Err(MediaError::invalid_media(format!(
                "beat {} has non-positive narration duration {}",
                media.beat_id, duration
            )));
        }

        let visual_path = dir.join(format!("visual_{index:03}.{}", media.visual.extension()));
        let audio_path = dir.join(format!("narration_{index:03}.{}", media.narration.extension()));
        let output = dir.join(format!("segment_{index:03}.mp4"));

        tokio::fs::write(&visual_path, media.visual.data()).await?;
        tokio::fs::write(&audio_path, &media.narration.data).await?;

        let cmd = segment_command(
            &self.encoding,
            media.visual.is_clip(),
            &visual_path,
            &audio_path,
            duration,
            &output,
        );

        debug!(beat_id = %media.beat_id, index, duration, "Rendering segment");
        let total_ms = (duration * 1000.0) as i64;
        let beat_id = media.beat_id.clone();
        FfmpegRunner::new()
            .with_timeout(self.step_timeout)
            .run_with_progress(&cmd, move |p| {
                trace!(beat_id = %beat_id, percent = p.percentage(total_ms), "Segment progress");
            })
            .await?;

        // Inputs are no longer needed once the segment exists
        let _ = tokio::fs::remove_file(&visual_path).await;
        let _ = tokio::fs::remove_file(&audio_path).await;

        Ok(output)
    }
}

#[async_trait]
impl VideoEncoder for FfmpegEncoder {
    async fn encode(&self, segments: Vec<BeatMedia>) -> MediaResult<EncodedVideo> {
        if segments.is_empty() {
            return Err(MediaError::invalid_media("no segments to encode"));
        }

        tokio::fs::create_dir_all(&self.work_dir).await?;
        // Removed on drop, including when the caller abandons this future
        let temp_dir = tempfile::Builder::new()
            .prefix("assemble-")
            .tempdir_in(&self.work_dir)?;
        let dir = temp_dir.path();
        let count = segments.len();

        // `buffered` keeps output order equal to input order
        let segment_paths: Vec<PathBuf> = stream::iter(segments.into_iter().enumerate())
            .map(|(index, media)| self.render_segment(dir, index, media))
            .buffered(self.max_parallel)
            .try_collect()
            .await?;

        let list_path = dir.join("concat.txt");
        tokio::fs::write(&list_path, concat_list(&segment_paths)).await?;

        let output = dir.join("short.mp4");
        FfmpegRunner::new()
            .with_timeout(self.step_timeout)
            .run(&concat_command(&list_path, &output))
            .await?;

        let data = tokio::fs::read(&output).await?;
        info!(segments = count, bytes = data.len(), "Concatenated segments");

        Ok(EncodedVideo {
            data,
            container: self.container(),
        })
    }
}

/// Build the command rendering one segment.
pub(crate) fn segment_command(
    encoding: &EncodingConfig,
    is_clip: bool,
    visual: &Path,
    audio: &Path,
    duration: f64,
    output: &Path,
) -> FfmpegCommand {
    let cmd = FfmpegCommand::with_output(output);
    let cmd = if is_clip {
        // Loop the clip; -t below trims it
        cmd.input_args(["-stream_loop", "-1"]).input(visual)
    } else {
        cmd.input_args(["-loop", "1", "-framerate"])
            .input_arg(encoding.fps.to_string())
            .input(visual)
    };

    cmd.input(audio)
        .map("0:v:0")
        .map("1:a:0")
        .video_filter(encoding.fill_filter())
        // Pad short audio with silence so the segment never ends early
        .audio_filter("apad")
        .output_args(encoding.to_ffmpeg_args())
        .duration(duration)
        .faststart()
}

/// Build the stream-copy concat command.
pub(crate) fn concat_command(list: &Path, output: &Path) -> FfmpegCommand {
    FfmpegCommand::with_output(output)
        .input_args(["-f", "concat", "-safe", "0"])
        .input(list)
        .stream_copy()
        .faststart()
}

/// Concat demuxer list file body.
pub(crate) fn concat_list(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| format!("file '{}'\n", p.display().to_string().replace('\'', "'\\''")))
        .collect()
}
