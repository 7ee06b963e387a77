//! FFmpeg CLI wrapper for assembling vertical shorts.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with multiple inputs
//! - Progress parsing from `-progress pipe:2`
//! - Timeouts, with child processes killed when a run is dropped
//! - Media probing (narration length measurement)
//! - Segment rendering and concat-demuxer assembly behind `VideoEncoder`
//! - Frame thumbnails, JPEG normalization and a placeholder image

pub mod command;
pub mod encoder;
pub mod error;
pub mod probe;
pub mod progress;
pub mod thumbnail;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use encoder::{EncodedVideo, FfmpegEncoder, VideoEncoder};
pub use error::{MediaError, MediaResult};
pub use probe::{measure_audio_duration, probe_media, MediaInfo};
pub use progress::FfmpegProgress;
pub use thumbnail::{extract_frame_jpeg, normalize_to_jpeg, placeholder_thumbnail};
