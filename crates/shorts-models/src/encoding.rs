//! Video encoding configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
/// Default encoding preset
pub const DEFAULT_PRESET: &str = "veryfast";
/// Default CRF (Constant Rate Factor)
pub const DEFAULT_CRF: u8 = 20;
/// Default audio bitrate
pub const DEFAULT_AUDIO_BITRATE: &str = "192k";
/// Audio sample rate shared by every segment so concat can stream-copy
pub const DEFAULT_AUDIO_SAMPLE_RATE: u32 = 44_100;

/// Vertical 9:16 output
pub const OUTPUT_WIDTH: u32 = 1080;
pub const OUTPUT_HEIGHT: u32 = 1920;
pub const OUTPUT_FPS: u32 = 30;

/// Thumbnail settings
pub const THUMBNAIL_WIDTH: u32 = 1080;
pub const THUMBNAIL_HEIGHT: u32 = 1920;
pub const THUMBNAIL_JPEG_QUALITY: u8 = 88;
/// Offset into the video used for frame thumbnails
pub const THUMBNAIL_TIMESTAMP: &str = "00:00:01";

/// Video encoding configuration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EncodingConfig {
    /// Video codec (e.g., "libx264")
    #[serde(default = "default_video_codec")]
    pub codec: String,

    /// Encoding preset (e.g., "veryfast", "medium")
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Constant Rate Factor (quality, 0-51, lower is better)
    #[serde(default = "default_crf")]
    pub crf: u8,

    /// Audio codec
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Audio bitrate
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,

    /// Output width in pixels
    #[serde(default = "default_width")]
    pub width: u32,

    /// Output height in pixels
    #[serde(default = "default_height")]
    pub height: u32,

    /// Output frame rate
    #[serde(default = "default_fps")]
    pub fps: u32,
}

fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}
fn default_crf() -> u8 {
    DEFAULT_CRF
}
fn default_audio_codec() -> String {
    DEFAULT_AUDIO_CODEC.to_string()
}
fn default_audio_bitrate() -> String {
    DEFAULT_AUDIO_BITRATE.to_string()
}
fn default_width() -> u32 {
    OUTPUT_WIDTH
}
fn default_height() -> u32 {
    OUTPUT_HEIGHT
}
fn default_fps() -> u32 {
    OUTPUT_FPS
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            preset: DEFAULT_PRESET.to_string(),
            crf: DEFAULT_CRF,
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            audio_bitrate: DEFAULT_AUDIO_BITRATE.to_string(),
            width: OUTPUT_WIDTH,
            height: OUTPUT_HEIGHT,
            fps: OUTPUT_FPS,
        }
    }
}

impl EncodingConfig {
    /// Scale-and-crop filter that fills the output frame.
    pub fn fill_filter(&self) -> String {
        format!(
            "scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h},setsar=1,fps={fps},format=yuv420p",
            w = self.width,
            h = self.height,
            fps = self.fps
        )
    }

    /// Convert to FFmpeg output arguments.
    ///
    /// Every segment is encoded with the same parameters so the concat
    /// demuxer can join them without re-encoding.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        vec![
            "-c:v".to_string(),
            self.codec.clone(),
            "-preset".to_string(),
            self.preset.clone(),
            "-crf".to_string(),
            self.crf.to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-r".to_string(),
            self.fps.to_string(),
            "-c:a".to_string(),
            self.audio_codec.clone(),
            "-b:a".to_string(),
            self.audio_bitrate.clone(),
            "-ar".to_string(),
            DEFAULT_AUDIO_SAMPLE_RATE.to_string(),
            "-ac".to_string(),
            "2".to_string(),
        ]
    }
}
