//! FFprobe media information.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::command::check_ffprobe;
use crate::error::{MediaError, MediaResult};

/// Media file information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Duration in seconds
    pub duration: f64,
    pub has_video: bool,
    pub has_audio: bool,
    /// Width in pixels (0 without a video stream)
    pub width: u32,
    /// Height in pixels (0 without a video stream)
    pub height: u32,
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

/// Probe a media file.
pub async fn probe_media(path: impl AsRef<Path>) -> MediaResult<MediaInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    check_ffprobe()?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: "FFprobe failed".to_string(),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    let probe: FfprobeOutput = serde_json::from_slice(&output.stdout)?;
    Ok(media_info_from(probe))
}

fn media_info_from(probe: FfprobeOutput) -> MediaInfo {
    let video = probe.streams.iter().find(|s| s.codec_type == "video");
    let audio = probe.streams.iter().find(|s| s.codec_type == "audio");

    // Container duration first, then the audio stream's own duration
    let duration = probe
        .format
        .duration
        .as_deref()
        .and_then(parse_seconds)
        .or_else(|| audio.and_then(|a| a.duration.as_deref()).and_then(parse_seconds))
        .unwrap_or(0.0);

    MediaInfo {
        duration,
        has_video: video.is_some(),
        has_audio: audio.is_some(),
        width: video.and_then(|v| v.width).unwrap_or(0),
        height: video.and_then(|v| v.height).unwrap_or(0),
    }
}

fn parse_seconds(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|d| d.is_finite() && *d > 0.0)
}

/// Measure the length of an in-memory audio clip.
///
/// The bytes are written to a temporary file (removed on return) so FFprobe
/// can read container headers.
pub async fn measure_audio_duration(data: &[u8], extension: &str) -> MediaResult<f64> {
    if data.is_empty() {
        return Err(MediaError::invalid_media("audio payload is empty"));
    }

    let file = tempfile::Builder::new()
        .prefix("narration-")
        .suffix(&format!(".{extension}"))
        .tempfile()?;
    tokio::fs::write(file.path(), data).await?;

    let info = probe_media(file.path()).await?;
    if !info.has_audio {
        return Err(MediaError::invalid_media("no audio stream found"));
    }
    if info.duration <= 0.0 {
        return Err(MediaError::invalid_media("audio duration could not be measured"));
    }

    Ok(info.duration)
}
