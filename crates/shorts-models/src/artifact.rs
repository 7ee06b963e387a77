//! Final artifacts produced by the pipeline.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::encoding::{OUTPUT_FPS, OUTPUT_HEIGHT, OUTPUT_WIDTH};

/// Container and codec description of an encoded video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContainerDescriptor {
    pub container: String,
    pub video_codec: String,
    pub audio_codec: String,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for ContainerDescriptor {
    fn default() -> Self {
        Self {
            container: "mp4".to_string(),
            video_codec: "h264".to_string(),
            audio_codec: "aac".to_string(),
            width: OUTPUT_WIDTH,
            height: OUTPUT_HEIGHT,
            fps: OUTPUT_FPS,
        }
    }
}

impl ContainerDescriptor {
    pub fn mime(&self) -> String {
        format!("video/{}", self.container)
    }
}

/// The assembled video.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledVideo {
    pub data: Vec<u8>,
    /// Exact sum of segment durations
    pub duration_seconds: f64,
    pub container: ContainerDescriptor,
}

/// Still image representing the video.
#[derive(Debug, Clone, PartialEq)]
pub struct Thumbnail {
    pub data: Vec<u8>,
    pub mime: String,
    /// True when the placeholder replaced a failed generation
    pub is_fallback: bool,
}

impl Thumbnail {
    pub fn jpeg(data: Vec<u8>) -> Self {
        Self {
            data,
            mime: "image/jpeg".to_string(),
            is_fallback: false,
        }
    }
}

/// Outcome of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublishResult {
    /// Platform video id
    pub video_id: String,
    /// Public watch URL
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_container_is_vertical_mp4() {
        let desc = ContainerDescriptor::default();
        assert_eq!(desc.mime(), "video/mp4");
        assert!(desc.height > desc.width);
    }
}
