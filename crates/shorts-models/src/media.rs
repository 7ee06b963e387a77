//! Generated per-beat media.

use serde::{Deserialize, Serialize};

use crate::plan::BeatId;

/// Visual asset produced for a beat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VisualAsset {
    /// Still image, held for the whole segment
    Image { data: Vec<u8>, mime: String },
    /// Video clip, looped or trimmed to the segment
    Clip { data: Vec<u8>, mime: String },
}

impl VisualAsset {
    pub fn data(&self) -> &[u8] {
        match self {
            VisualAsset::Image { data, .. } | VisualAsset::Clip { data, .. } => data,
        }
    }

    pub fn mime(&self) -> &str {
        match self {
            VisualAsset::Image { mime, .. } | VisualAsset::Clip { mime, .. } => mime,
        }
    }

    pub fn is_clip(&self) -> bool {
        matches!(self, VisualAsset::Clip { .. })
    }

    /// File extension matching the mime type.
    pub fn extension(&self) -> &'static str {
        match self.mime() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            "image/png" => "png",
            "video/webm" => "webm",
            "video/quicktime" => "mov",
            _ if self.is_clip() => "mp4",
            _ => "png",
        }
    }
}

/// Narration audio with its measured length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrationAudio {
    pub data: Vec<u8>,
    pub mime: String,
    /// Measured length in seconds; this drives segment timing
    pub duration_seconds: f64,
}

impl NarrationAudio {
    /// File extension matching the mime type.
    pub fn extension(&self) -> &'static str {
        match self.mime.as_str() {
            "audio/wav" | "audio/x-wav" => "wav",
            "audio/ogg" => "ogg",
            "audio/aac" => "aac",
            _ => "mp3",
        }
    }
}

/// Generated assets for one beat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeatMedia {
    pub beat_id: BeatId,
    pub visual: VisualAsset,
    pub narration: NarrationAudio,
}

impl BeatMedia {
    /// Effective segment length: the measured narration duration.
    pub fn duration_seconds(&self) -> f64 {
        self.narration.duration_seconds
    }
}
