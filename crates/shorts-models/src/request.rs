//! The validated content brief.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Shortest video the pipeline will plan for.
pub const MIN_DURATION_SECONDS: f64 = 20.0;
/// Longest video the pipeline will plan for.
pub const MAX_DURATION_SECONDS: f64 = 120.0;

/// Default tone when the brief leaves it out.
pub const DEFAULT_TONE: &str = "energetic";
/// Default audience when the brief leaves it out.
pub const DEFAULT_AUDIENCE: &str = "Creators & builders";

/// A content brief for one short video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ShortRequest {
    /// What the video is about
    #[validate(length(max = 200), custom(function = "validate_not_blank"))]
    pub topic: String,

    /// Voice and energy of the script
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 100))]
    pub tone: Option<String>,

    /// Who the video is for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 200))]
    pub target_audience: Option<String>,

    /// Closing call to action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 200))]
    pub cta: Option<String>,

    /// Requested total length in seconds
    #[validate(range(min = 20.0, max = 120.0))]
    pub duration_seconds: f64,

    /// Publish the finished video to YouTube
    #[serde(default)]
    pub upload_to_youtube: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 100))]
    pub custom_title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 5000))]
    pub custom_description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 15))]
    pub custom_tags: Option<Vec<String>>,
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

impl ShortRequest {
    /// Create a minimal request for a topic and duration.
    pub fn new(topic: impl Into<String>, duration_seconds: f64) -> Self {
        Self {
            topic: topic.into(),
            tone: None,
            target_audience: None,
            cta: None,
            duration_seconds,
            upload_to_youtube: false,
            custom_title: None,
            custom_description: None,
            custom_tags: None,
        }
    }

    /// Enable or disable the publish step.
    pub fn with_upload(mut self, upload: bool) -> Self {
        self.upload_to_youtube = upload;
        self
    }

    /// Tone, falling back to the default.
    pub fn tone_or_default(&self) -> &str {
        non_blank(self.tone.as_deref()).unwrap_or(DEFAULT_TONE)
    }

    /// Audience, falling back to the default.
    pub fn audience_or_default(&self) -> &str {
        non_blank(self.target_audience.as_deref()).unwrap_or(DEFAULT_AUDIENCE)
    }

    /// Call to action, if one was given.
    pub fn cta(&self) -> Option<&str> {
        non_blank(self.cta.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
