//! Pipeline configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::retry::RetryConfig;

/// Where the thumbnail comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThumbnailMode {
    /// Rendered by the visual service from the plan, alongside assembly
    #[default]
    Generated,
    /// Frame grabbed from the assembled video
    VideoFrame,
}

impl FromStr for ThumbnailMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "generated" => Ok(Self::Generated),
            "video_frame" | "frame" => Ok(Self::VideoFrame),
            other => Err(format!("unknown thumbnail mode: {other}")),
        }
    }
}

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Wall-clock budget for a whole run
    pub deadline: Duration,
    /// Budget for each external call attempt
    pub call_timeout: Duration,
    /// Beats generated concurrently
    pub max_parallel_beats: usize,
    pub min_beats: usize,
    pub max_beats: usize,
    /// Allowed relative gap between planned and requested duration
    pub duration_tolerance: f64,
    /// Retries per beat sub-call (visual, narration) and for planning
    pub beat_retries: u32,
    pub publish_retries: u32,
    /// First backoff delay; doubles per attempt
    pub retry_base_delay: Duration,
    /// Failed/total ratio at which beat failures become fatal
    pub max_failed_beat_fraction: f64,
    /// Plans this short tolerate no beat failures
    pub strict_beat_count: usize,
    pub thumbnail_mode: ThumbnailMode,
    /// Parent directory for temporary media files
    pub work_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(300),
            call_timeout: Duration::from_secs(90),
            max_parallel_beats: 3,
            min_beats: 3,
            max_beats: 12,
            duration_tolerance: 0.15,
            beat_retries: 2,
            publish_retries: 2,
            retry_base_delay: Duration::from_millis(500),
            max_failed_beat_fraction: 0.3,
            strict_beat_count: 3,
            thumbnail_mode: ThumbnailMode::Generated,
            work_dir: std::env::temp_dir().join("shorts"),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            deadline: Duration::from_secs(env_or("PIPELINE_DEADLINE_SECS", defaults.deadline.as_secs())),
            call_timeout: Duration::from_secs(env_or("PIPELINE_CALL_TIMEOUT_SECS", defaults.call_timeout.as_secs())),
            max_parallel_beats: env_or("PIPELINE_MAX_PARALLEL_BEATS", defaults.max_parallel_beats).max(1),
            min_beats: env_or("PIPELINE_MIN_BEATS", defaults.min_beats).max(1),
            max_beats: env_or("PIPELINE_MAX_BEATS", defaults.max_beats),
            duration_tolerance: env_or("PIPELINE_DURATION_TOLERANCE", defaults.duration_tolerance),
            beat_retries: env_or("PIPELINE_BEAT_RETRIES", defaults.beat_retries),
            publish_retries: env_or("PIPELINE_PUBLISH_RETRIES", defaults.publish_retries),
            retry_base_delay: Duration::from_millis(env_or(
                "PIPELINE_RETRY_BASE_MS",
                defaults.retry_base_delay.as_millis() as u64,
            )),
            max_failed_beat_fraction: env_or("PIPELINE_MAX_FAILED_BEAT_FRACTION", defaults.max_failed_beat_fraction),
            strict_beat_count: env_or("PIPELINE_STRICT_BEAT_COUNT", defaults.strict_beat_count),
            thumbnail_mode: env_or("PIPELINE_THUMBNAIL_MODE", defaults.thumbnail_mode),
            work_dir: std::env::var("PIPELINE_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
        }
    }

    /// Retry policy for one kind of external call.
    pub fn retry_config(&self, operation: &'static str, max_retries: u32) -> RetryConfig {
        RetryConfig::new(operation)
            .with_max_retries(max_retries)
            .with_base_delay(self.retry_base_delay)
            .with_call_timeout(self.call_timeout)
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.deadline, Duration::from_secs(300));
        assert_eq!(config.max_parallel_beats, 3);
        assert_eq!((config.min_beats, config.max_beats), (3, 12));
        assert_eq!(config.thumbnail_mode, ThumbnailMode::Generated);
    }

    #[test]
    fn test_thumbnail_mode_parse() {
        assert_eq!("video_frame".parse::<ThumbnailMode>(), Ok(ThumbnailMode::VideoFrame));
        assert_eq!(" Generated ".parse::<ThumbnailMode>(), Ok(ThumbnailMode::Generated));
        assert!("poster".parse::<ThumbnailMode>().is_err());
    }

    #[test]
    fn test_from_env_falls_back_to_defaults() {
        let defaults = PipelineConfig::default();
        let config = PipelineConfig::from_env();
        assert_eq!(config.deadline, defaults.deadline);
        assert_eq!(config.call_timeout, defaults.call_timeout);
        assert_eq!(config.retry_base_delay, defaults.retry_base_delay);
    }

    #[test]
    fn test_unparsable_env_value_uses_default() {
        std::env::set_var("SHORTS_CONFIG_TEST_GARBAGE", "ninety");
        assert_eq!(env_or("SHORTS_CONFIG_TEST_GARBAGE", 90u64), 90);
        assert_eq!(env_or("SHORTS_CONFIG_TEST_UNSET", 7usize), 7);
    }

    #[test]
    fn test_retry_config_uses_call_timeout() {
        let config = PipelineConfig {
            call_timeout: Duration::from_secs(7),
            ..Default::default()
        };
        let retry = config.retry_config("visual", 4);
        assert_eq!(retry.max_retries, 4);
        assert_eq!(retry.call_timeout, Some(Duration::from_secs(7)));
    }
}
