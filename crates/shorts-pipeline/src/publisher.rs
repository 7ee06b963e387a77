//! Optional publishing step.

use std::sync::Arc;

use shorts_clients::{PublishMetadata, PublishPlatform};
use shorts_models::{AssembledVideo, ContentPlan, PublishResult, Thumbnail};

use crate::error::{PipelineError, StageResult};
use crate::retry::{retry_async, RetryConfig, RetryResult};

pub struct Publisher {
    platform: Arc<dyn PublishPlatform>,
    retry: RetryConfig,
}

impl Publisher {
    pub fn new(platform: Arc<dyn PublishPlatform>, retry: RetryConfig) -> Self {
        Self { platform, retry }
    }

    /// Upload with the plan's (possibly overridden) metadata. Transient
    /// upload failures are retried.
    pub async fn publish(&self, video: &AssembledVideo, thumbnail: &Thumbnail, plan: &ContentPlan) -> StageResult<PublishResult> {
        let metadata = PublishMetadata::from_plan(plan);

        match retry_async(&self.retry, || self.platform.publish(video, thumbnail, &metadata)).await {
            RetryResult::Success(result) => Ok(result),
            RetryResult::Failed { error, attempts } => Err(PipelineError::publish(format!(
                "{error} (after {attempts} attempt(s))"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use shorts_clients::{ClientError, ClientResult};
    use shorts_models::ContainerDescriptor;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct FlakyPlatform {
        failures: u32,
        calls: AtomicU32,
        titles: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PublishPlatform for FlakyPlatform {
        async fn publish(
            &self,
            _video: &AssembledVideo,
            _thumbnail: &Thumbnail,
            metadata: &PublishMetadata,
        ) -> ClientResult<PublishResult> {
            self.titles.lock().unwrap().push(metadata.title.clone());
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
                return Err(ClientError::Unavailable {
                    service: "youtube",
                    status: 503,
                    message: "backend error".to_string(),
                });
            }
            Ok(PublishResult {
                video_id: "abc123".to_string(),
                url: "https://www.youtube.com/shorts/abc123".to_string(),
            })
        }
    }

    fn fixtures() -> (AssembledVideo, Thumbnail, ContentPlan) {
        (
            AssembledVideo {
                data: vec![0; 4],
                duration_seconds: 38.0,
                container: ContainerDescriptor::default(),
            },
            Thumbnail::jpeg(vec![0xFF, 0xD8]),
            ContentPlan {
                title: "Custom title".to_string(),
                description: "d".to_string(),
                tags: vec!["t".to_string()],
                beats: Vec::new(),
            },
        )
    }

    fn retry() -> RetryConfig {
        RetryConfig::new("publish")
            .with_max_retries(2)
            .with_base_delay(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_publish_uses_plan_metadata_and_retries() {
        let platform = Arc::new(FlakyPlatform {
            failures: 1,
            ..Default::default()
        });
        let (video, thumb, plan) = fixtures();

        let result = Publisher::new(platform.clone(), retry())
            .publish(&video, &thumb, &plan)
            .await
            .unwrap();

        assert_eq!(result.video_id, "abc123");
        assert_eq!(*platform.titles.lock().unwrap(), vec!["Custom title", "Custom title"]);
    }

    #[tokio::test]
    async fn test_exhausted_publish_is_absorbable() {
        let platform = Arc::new(FlakyPlatform {
            failures: 10,
            ..Default::default()
        });
        let (video, thumb, plan) = fixtures();

        let err = Publisher::new(platform.clone(), retry())
            .publish(&video, &thumb, &plan)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Publish(_)));
        assert!(!err.is_fatal());
        assert_eq!(platform.calls.load(Ordering::SeqCst), 3);
    }
}
