//! API integration tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use serde_json::{json, Value};
use tower::ServiceExt;

use shorts_api::{create_router, ApiConfig, AppState, ShortsPipeline};
use shorts_models::{
    AssembledVideo, BeatId, ContainerDescriptor, ContentPlan, PipelineLogEntry, PipelineResult, PipelineStep,
    PlanBeat, PublishResult, ShortRequest, Thumbnail,
};
use shorts_pipeline::{PipelineError, PipelineFailure};

enum Outcome {
    Success { publish: Option<PublishResult> },
    Failure(PipelineError),
}

struct FakePipeline {
    outcome: Outcome,
    requests: Mutex<Vec<ShortRequest>>,
}

impl FakePipeline {
    fn new(outcome: Outcome) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            requests: Mutex::new(Vec::new()),
        })
    }
}

fn entry(step: PipelineStep, message: &str) -> PipelineLogEntry {
    PipelineLogEntry {
        step,
        message: message.to_string(),
        timestamp: Utc::now(),
    }
}

#[async_trait]
impl ShortsPipeline for FakePipeline {
    async fn run(&self, request: &ShortRequest) -> Result<PipelineResult, PipelineFailure> {
        self.requests.lock().unwrap().push(request.clone());

        match &self.outcome {
            Outcome::Success { publish } => Ok(PipelineResult {
                plan: ContentPlan {
                    title: "Morning routines".to_string(),
                    description: "d".to_string(),
                    tags: vec!["morning".to_string()],
                    beats: vec![PlanBeat {
                        id: BeatId::from("b1"),
                        hook: "h".to_string(),
                        narration: "n".to_string(),
                        visual_prompt: "v".to_string(),
                        duration_seconds: 38.0,
                    }],
                },
                video: AssembledVideo {
                    data: b"video".to_vec(),
                    duration_seconds: 38.0,
                    container: ContainerDescriptor::default(),
                },
                thumbnail: Thumbnail::jpeg(b"thumb".to_vec()),
                total_duration: 38.0,
                publish: publish.clone(),
                logs: vec![entry(PipelineStep::Planning, "Planning"), entry(PipelineStep::Done, "Short ready")],
            }),
            Outcome::Failure(error) => Err(PipelineFailure {
                error: error.clone(),
                logs: vec![
                    entry(PipelineStep::Planning, "Planning"),
                    entry(PipelineStep::Failed, &error.to_string()),
                ],
            }),
        }
    }
}

fn app(pipeline: Arc<FakePipeline>) -> Router {
    let state = AppState::with_pipeline(ApiConfig::default(), pipeline);
    create_router(state, None)
}

fn post_json(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/create-short")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let response = app(FakePipeline::new(Outcome::Success { publish: None }))
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(json_body(response).await["status"], "healthy");
}

#[tokio::test]
async fn test_metrics_route_absent_when_disabled() {
    let response = app(FakePipeline::new(Outcome::Success { publish: None }))
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_short_success_envelope() {
    let pipeline = FakePipeline::new(Outcome::Success { publish: None });
    let response = app(pipeline.clone())
        .oneshot(post_json(json!({
            "topic": "morning routines",
            "durationSeconds": 40,
            "uploadToYoutube": false
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;

    assert_eq!(body["success"], true);
    assert_eq!(body["videoBase64"], "dmlkZW8=");
    assert_eq!(body["thumbnailBase64"], "dGh1bWI=");
    assert_eq!(body["totalDuration"], 38.0);
    assert!(body["youtubeUrl"].is_null());
    assert!(body["youtubeId"].is_null());
    assert_eq!(body["plan"]["title"], "Morning routines");
    assert_eq!(body["logs"].as_array().unwrap().len(), 2);
    assert_eq!(body["logs"][1]["step"], "done");

    let requests = pipeline.requests.lock().unwrap();
    assert_eq!(requests[0].topic, "morning routines");
    assert_eq!(requests[0].duration_seconds, 40.0);
}

#[tokio::test]
async fn test_create_short_reports_publish_ids() {
    let pipeline = FakePipeline::new(Outcome::Success {
        publish: Some(PublishResult {
            video_id: "abc123".to_string(),
            url: "https://www.youtube.com/shorts/abc123".to_string(),
        }),
    });
    let response = app(pipeline)
        .oneshot(post_json(json!({
            "topic": "morning routines",
            "durationSeconds": 40,
            "uploadToYoutube": true
        })))
        .await
        .unwrap();

    let body = json_body(response).await;
    assert_eq!(body["youtubeId"], "abc123");
    assert_eq!(body["youtubeUrl"], "https://www.youtube.com/shorts/abc123");
}

#[tokio::test]
async fn test_pipeline_failure_returns_500_with_logs() {
    let pipeline = FakePipeline::new(Outcome::Failure(PipelineError::Timeout(300)));
    let response = app(pipeline)
        .oneshot(post_json(json!({ "topic": "slow", "durationSeconds": 30 })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;

    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Pipeline timed out after 300 seconds");
    assert!(body.get("videoBase64").is_none());
    assert_eq!(body["logs"].as_array().unwrap().last().unwrap()["step"], "failed");
}

#[tokio::test]
async fn test_invalid_brief_is_rejected_before_running() {
    let pipeline = FakePipeline::new(Outcome::Success { publish: None });

    let response = app(pipeline.clone())
        .oneshot(post_json(json!({ "topic": "   ", "durationSeconds": 40 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("topic"));
    assert!(body.get("logs").is_none());

    let response = app(pipeline.clone())
        .oneshot(post_json(json!({ "topic": "ok", "durationSeconds": 600 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert!(pipeline.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let pipeline = FakePipeline::new(Outcome::Success { publish: None });
    let request = Request::builder()
        .method("POST")
        .uri("/api/create-short")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"topic\": "))
        .unwrap();

    let response = app(pipeline).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["success"], false);
}
