//! Short creation handler.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use tracing::{info, warn};
use validator::Validate;

use shorts_models::{ContentPlan, PipelineLogEntry, PipelineResult, ShortRequest};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Successful create-short response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShortResponse {
    pub success: bool,
    pub plan: ContentPlan,
    pub video_base64: String,
    pub thumbnail_base64: String,
    pub total_duration: f64,
    /// `null` unless the upload succeeded
    pub youtube_url: Option<String>,
    pub youtube_id: Option<String>,
    pub logs: Vec<PipelineLogEntry>,
}

impl From<PipelineResult> for CreateShortResponse {
    fn from(result: PipelineResult) -> Self {
        let youtube_url = result.youtube_url().map(String::from);
        let youtube_id = result.youtube_id().map(String::from);

        Self {
            success: true,
            video_base64: STANDARD.encode(&result.video.data),
            thumbnail_base64: STANDARD.encode(&result.thumbnail.data),
            total_duration: result.total_duration,
            plan: result.plan,
            youtube_url,
            youtube_id,
            logs: result.logs,
        }
    }
}

/// Run the pipeline for one brief and return the finished short.
///
/// Holds the connection for the whole run; dropping the request cancels it.
pub async fn create_short(
    State(state): State<AppState>,
    payload: Result<Json<ShortRequest>, JsonRejection>,
) -> ApiResult<Json<CreateShortResponse>> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    request.validate()?;

    metrics::record_short_requested(request.upload_to_youtube);
    info!(
        topic = %request.topic,
        duration_seconds = request.duration_seconds,
        upload = request.upload_to_youtube,
        "Creating short"
    );

    let result = state.pipeline.run(&request).await.map_err(|failure| {
        warn!(error = %failure.error, entries = failure.logs.len(), "Short creation failed");
        ApiError::from(failure)
    })?;

    info!(
        total_duration = result.total_duration,
        beats = result.plan.beats.len(),
        video_bytes = result.video.data.len(),
        published = result.publish.is_some(),
        "Short created"
    );

    Ok(Json(CreateShortResponse::from(result)))
}
