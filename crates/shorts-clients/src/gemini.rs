//! Gemini narrative planner.
//!
//! Asks Gemini for a JSON plan (title, description, tags, beats) and maps
//! it onto `ContentPlan`. Models are tried in order; the first usable
//! response wins.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use shorts_models::{BeatId, ContentPlan, PlanBeat};

use crate::config::ClientsConfig;
use crate::error::{ensure_success, ClientError, ClientResult};
use crate::traits::{NarrativeService, PlanBrief};

const SERVICE: &str = "gemini";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini API client.
pub struct GeminiNarrative {
    api_key: String,
    models: Vec<String>,
    base_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

/// Plan as the model writes it. Loosely typed so that numeric ids and
/// missing optional fields still parse.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPlan {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    beats: Vec<RawBeat>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBeat {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    hook: String,
    narration: String,
    #[serde(alias = "visual")]
    visual_prompt: String,
    #[serde(alias = "duration")]
    duration_seconds: f64,
}

impl GeminiNarrative {
    pub fn new(config: &ClientsConfig, client: Client) -> ClientResult<Self> {
        let api_key = config
            .gemini_api_key
            .clone()
            .ok_or_else(|| ClientError::config("GEMINI_API_KEY not set"))?;

        Ok(Self {
            api_key,
            models: config.gemini_models.clone(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client,
        })
    }

    /// Override the API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn call_model(&self, model: &str, prompt: &str) -> ClientResult<ContentPlan> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);

        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                temperature: 0.8,
            },
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(SERVICE, e))?;
        let response = ensure_success(SERVICE, response).await?;

        let body: GeminiResponse = response
            .json()
            .await
            .map_err(|e| ClientError::invalid_response(SERVICE, format!("undecodable body: {e}")))?;

        let text = body
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.first())
            .map(|p| p.text.as_str())
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ClientError::invalid_response(SERVICE, "no content in response"))?;

        debug!(model, chars = text.len(), "Gemini returned plan text");
        parse_plan(text)
    }
}

#[async_trait]
impl NarrativeService for GeminiNarrative {
    async fn draft_plan(&self, brief: &PlanBrief) -> ClientResult<ContentPlan> {
        let prompt = build_prompt(brief);
        let mut last_error = None;

        for model in &self.models {
            info!(model = %model, "Requesting plan from Gemini");
            match self.call_model(model, &prompt).await {
                Ok(plan) => {
                    info!(model = %model, beats = plan.beats.len(), "Got plan from Gemini");
                    return Ok(plan);
                }
                Err(e) => {
                    warn!(model = %model, error = %e, "Gemini model failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ClientError::config("no Gemini models configured")))
    }
}

fn build_prompt(brief: &PlanBrief) -> String {
    let cta = brief
        .cta
        .as_deref()
        .map(|c| format!("End the final beat with this call to action: \"{c}\"."))
        .unwrap_or_else(|| "End with a short, natural call to action.".to_string());

    format!(
        r#"You are a scriptwriter for viral vertical short-form videos.

Write a script about: {topic}
Tone: {tone}
Target audience: {audience}
Total duration: {duration:.0} seconds

Return ONLY a single JSON object with this schema:
{{
  "title": "Catchy title under 100 characters",
  "description": "Engaging description with hashtags",
  "tags": ["tag1", "tag2"],
  "beats": [
    {{
      "id": "beat-1",
      "hook": "On-screen hook text",
      "narration": "Exactly what the narrator says",
      "visualPrompt": "Detailed image prompt for this beat, vertical 9:16",
      "durationSeconds": 10
    }}
  ]
}}

Rules:
- Use between {min_beats} and {max_beats} beats.
- Beat durations must add up to {duration:.0} seconds.
- Every beat id must be unique.
- Narration must be speakable in the beat's duration (about 2.5 words per second).
- The first beat must hook the viewer within 2 seconds.
- {cta}
"#,
        topic = brief.topic,
        tone = brief.tone,
        audience = brief.audience,
        duration = brief.duration_seconds,
        min_beats = brief.min_beats,
        max_beats = brief.max_beats,
    )
}

/// Remove a surrounding Markdown code fence, if any.
fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}

fn parse_plan(text: &str) -> ClientResult<ContentPlan> {
    let raw: RawPlan = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| ClientError::invalid_response(SERVICE, format!("plan JSON: {e}")))?;

    let beats = raw
        .beats
        .into_iter()
        .enumerate()
        .map(|(i, b)| PlanBeat {
            id: beat_id(b.id, i),
            hook: b.hook,
            narration: b.narration,
            visual_prompt: b.visual_prompt,
            duration_seconds: b.duration_seconds,
        })
        .collect();

    Ok(ContentPlan {
        title: raw.title,
        description: raw.description,
        tags: raw.tags,
        beats,
    })
}

fn beat_id(value: Option<serde_json::Value>, index: usize) -> BeatId {
    match value {
        Some(serde_json::Value::String(s)) => BeatId::from(s.trim().to_string()),
        Some(serde_json::Value::Number(n)) => BeatId::from(n.to_string()),
        _ => BeatId::from(format!("beat-{}", index + 1)),
    }
}
