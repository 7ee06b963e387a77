//! Service client configuration.

use std::time::Duration;

/// Gemini models tried in order until one returns a usable plan.
pub const DEFAULT_GEMINI_MODELS: &[&str] = &["gemini-2.5-flash", "gemini-2.5-flash-lite", "gemini-2.5-pro"];

/// Credentials and endpoints for every external service.
#[derive(Debug, Clone)]
pub struct ClientsConfig {
    pub gemini_api_key: Option<String>,
    pub gemini_models: Vec<String>,
    pub openai_api_key: Option<String>,
    /// OpenAI-compatible API root, without trailing slash
    pub openai_base_url: String,
    pub openai_image_model: String,
    pub elevenlabs_api_key: Option<String>,
    pub elevenlabs_voice_id: String,
    pub elevenlabs_model_id: String,
    pub youtube_client_id: Option<String>,
    pub youtube_client_secret: Option<String>,
    pub youtube_refresh_token: Option<String>,
    /// public, unlisted or private
    pub youtube_privacy_status: String,
    /// HTTP timeout applied by the shared reqwest client
    pub request_timeout: Duration,
}

impl Default for ClientsConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_models: DEFAULT_GEMINI_MODELS.iter().map(|m| m.to_string()).collect(),
            openai_api_key: None,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            openai_image_model: "gpt-image-1".to_string(),
            elevenlabs_api_key: None,
            elevenlabs_voice_id: "21m00Tcm4TlvDq8ikWAM".to_string(),
            elevenlabs_model_id: "eleven_multilingual_v2".to_string(),
            youtube_client_id: None,
            youtube_client_secret: None,
            youtube_refresh_token: None,
            youtube_privacy_status: "public".to_string(),
            request_timeout: Duration::from_secs(120),
        }
    }
}

impl ClientsConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            gemini_api_key: non_empty_var("GEMINI_API_KEY"),
            gemini_models: std::env::var("GEMINI_MODELS")
                .ok()
                .map(|s| parse_list(&s))
                .filter(|models| !models.is_empty())
                .unwrap_or(defaults.gemini_models),
            openai_api_key: non_empty_var("OPENAI_API_KEY"),
            openai_base_url: non_empty_var("OPENAI_BASE_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.openai_base_url),
            openai_image_model: non_empty_var("OPENAI_IMAGE_MODEL").unwrap_or(defaults.openai_image_model),
            elevenlabs_api_key: non_empty_var("ELEVENLABS_API_KEY"),
            elevenlabs_voice_id: non_empty_var("ELEVENLABS_VOICE_ID").unwrap_or(defaults.elevenlabs_voice_id),
            elevenlabs_model_id: non_empty_var("ELEVENLABS_MODEL_ID").unwrap_or(defaults.elevenlabs_model_id),
            youtube_client_id: non_empty_var("YOUTUBE_CLIENT_ID"),
            youtube_client_secret: non_empty_var("YOUTUBE_CLIENT_SECRET"),
            youtube_refresh_token: non_empty_var("YOUTUBE_REFRESH_TOKEN"),
            youtube_privacy_status: non_empty_var("YOUTUBE_PRIVACY_STATUS")
                .unwrap_or(defaults.youtube_privacy_status),
            request_timeout: Duration::from_secs(
                std::env::var("CLIENT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
        }
    }

    /// Whether every YouTube credential is present.
    pub fn youtube_configured(&self) -> bool {
        self.youtube_client_id.is_some() && self.youtube_client_secret.is_some() && self.youtube_refresh_token.is_some()
    }

    /// Shared HTTP client for all services.
    pub fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.request_timeout)
            .user_agent(concat!("shorts-backend/", env!("CARGO_PKG_VERSION")))
            .build()
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(String::from)
        .collect()
}
