//! ElevenLabs text-to-speech.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use shorts_media::measure_audio_duration;
use shorts_models::NarrationAudio;

use crate::config::ClientsConfig;
use crate::error::{ensure_success, ClientError, ClientResult};
use crate::traits::VoiceService;

const SERVICE: &str = "elevenlabs";
const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io/v1";
const OUTPUT_FORMAT: &str = "mp3_44100_128";

pub struct ElevenLabsVoice {
    api_key: String,
    voice_id: String,
    model_id: String,
    base_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

impl ElevenLabsVoice {
    pub fn new(config: &ClientsConfig, client: Client) -> ClientResult<Self> {
        let api_key = config
            .elevenlabs_api_key
            .clone()
            .ok_or_else(|| ClientError::config("ELEVENLABS_API_KEY not set"))?;

        Ok(Self {
            api_key,
            voice_id: config.elevenlabs_voice_id.clone(),
            model_id: config.elevenlabs_model_id.clone(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client,
        })
    }

    fn speech_url(&self) -> String {
        format!(
            "{}/text-to-speech/{}?output_format={}",
            self.base_url, self.voice_id, OUTPUT_FORMAT
        )
    }
}

#[async_trait]
impl VoiceService for ElevenLabsVoice {
    async fn synthesize(&self, text: &str) -> ClientResult<NarrationAudio> {
        if text.trim().is_empty() {
            return Err(ClientError::invalid_response(SERVICE, "narration text is empty"));
        }

        let request = SpeechRequest {
            text,
            model_id: &self.model_id,
            voice_settings: VoiceSettings {
                stability: 0.45,
                similarity_boost: 0.8,
            },
        };

        let response = self
            .client
            .post(self.speech_url())
            .header("xi-api-key", &self.api_key)
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(&request)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(SERVICE, e))?;
        let response = ensure_success(SERVICE, response).await?;

        let data = response
            .bytes()
            .await
            .map_err(|e| ClientError::from_reqwest(SERVICE, e))?
            .to_vec();
        if data.is_empty() {
            return Err(ClientError::invalid_response(SERVICE, "empty audio"));
        }

        let duration_seconds = measure_audio_duration(&data, "mp3").await?;
        debug!(bytes = data.len(), duration_seconds, "Synthesized narration");

        Ok(NarrationAudio {
            data,
            mime: "audio/mpeg".to_string(),
            duration_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice() -> ElevenLabsVoice {
        let config = ClientsConfig {
            elevenlabs_api_key: Some("key".to_string()),
            elevenlabs_voice_id: "voice123".to_string(),
            ..ClientsConfig::default()
        };
        ElevenLabsVoice::new(&config, Client::new()).unwrap()
    }

    #[test]
    fn test_speech_url() {
        assert_eq!(
            voice().speech_url(),
            "https://api.elevenlabs.io/v1/text-to-speech/voice123?output_format=mp3_44100_128"
        );
    }

    #[test]
    fn test_requires_api_key() {
        let err = ElevenLabsVoice::new(&ClientsConfig::default(), Client::new()).err().unwrap();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[tokio::test]
    async fn test_blank_text_is_rejected_before_request() {
        let err = voice().synthesize("   ").await.unwrap_err();
        assert!(!err.is_retryable());
    }
}
