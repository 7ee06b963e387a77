//! OpenAI-compatible image generation.

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use shorts_models::VisualAsset;

use crate::config::ClientsConfig;
use crate::error::{ensure_success, ClientError, ClientResult};
use crate::traits::VisualService;

const SERVICE: &str = "openai";
/// Closest portrait size the image endpoint supports
const IMAGE_SIZE: &str = "1024x1536";

/// Image generator backed by `/images/generations`.
pub struct OpenAiImages {
    api_key: String,
    base_url: String,
    model: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'a str,
    n: u8,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    b64_json: Option<String>,
    url: Option<String>,
}

impl OpenAiImages {
    pub fn new(config: &ClientsConfig, client: Client) -> ClientResult<Self> {
        let api_key = config
            .openai_api_key
            .clone()
            .ok_or_else(|| ClientError::config("OPENAI_API_KEY not set"))?;

        Ok(Self {
            api_key,
            base_url: config.openai_base_url.clone(),
            model: config.openai_image_model.clone(),
            client,
        })
    }

    async fn download(&self, url: &str) -> ClientResult<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(SERVICE, e))?;
        let response = ensure_success(SERVICE, response).await?;
        let bytes = response.bytes().await.map_err(|e| ClientError::from_reqwest(SERVICE, e))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl VisualService for OpenAiImages {
    async fn generate_visual(&self, prompt: &str) -> ClientResult<VisualAsset> {
        let request = ImageRequest {
            model: &self.model,
            prompt,
            size: IMAGE_SIZE,
            n: 1,
        };

        let response = self
            .client
            .post(format!("{}/images/generations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(SERVICE, e))?;
        let response = ensure_success(SERVICE, response).await?;

        let body: ImageResponse = response
            .json()
            .await
            .map_err(|e| ClientError::invalid_response(SERVICE, format!("undecodable body: {e}")))?;

        let data = match first_image(body)? {
            ImagePayload::Inline(b64) => base64::engine::general_purpose::STANDARD.decode(b64)?,
            ImagePayload::Remote(url) => self.download(&url).await?,
        };

        if data.is_empty() {
            return Err(ClientError::invalid_response(SERVICE, "empty image"));
        }

        debug!(model = %self.model, bytes = data.len(), "Generated image");
        Ok(VisualAsset::Image {
            mime: sniff_image_mime(&data).to_string(),
            data,
        })
    }
}

#[derive(Debug, PartialEq)]
enum ImagePayload {
    Inline(String),
    Remote(String),
}

fn first_image(body: ImageResponse) -> ClientResult<ImagePayload> {
    let image = body
        .data
        .into_iter()
        .next()
        .ok_or_else(|| ClientError::invalid_response(SERVICE, "no image in response"))?;

    match (image.b64_json, image.url) {
        (Some(b64), _) => Ok(ImagePayload::Inline(b64)),
        (None, Some(url)) => Ok(ImagePayload::Remote(url)),
        (None, None) => Err(ClientError::invalid_response(SERVICE, "image has neither data nor url")),
    }
}

fn sniff_image_mime(data: &[u8]) -> &'static str {
    match data {
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [0xFF, 0xD8, ..] => "image/jpeg",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ => "image/png",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefers_inline_data() {
        let body: ImageResponse =
            serde_json::from_str(r#"{"data": [{"b64_json": "aGk=", "url": "https://x/y.png"}]}"#).unwrap();
        assert_eq!(first_image(body).unwrap(), ImagePayload::Inline("aGk=".to_string()));

        let body: ImageResponse = serde_json::from_str(r#"{"data": [{"url": "https://x/y.png"}]}"#).unwrap();
        assert_eq!(first_image(body).unwrap(), ImagePayload::Remote("https://x/y.png".to_string()));
    }

    #[test]
    fn test_empty_data_is_invalid() {
        let body: ImageResponse = serde_json::from_str(r#"{"data": []}"#).unwrap();
        assert!(matches!(first_image(body), Err(ClientError::InvalidResponse { .. })));
    }

    #[test]
    fn test_sniff_mime() {
        assert_eq!(sniff_image_mime(&[0x89, b'P', b'N', b'G', 0x0D]), "image/png");
        assert_eq!(sniff_image_mime(&[0xFF, 0xD8, 0xFF]), "image/jpeg");
        assert_eq!(sniff_image_mime(b"RIFF\0\0\0\0WEBPVP8 "), "image/webp");
    }
}
