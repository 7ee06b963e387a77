//! YouTube Data API publisher.
//!
//! Flow: refresh-token exchange, resumable upload session, single PUT of
//! the video bytes, then `thumbnails.set`. A failed thumbnail upload is
//! logged and does not fail the publish.

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use shorts_models::{AssembledVideo, PublishResult, Thumbnail};

use crate::config::ClientsConfig;
use crate::error::{ensure_success, ClientError, ClientResult};
use crate::traits::{PublishMetadata, PublishPlatform};

const SERVICE: &str = "youtube";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const UPLOAD_URL: &str = "https://www.googleapis.com/upload/youtube/v3/videos?uploadType=resumable&part=snippet,status";
const THUMBNAIL_URL: &str = "https://www.googleapis.com/upload/youtube/v3/thumbnails/set";
/// People & Blogs
const CATEGORY_ID: &str = "22";

const MAX_TITLE_CHARS: usize = 100;
const MAX_DESCRIPTION_CHARS: usize = 5000;
/// YouTube counts tags by their combined length
const MAX_TAGS_CHARS: usize = 500;

pub struct YouTubePublisher {
    client_id: String,
    client_secret: String,
    refresh_token: String,
    privacy_status: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Serialize)]
struct VideoResource<'a> {
    snippet: Snippet<'a>,
    status: Status<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Snippet<'a> {
    title: String,
    description: String,
    tags: Vec<&'a str>,
    category_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Status<'a> {
    privacy_status: &'a str,
    self_declared_made_for_kids: bool,
}

#[derive(Debug, Deserialize)]
struct UploadedVideo {
    id: String,
}

impl YouTubePublisher {
    pub fn new(config: &ClientsConfig, client: Client) -> ClientResult<Self> {
        let missing = |name: &str| ClientError::config(format!("{name} not set"));

        Ok(Self {
            client_id: config.youtube_client_id.clone().ok_or_else(|| missing("YOUTUBE_CLIENT_ID"))?,
            client_secret: config
                .youtube_client_secret
                .clone()
                .ok_or_else(|| missing("YOUTUBE_CLIENT_SECRET"))?,
            refresh_token: config
                .youtube_refresh_token
                .clone()
                .ok_or_else(|| missing("YOUTUBE_REFRESH_TOKEN"))?,
            privacy_status: config.youtube_privacy_status.clone(),
            client,
        })
    }

    async fn access_token(&self) -> ClientResult<String> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", self.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .client
            .post(TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(SERVICE, e))?;
        let response = ensure_success(SERVICE, response).await?;

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ClientError::invalid_response(SERVICE, format!("token response: {e}")))?;
        Ok(token.access_token)
    }

    async fn start_session(&self, token: &str, video: &AssembledVideo, metadata: &PublishMetadata) -> ClientResult<String> {
        let resource = video_resource(metadata, &self.privacy_status);

        let response = self
            .client
            .post(UPLOAD_URL)
            .bearer_auth(token)
            .header("X-Upload-Content-Type", video.container.mime())
            .header("X-Upload-Content-Length", video.data.len().to_string())
            .json(&resource)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(SERVICE, e))?;
        let response = ensure_success(SERVICE, response).await?;

        response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .ok_or_else(|| ClientError::invalid_response(SERVICE, "upload session has no Location header"))
    }

    async fn upload_bytes(&self, token: &str, session_url: &str, video: &AssembledVideo) -> ClientResult<String> {
        let response = self
            .client
            .put(session_url)
            .bearer_auth(token)
            .header(CONTENT_TYPE, video.container.mime())
            .body(video.data.clone())
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(SERVICE, e))?;
        let response = ensure_success(SERVICE, response).await?;

        let uploaded: UploadedVideo = response
            .json()
            .await
            .map_err(|e| ClientError::invalid_response(SERVICE, format!("upload response: {e}")))?;
        Ok(uploaded.id)
    }

    async fn set_thumbnail(&self, token: &str, video_id: &str, thumbnail: &Thumbnail) -> ClientResult<()> {
        let response = self
            .client
            .post(THUMBNAIL_URL)
            .query(&[("videoId", video_id)])
            .bearer_auth(token)
            .header(CONTENT_TYPE, thumbnail.mime.as_str())
            .body(thumbnail.data.clone())
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(SERVICE, e))?;
        ensure_success(SERVICE, response).await?;
        Ok(())
    }
}

#[async_trait]
impl PublishPlatform for YouTubePublisher {
    async fn publish(
        &self,
        video: &AssembledVideo,
        thumbnail: &Thumbnail,
        metadata: &PublishMetadata,
    ) -> ClientResult<PublishResult> {
        let token = self.access_token().await?;
        let session_url = self.start_session(&token, video, metadata).await?;
        let video_id = self.upload_bytes(&token, &session_url, video).await?;
        info!(video_id = %video_id, bytes = video.data.len(), "Uploaded video to YouTube");

        if let Err(e) = self.set_thumbnail(&token, &video_id, thumbnail).await {
            warn!(video_id = %video_id, error = %e, "Failed to set YouTube thumbnail");
        }

        Ok(PublishResult {
            url: shorts_url(&video_id),
            video_id,
        })
    }
}

pub fn shorts_url(video_id: &str) -> String {
    format!("https://www.youtube.com/shorts/{video_id}")
}

fn video_resource<'a>(metadata: &'a PublishMetadata, privacy_status: &'a str) -> VideoResource<'a> {
    VideoResource {
        snippet: Snippet {
            title: truncate_chars(&metadata.title, MAX_TITLE_CHARS),
            description: truncate_chars(&metadata.description, MAX_DESCRIPTION_CHARS),
            tags: fit_tags(&metadata.tags, MAX_TAGS_CHARS),
            category_id: CATEGORY_ID,
        },
        status: Status {
            privacy_status,
            self_declared_made_for_kids: false,
        },
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Keep tags in order while their combined length fits. Tags containing
/// spaces count two extra characters for the quotes YouTube adds.
fn fit_tags(tags: &[String], budget: usize) -> Vec<&str> {
    let mut used = 0;
    let mut kept = Vec::new();
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() {
            continue;
        }
        let quotes = if tag.contains(' ') { 2 } else { 0 };
        let separator = usize::from(!kept.is_empty());
        let cost = tag.chars().count() + quotes + separator;
        if used + cost > budget {
            break;
        }
        used += cost;
        kept.push(tag);
    }
    kept
}
