// ABOUTME: oEmbed metadata lookups for YouTube and TikTok video links
// ABOUTME: Best-effort title and creator fetch; failures are logged and yield no metadata
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

use super::link::{Platform, VideoLink};
use crate::logging::AppLogger;
use crate::utils::http_client::shared_client;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, instrument, warn};

/// Public `YouTube` oEmbed endpoint
pub const YOUTUBE_OEMBED_URL: &str = "https://www.youtube.com/oembed";

/// Public `TikTok` oEmbed endpoint
pub const TIKTOK_OEMBED_URL: &str = "https://www.tiktok.com/oembed";

/// Public metadata about a video
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// Video title (on `TikTok` this is the caption)
    #[serde(default)]
    pub title: Option<String>,
    /// Creator display name
    #[serde(default)]
    pub author_name: Option<String>,
    /// Thumbnail image URL
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    /// Platform name as reported by the endpoint
    #[serde(default)]
    pub provider_name: Option<String>,
}

/// Source of video metadata for link jobs
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Fetch metadata, or `None` when the platform has none or the lookup fails
    async fn fetch(&self, link: &VideoLink) -> Option<VideoMetadata>;
}

/// oEmbed client for the platforms that publish an endpoint
#[derive(Clone)]
pub struct OEmbedClient {
    client: Client,
    youtube_endpoint: String,
    tiktok_endpoint: String,
}

impl Default for OEmbedClient {
    fn default() -> Self {
        Self::new()
    }
}

impl OEmbedClient {
    /// Client pointed at the public endpoints
    #[must_use]
    pub fn new() -> Self {
        Self::with_endpoints(YOUTUBE_OEMBED_URL, TIKTOK_OEMBED_URL)
    }

    /// Client pointed at custom endpoints
    #[must_use]
    pub fn with_endpoints(youtube: impl Into<String>, tiktok: impl Into<String>) -> Self {
        Self {
            client: shared_client().clone(),
            youtube_endpoint: youtube.into(),
            tiktok_endpoint: tiktok.into(),
        }
    }

    fn endpoint_for(&self, platform: Platform) -> Option<&str> {
        match platform {
            Platform::YouTube => Some(self.youtube_endpoint.as_str()),
            Platform::TikTok => Some(self.tiktok_endpoint.as_str()),
            Platform::Instagram | Platform::Other => None,
        }
    }
}

#[async_trait]
impl MetadataProvider for OEmbedClient {
    #[instrument(skip(self), fields(url = %link.normalized, platform = %link.platform))]
    async fn fetch(&self, link: &VideoLink) -> Option<VideoMetadata> {
        let endpoint = self.endpoint_for(link.platform)?;
        let started = Instant::now();

        let result = self
            .client
            .get(endpoint)
            .query(&[("url", link.normalized.as_str()), ("format", "json")])
            .send()
            .await;

        let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let response = match result {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                warn!(status = %response.status(), "oEmbed lookup rejected");
                AppLogger::log_source_fetch("oembed", &link.normalized, false, elapsed);
                return None;
            }
            Err(e) => {
                warn!(error = %e, "oEmbed lookup failed");
                AppLogger::log_source_fetch("oembed", &link.normalized, false, elapsed);
                return None;
            }
        };

        match response.json::<VideoMetadata>().await {
            Ok(metadata) => {
                debug!(title = ?metadata.title, "oEmbed metadata received");
                AppLogger::log_source_fetch("oembed", &link.normalized, true, elapsed);
                Some(metadata)
            }
            Err(e) => {
                warn!(error = %e, "oEmbed response was not valid JSON");
                AppLogger::log_source_fetch("oembed", &link.normalized, false, elapsed);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_instagram_has_no_endpoint() {
        let client = OEmbedClient::new();
        let link = VideoLink::parse("https://www.instagram.com/reel/Cabc123/").unwrap();
        assert!(client.fetch(&link).await.is_none());
    }

    #[test]
    fn test_metadata_tolerates_missing_fields() {
        let metadata: VideoMetadata =
            serde_json::from_str(r#"{"title":"Crispy tofu","version":"1.0"}"#).unwrap();
        assert_eq!(metadata.title.as_deref(), Some("Crispy tofu"));
        assert!(metadata.author_name.is_none());
    }
}
