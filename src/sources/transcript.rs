// ABOUTME: Transcript provider abstraction and the third-party HTTP transcript service client
// ABOUTME: Accepts plain-text or segmented transcript payloads and maps 404 to "no transcript"
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

use super::link::VideoLink;
use crate::config::TranscriptServiceConfig;
use crate::logging::AppLogger;
use crate::utils::http_client::api_client;
use async_trait::async_trait;
use clipchef_core::errors::{AppError, ErrorCode};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, instrument};

/// Spoken text recovered from a video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    /// Full transcript text
    pub text: String,
    /// Language code when the provider reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl Transcript {
    /// Transcript with unknown language
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: None,
        }
    }

    /// Set the language code
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// True when there is no usable text
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Source of transcripts for link jobs
#[async_trait]
pub trait TranscriptProvider: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &str;

    /// Fetch the transcript for a link
    ///
    /// `Ok(None)` means the video has no transcript; errors are transport or
    /// upstream failures.
    async fn fetch(&self, link: &VideoLink) -> Result<Option<Transcript>, AppError>;
}

/// Transcript body: a plain string or a list of timed segments
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TranscriptBody {
    Plain(String),
    Segments(Vec<TranscriptSegment>),
}

#[derive(Debug, Deserialize)]
struct TranscriptSegment {
    text: String,
}

impl TranscriptBody {
    fn into_text(self) -> String {
        match self {
            Self::Plain(text) => text,
            Self::Segments(segments) => segments
                .into_iter()
                .map(|segment| segment.text.trim().to_owned())
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptPayload {
    #[serde(default)]
    text: Option<TranscriptBody>,
    #[serde(default)]
    transcript: Option<TranscriptBody>,
    #[serde(default, alias = "lang")]
    language: Option<String>,
}

impl TranscriptPayload {
    fn into_transcript(self) -> Option<Transcript> {
        let text = self.text.or(self.transcript)?.into_text();
        let transcript = Transcript {
            text: text.trim().to_owned(),
            language: self.language.filter(|l| !l.is_empty()),
        };
        (!transcript.is_blank()).then_some(transcript)
    }
}

/// Client for a third-party transcript API
///
/// Calls `GET {base_url}/transcript?url=<normalized>` with an `x-api-key`
/// header.
#[derive(Clone)]
pub struct HttpTranscriptService {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpTranscriptService {
    /// Create a client from configuration
    #[must_use]
    pub fn new(config: &TranscriptServiceConfig) -> Self {
        Self {
            client: api_client(),
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
        }
    }

    fn map_status(status: StatusCode, body: &str) -> AppError {
        let snippet: String = body.chars().take(200).collect();
        match status.as_u16() {
            401 | 403 => AppError::new(
                ErrorCode::ExternalAuthFailed,
                "Transcript service rejected the API key",
            ),
            429 => AppError::new(
                ErrorCode::ExternalRateLimited,
                "Transcript service rate limit exceeded",
            ),
            502..=504 => AppError::new(
                ErrorCode::ExternalServiceUnavailable,
                format!("Transcript service unavailable ({status})"),
            ),
            _ => AppError::external_service(
                "Transcript service",
                format!("HTTP {status}: {snippet}"),
            ),
        }
    }
}

#[async_trait]
impl TranscriptProvider for HttpTranscriptService {
    fn name(&self) -> &str {
        "transcript_service"
    }

    #[instrument(skip(self), fields(url = %link.normalized))]
    async fn fetch(&self, link: &VideoLink) -> Result<Option<Transcript>, AppError> {
        let started = Instant::now();

        let mut request = self
            .client
            .get(format!("{}/transcript", self.base_url))
            .query(&[("url", link.normalized.as_str())]);
        if let Some(ref api_key) = self.api_key {
            request = request.header("x-api-key", api_key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::external_timeout("Transcript service", 300)
            } else {
                AppError::new(
                    ErrorCode::ExternalServiceUnavailable,
                    format!("Transcript service request failed: {e}"),
                )
            }
        })?;

        let status = response.status();
        let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        if status == StatusCode::NOT_FOUND {
            AppLogger::log_source_fetch("transcript", &link.normalized, false, elapsed);
            return Ok(None);
        }

        let body = response.text().await.map_err(|e| {
            AppError::external_service("Transcript service", format!("Failed to read body: {e}"))
        })?;

        if !status.is_success() {
            return Err(Self::map_status(status, &body));
        }

        let payload: TranscriptPayload = serde_json::from_str(&body).map_err(|e| {
            AppError::external_service(
                "Transcript service",
                format!("Unexpected response format: {e}"),
            )
        })?;

        let transcript = payload.into_transcript();
        debug!(
            chars = transcript.as_ref().map_or(0, |t| t.text.len()),
            "Transcript service responded"
        );
        AppLogger::log_source_fetch(
            "transcript",
            &link.normalized,
            transcript.is_some(),
            elapsed,
        );
        Ok(transcript)
    }
}
