// ABOUTME: Speech-to-text abstraction and Whisper-compatible transcription client
// ABOUTME: Posts audio as multipart form data to an OpenAI-compatible /audio/transcriptions endpoint
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

use super::transcript::Transcript;
use crate::config::AsrConfig;
use crate::utils::http_client::api_client;
use async_trait::async_trait;
use clipchef_core::errors::{AppError, ErrorCode};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use std::time::Instant;
use tokio::fs;
use tracing::{info, instrument};

/// Turns recorded speech into text
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &str;

    /// Transcribe the audio or video file at `path`
    async fn transcribe(&self, path: &Path) -> Result<Transcript, AppError>;
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
    #[serde(default)]
    language: Option<String>,
}

/// Whisper-style transcription over HTTP
#[derive(Clone)]
pub struct WhisperTranscriber {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl WhisperTranscriber {
    /// Create a transcriber from configuration
    #[must_use]
    pub fn new(config: &AsrConfig) -> Self {
        Self {
            client: api_client(),
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    fn mime_for(path: &Path) -> &'static str {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("mp3") => "audio/mpeg",
            Some("m4a") => "audio/mp4",
            Some("wav") => "audio/wav",
            Some("ogg" | "opus") => "audio/ogg",
            Some("webm") => "video/webm",
            Some("mp4" | "m4v") => "video/mp4",
            Some("mov") => "video/quicktime",
            _ => "application/octet-stream",
        }
    }
}

#[async_trait]
impl SpeechToText for WhisperTranscriber {
    fn name(&self) -> &str {
        "whisper"
    }

    #[instrument(skip(self), fields(model = %self.model, path = %path.display()))]
    async fn transcribe(&self, path: &Path) -> Result<Transcript, AppError> {
        let started = Instant::now();
        let bytes = fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("audio")
            .to_owned();

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(Self::mime_for(path))
            .map_err(|e| AppError::internal(format!("Invalid audio MIME type: {e}")))?;

        let form = Form::new()
            .part("file", part)
            .text("model", self.model.clone())
            .text("response_format", "json");

        let mut request = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .multipart(form);
        if let Some(ref api_key) = self.api_key {
            request = request.header("Authorization", format!("Bearer {api_key}"));
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::external_timeout("Speech-to-text", 300)
            } else {
                AppError::new(
                    ErrorCode::ExternalServiceUnavailable,
                    format!("Speech-to-text request failed: {e}"),
                )
            }
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AppError::external_service("Speech-to-text", format!("Failed to read body: {e}"))
        })?;

        if !status.is_success() {
            return Err(match status.as_u16() {
                401 | 403 => AppError::new(
                    ErrorCode::ExternalAuthFailed,
                    "Speech-to-text service rejected the API key",
                ),
                413 => AppError::external_service(
                    "Speech-to-text",
                    "Audio file is larger than the service accepts",
                ),
                429 => AppError::new(
                    ErrorCode::ExternalRateLimited,
                    "Speech-to-text rate limit exceeded",
                ),
                _ => AppError::external_service(
                    "Speech-to-text",
                    format!(
                        "HTTP {status}: {}",
                        body.chars().take(200).collect::<String>()
                    ),
                ),
            });
        }

        let parsed: TranscriptionResponse = serde_json::from_str(&body).map_err(|e| {
            AppError::external_service("Speech-to-text", format!("Unexpected response: {e}"))
        })?;

        let transcript = Transcript {
            text: parsed.text.trim().to_owned(),
            language: parsed.language,
        };

        info!(
            chars = transcript.text.len(),
            duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Audio transcribed"
        );

        if transcript.is_blank() {
            return Err(AppError::external_service(
                "Speech-to-text",
                "no speech detected in the audio",
            ));
        }
        Ok(transcript)
    }
}
