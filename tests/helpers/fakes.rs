// ABOUTME: Scripted fakes for the LLM, transcript, metadata, download, and speech-to-text seams
// ABOUTME: Let pipeline and route tests run without any network or external binaries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

use async_trait::async_trait;
use clipchef_server::errors::AppError;
use clipchef_server::llm::{
    ChatRequest, ChatResponse, LlmCapabilities, LlmProvider, TokenUsage,
};
use clipchef_server::sources::{
    MetadataProvider, SpeechToText, Transcript, TranscriptProvider, VideoDownloader, VideoLink,
    VideoMetadata,
};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

/// LLM that replays queued responses and records every request
pub struct ScriptedLlm {
    capabilities: LlmCapabilities,
    responses: Mutex<VecDeque<Result<String, AppError>>>,
    requests: Mutex<Vec<ChatRequest>>,
    health_error: Mutex<Option<AppError>>,
    health_delay: Mutex<Option<Duration>>,
}

impl ScriptedLlm {
    /// Text-only provider with JSON mode
    pub fn new() -> Self {
        Self::with_capabilities(LlmCapabilities::text_only() | LlmCapabilities::JSON_MODE)
    }

    /// Provider that also accepts images
    pub fn with_vision() -> Self {
        Self::with_capabilities(LlmCapabilities::full_featured())
    }

    /// Provider with explicit capabilities
    pub fn with_capabilities(capabilities: LlmCapabilities) -> Self {
        Self {
            capabilities,
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            health_error: Mutex::new(None),
            health_delay: Mutex::new(None),
        }
    }

    /// Make the next `health_check` fail with the given error
    pub fn fail_health(&self, error: AppError) -> &Self {
        *self.health_error.lock().unwrap() = Some(error);
        self
    }

    /// Make `health_check` sleep before answering
    pub fn stall_health(&self, delay: Duration) -> &Self {
        *self.health_delay.lock().unwrap() = Some(delay);
        self
    }

    /// Queue a successful completion
    pub fn push(&self, content: impl Into<String>) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(content.into()));
        self
    }

    /// Queue a failed completion
    pub fn push_error(&self, error: AppError) -> &Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of completions served
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    fn name(&self) -> &str {
        "scripted"
    }

    fn display_name(&self) -> &str {
        "Scripted Test LLM"
    }

    fn capabilities(&self) -> LlmCapabilities {
        self.capabilities
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.responses.lock().unwrap().pop_front();
        let content = next.unwrap_or_else(|| {
            Err(AppError::external_service(
                "scripted",
                "no scripted response left",
            ))
        })?;
        Ok(ChatResponse {
            content,
            model: "scripted-model".to_owned(),
            usage: Some(TokenUsage {
                prompt_tokens: 10,
                completion_tokens: 20,
                total_tokens: 30,
            }),
            finish_reason: Some("stop".to_owned()),
        })
    }

    async fn health_check(&self) -> Result<bool, AppError> {
        let delay = *self.health_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.health_error.lock().unwrap().take() {
            Some(error) => Err(error),
            None => Ok(true),
        }
    }
}

/// Transcript provider with a fixed answer
pub struct FakeTranscripts {
    answer: Result<Option<Transcript>, AppError>,
    calls: Mutex<Vec<String>>,
}

impl FakeTranscripts {
    /// Always returns this transcript
    pub fn found(text: &str) -> Self {
        Self {
            answer: Ok(Some(Transcript::new(text).with_language("en"))),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Video has no transcript
    pub fn missing() -> Self {
        Self {
            answer: Ok(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Service is failing
    pub fn failing() -> Self {
        Self {
            answer: Err(AppError::external_service("transcripts", "HTTP 500")),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Normalized URLs requested so far
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TranscriptProvider for FakeTranscripts {
    fn name(&self) -> &str {
        "fake_transcripts"
    }

    async fn fetch(&self, link: &VideoLink) -> Result<Option<Transcript>, AppError> {
        self.calls.lock().unwrap().push(link.normalized.clone());
        match &self.answer {
            Ok(answer) => Ok(answer.clone()),
            Err(e) => Err(AppError::new(e.code, e.message.clone())),
        }
    }
}

/// Metadata provider with a fixed answer
pub struct FakeMetadata(pub Option<VideoMetadata>);

impl FakeMetadata {
    /// Metadata carrying a title
    pub fn titled(title: &str) -> Self {
        Self(Some(VideoMetadata {
            title: Some(title.to_owned()),
            author_name: Some("Test Kitchen".to_owned()),
            ..VideoMetadata::default()
        }))
    }
}

#[async_trait]
impl MetadataProvider for FakeMetadata {
    async fn fetch(&self, _link: &VideoLink) -> Option<VideoMetadata> {
        self.0.clone()
    }
}

/// Downloader that writes a small placeholder audio file
pub struct FakeDownloader {
    fail: bool,
}

impl FakeDownloader {
    /// Downloads succeed
    pub const fn working() -> Self {
        Self { fail: false }
    }

    /// Downloads fail
    pub const fn broken() -> Self {
        Self { fail: true }
    }
}

#[async_trait]
impl VideoDownloader for FakeDownloader {
    async fn download_audio(&self, _link: &VideoLink, work_dir: &Path) -> Result<PathBuf, AppError> {
        if self.fail {
            return Err(AppError::external_service("yt-dlp", "video unavailable"));
        }
        tokio::fs::create_dir_all(work_dir).await?;
        let path = work_dir.join("audio.m4a");
        tokio::fs::write(&path, b"fake audio").await?;
        Ok(path)
    }
}

/// Speech-to-text with a fixed transcript
pub struct FakeAsr {
    text: String,
    paths: Mutex<Vec<PathBuf>>,
}

impl FakeAsr {
    /// Always transcribes to `text`
    pub fn saying(text: &str) -> Self {
        Self {
            text: text.to_owned(),
            paths: Mutex::new(Vec::new()),
        }
    }

    /// Files transcribed so far
    pub fn paths(&self) -> Vec<PathBuf> {
        self.paths.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechToText for FakeAsr {
    fn name(&self) -> &str {
        "fake_asr"
    }

    async fn transcribe(&self, path: &Path) -> Result<Transcript, AppError> {
        self.paths.lock().unwrap().push(path.to_path_buf());
        Ok(Transcript::new(self.text.clone()))
    }
}
