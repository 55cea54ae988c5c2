// ABOUTME: Job record for asynchronous recipe ingestion with status and stage transitions
// ABOUTME: Transition helpers keep status, stage, and timestamps consistent
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

use crate::sources::{MediaKind, Platform, VideoLink};
use chrono::{DateTime, Utc};
use clipchef_intelligence::Recipe;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// Lifecycle state of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted, not yet picked up
    Queued,
    /// Pipeline is running
    Processing,
    /// Recipe is available
    Completed,
    /// Pipeline gave up; see `error`
    Failed,
}

impl JobStatus {
    /// String form used in API responses and logs
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// True once the job will not change again
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress detail within `Processing`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    /// Waiting for the runner
    Queued,
    /// Expanding the link and reading metadata
    ResolvingSource,
    /// Asking the transcript service
    FetchingTranscript,
    /// Downloading audio for speech-to-text
    DownloadingMedia,
    /// Running speech-to-text
    TranscribingAudio,
    /// LLM recipe extraction
    ExtractingRecipe,
    /// LLM macro estimation
    EstimatingMacros,
    /// Pipeline finished (successfully or not)
    Done,
}

impl JobStage {
    /// String form used in logs
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::ResolvingSource => "resolving_source",
            Self::FetchingTranscript => "fetching_transcript",
            Self::DownloadingMedia => "downloading_media",
            Self::TranscribingAudio => "transcribing_audio",
            Self::ExtractingRecipe => "extracting_recipe",
            Self::EstimatingMacros => "estimating_macros",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a job ingests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobSource {
    /// A pasted video link
    Link {
        /// URL as submitted
        url: String,
        /// Canonical URL after normalization (and short-link expansion)
        normalized_url: String,
        /// Detected platform
        platform: Platform,
    },
    /// A file uploaded with the request
    Upload {
        /// Where the file was stored on disk
        path: PathBuf,
        /// Video or image
        media_kind: MediaKind,
        /// Client-supplied file name
        #[serde(default, skip_serializing_if = "Option::is_none")]
        original_filename: Option<String>,
        /// Client-supplied content type
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content_type: Option<String>,
    },
}

impl JobSource {
    /// Source for a parsed link
    #[must_use]
    pub fn from_link(link: &VideoLink) -> Self {
        Self::Link {
            url: link.original.clone(),
            normalized_url: link.normalized.clone(),
            platform: link.platform,
        }
    }

    /// Short label for logs
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Link { .. } => "link",
            Self::Upload {
                media_kind: MediaKind::Video,
                ..
            } => "video_upload",
            Self::Upload {
                media_kind: MediaKind::Image,
                ..
            } => "image_upload",
        }
    }

    /// URL or file path, for logs
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Link { normalized_url, .. } => normalized_url.clone(),
            Self::Upload { path, .. } => path.display().to_string(),
        }
    }
}

/// One ingestion request and its outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Job identifier
    pub id: Uuid,
    /// Lifecycle state
    pub status: JobStatus,
    /// Progress detail
    pub stage: JobStage,
    /// Input reference
    pub source: JobSource,
    /// Free-text note from the submitter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Extracted recipe once completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Recipe>,
    /// Failure message once failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Submission time
    pub created_at: DateTime<Utc>,
    /// Last mutation time
    pub updated_at: DateTime<Utc>,
    /// When the runner picked the job up
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// When the job reached a terminal status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// New queued job
    #[must_use]
    pub fn new(source: JobSource, note: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            status: JobStatus::Queued,
            stage: JobStage::Queued,
            source,
            note: note
                .map(|note| note.trim().to_owned())
                .filter(|note| !note.is_empty()),
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
        }
    }

    /// Mark the job as picked up by the runner
    pub fn start(&mut self) {
        let now = Utc::now();
        self.status = JobStatus::Processing;
        self.stage = JobStage::ResolvingSource;
        self.started_at = Some(now);
        self.updated_at = now;
    }

    /// Record progress to a new stage
    pub fn advance(&mut self, stage: JobStage) {
        self.stage = stage;
        self.updated_at = Utc::now();
    }

    /// Finish with a recipe
    pub fn complete(&mut self, recipe: Recipe) {
        let now = Utc::now();
        self.status = JobStatus::Completed;
        self.stage = JobStage::Done;
        self.result = Some(recipe);
        self.error = None;
        self.completed_at = Some(now);
        self.updated_at = now;
    }

    /// Finish with an error message
    pub fn fail(&mut self, message: impl Into<String>) {
        let now = Utc::now();
        self.status = JobStatus::Failed;
        self.stage = JobStage::Done;
        self.result = None;
        self.error = Some(message.into());
        self.completed_at = Some(now);
        self.updated_at = now;
    }

    /// Wall-clock time from start to completion in milliseconds
    #[must_use]
    pub fn duration_ms(&self) -> Option<u64> {
        let started = self.started_at?;
        let finished = self.completed_at?;
        u64::try_from((finished - started).num_milliseconds()).ok()
    }
}
