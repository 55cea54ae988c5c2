// ABOUTME: Background job runner that drives each job through the recipe ingestion pipeline
// ABOUTME: Resolves sources with transcript, speech-to-text, and caption fallbacks, then extracts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

//! # Job Runner
//!
//! Each submitted job gets one spawned task. The task is the only writer of
//! its job record after creation. Every stage runs under the configured
//! wall-clock deadline, and any error marks the job failed. Nothing is
//! retried.

use super::model::{Job, JobSource, JobStage};
use super::store::JobStore;
use crate::logging::AppLogger;
use crate::recipe_service::RecipeService;
use crate::sources::{
    image_mime_for, ImageAttachment, LinkResolver, MediaKind, MetadataProvider, SourceMaterial,
    SpeechToText, Transcript, TranscriptProvider, VideoDownloader, VideoLink, VideoMetadata,
};
use crate::utils::timeout::with_stage_timeout;
use clipchef_core::errors::{AppError, AppResult, ErrorCode};
use clipchef_intelligence::Recipe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Error recorded when a link yields neither transcript nor usable caption
pub const NO_TRANSCRIPT_MESSAGE: &str = "No transcript available for this video";

/// Error recorded for jobs that were running when the server stopped
pub const INTERRUPTED_MESSAGE: &str = "Interrupted by server restart";

/// Collaborators the runner needs
pub struct RunnerComponents {
    /// Job persistence
    pub store: Arc<dyn JobStore>,
    /// LLM-backed recipe operations
    pub recipes: RecipeService,
    /// Short-link expansion
    pub resolver: LinkResolver,
    /// oEmbed metadata
    pub metadata: Arc<dyn MetadataProvider>,
    /// Transcript service, when configured
    pub transcripts: Option<Arc<dyn TranscriptProvider>>,
    /// Audio downloader for the speech-to-text fallback
    pub downloader: Option<Arc<dyn VideoDownloader>>,
    /// Speech-to-text, when configured
    pub asr: Option<Arc<dyn SpeechToText>>,
    /// Scratch directory for downloaded media
    pub work_dir: PathBuf,
    /// Deadline applied to each pipeline stage
    pub stage_timeout_secs: u64,
}

/// Drives jobs from queued to completed or failed
#[derive(Clone)]
pub struct JobRunner {
    inner: Arc<RunnerComponents>,
}

impl JobRunner {
    /// Create a runner from its collaborators
    #[must_use]
    pub fn new(components: RunnerComponents) -> Self {
        Self {
            inner: Arc::new(components),
        }
    }

    /// The job store
    #[must_use]
    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.inner.store
    }

    /// The recipe service
    #[must_use]
    pub fn recipes(&self) -> &RecipeService {
        &self.inner.recipes
    }

    /// True if video uploads can be transcribed
    #[must_use]
    pub fn accepts_video_uploads(&self) -> bool {
        self.inner.asr.is_some()
    }

    /// Persist a queued job and start processing it in the background
    ///
    /// # Errors
    ///
    /// Returns an error if the job cannot be stored; nothing is spawned then.
    pub async fn submit(&self, job: Job) -> AppResult<Job> {
        self.inner.store.insert(&job).await?;
        AppLogger::log_job_submitted(
            &job.id.to_string(),
            job.source.kind(),
            &job.source.describe(),
        );

        let runner = self.clone();
        let job_id = job.id;
        tokio::spawn(async move {
            runner.run(job_id).await;
        });

        Ok(job)
    }

    /// Process one job to a terminal state
    ///
    /// Failures are recorded on the job and logged; this never returns an error.
    #[instrument(skip(self), fields(job.id = %job_id))]
    pub async fn run(&self, job_id: Uuid) {
        let mut job = match self.inner.store.get(job_id).await {
            Ok(Some(job)) => job,
            Ok(None) => {
                warn!("Job vanished before it could run");
                return;
            }
            Err(e) => {
                error!(error = %e, "Failed to load job");
                return;
            }
        };
        if job.status.is_terminal() {
            debug!(status = %job.status, "Job already finished");
            return;
        }

        job.start();
        let outcome = match self.inner.store.update(&job).await {
            Ok(()) => self.execute(&mut job).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(recipe) => job.complete(recipe),
            Err(e) => job.fail(e.message.clone()),
        }

        if let Err(e) = self.inner.store.update(&job).await {
            error!(error = %e, "Failed to persist finished job");
        }
        AppLogger::log_job_finished(
            &job.id.to_string(),
            job.error.is_none(),
            job.duration_ms().unwrap_or_default(),
            job.error.as_deref(),
        );
    }

    /// Mark jobs left queued or processing by a previous process as failed
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be listed or updated
    pub async fn recover_interrupted(&self) -> AppResult<usize> {
        let stale = self.inner.store.list_unfinished().await?;
        let count = stale.len();
        for mut job in stale {
            job.fail(INTERRUPTED_MESSAGE);
            self.inner.store.update(&job).await?;
        }
        if count > 0 {
            warn!(count, "Marked interrupted jobs as failed");
        }
        Ok(count)
    }

    async fn advance(&self, job: &mut Job, stage: JobStage) -> AppResult<()> {
        job.advance(stage);
        AppLogger::log_job_stage(&job.id.to_string(), stage.as_str());
        self.inner.store.update(job).await
    }

    async fn execute(&self, job: &mut Job) -> AppResult<Recipe> {
        let material = match job.source.clone() {
            JobSource::Link { url, .. } => self.material_from_link(job, &url).await?,
            JobSource::Upload {
                path,
                media_kind: MediaKind::Video,
                ..
            } => self.material_from_video(job, &path).await?,
            JobSource::Upload {
                path,
                media_kind: MediaKind::Image,
                original_filename,
                content_type,
            } => {
                Self::material_from_image(
                    &path,
                    original_filename.as_deref(),
                    content_type.as_deref(),
                )
                .await?
            }
        };
        let material = material.with_note(job.note.clone());
        let timeout_secs = self.inner.stage_timeout_secs;

        self.advance(job, JobStage::ExtractingRecipe).await?;
        let recipe = with_stage_timeout(
            JobStage::ExtractingRecipe.as_str(),
            timeout_secs,
            self.inner.recipes.extract_recipe(&material),
        )
        .await?;

        self.advance(job, JobStage::EstimatingMacros).await?;
        with_stage_timeout(
            JobStage::EstimatingMacros.as_str(),
            timeout_secs,
            self.inner.recipes.ensure_macros(recipe),
        )
        .await
    }

    async fn material_from_link(&self, job: &mut Job, url: &str) -> AppResult<SourceMaterial> {
        let timeout_secs = self.inner.stage_timeout_secs;
        let job_id = job.id.to_string();

        let parsed = VideoLink::parse(url)?;
        let link = with_stage_timeout(JobStage::ResolvingSource.as_str(), timeout_secs, async {
            Ok::<_, AppError>(self.inner.resolver.resolve(parsed).await)
        })
        .await?;
        if let JobSource::Link { normalized_url, .. } = &job.source {
            if *normalized_url != link.normalized {
                job.source = JobSource::Link {
                    url: url.to_owned(),
                    normalized_url: link.normalized.clone(),
                    platform: link.platform,
                };
            }
        }

        let metadata = with_stage_timeout("metadata", timeout_secs, async {
            Ok::<_, AppError>(self.inner.metadata.fetch(&link).await)
        })
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "Metadata lookup timed out");
            None
        });

        self.advance(job, JobStage::FetchingTranscript).await?;
        if let Some(transcript) = self.fetch_transcript(&job_id, &link).await {
            return Ok(SourceMaterial::from_transcript(
                transcript,
                metadata,
                Some(link.normalized),
            ));
        }

        if let Some(transcript) = self.transcribe_link_audio(job, &link).await? {
            return Ok(SourceMaterial::from_transcript(
                transcript,
                metadata,
                Some(link.normalized),
            ));
        }

        Self::caption_fallback(&job_id, metadata, link.normalized)
    }

    async fn fetch_transcript(&self, job_id: &str, link: &VideoLink) -> Option<Transcript> {
        let provider = self.inner.transcripts.as_ref()?;
        let fetched = with_stage_timeout(
            JobStage::FetchingTranscript.as_str(),
            self.inner.stage_timeout_secs,
            provider.fetch(link),
        )
        .await;

        match fetched {
            Ok(Some(transcript)) if !transcript.is_blank() => Some(transcript),
            Ok(_) => {
                info!(provider = provider.name(), "No transcript for video");
                None
            }
            Err(e) => {
                AppLogger::log_fallback(job_id, provider.name(), "speech_to_text", &e.message);
                None
            }
        }
    }

    /// Download audio and run speech-to-text, `Ok(None)` when unavailable
    async fn transcribe_link_audio(
        &self,
        job: &mut Job,
        link: &VideoLink,
    ) -> AppResult<Option<Transcript>> {
        let (Some(downloader), Some(asr)) = (&self.inner.downloader, &self.inner.asr) else {
            return Ok(None);
        };
        let timeout_secs = self.inner.stage_timeout_secs;
        let job_id = job.id.to_string();
        let work_dir = self.inner.work_dir.join(&job_id);

        self.advance(job, JobStage::DownloadingMedia).await?;
        let audio = with_stage_timeout(
            JobStage::DownloadingMedia.as_str(),
            timeout_secs,
            downloader.download_audio(link, &work_dir),
        )
        .await;

        let transcript = match audio {
            Ok(path) => {
                self.advance(job, JobStage::TranscribingAudio).await?;
                with_stage_timeout(
                    JobStage::TranscribingAudio.as_str(),
                    timeout_secs,
                    asr.transcribe(&path),
                )
                .await
            }
            Err(e) => Err(e),
        };

        remove_work_dir(&work_dir).await;

        match transcript {
            Ok(transcript) if !transcript.is_blank() => Ok(Some(transcript)),
            Ok(_) => {
                AppLogger::log_fallback(&job_id, asr.name(), "caption", "empty transcript");
                Ok(None)
            }
            Err(e) => {
                AppLogger::log_fallback(&job_id, asr.name(), "caption", &e.message);
                Ok(None)
            }
        }
    }

    fn caption_fallback(
        job_id: &str,
        metadata: Option<VideoMetadata>,
        source_url: String,
    ) -> AppResult<SourceMaterial> {
        metadata
            .and_then(|metadata| SourceMaterial::caption_only(metadata, Some(source_url)))
            .map(|material| {
                AppLogger::log_fallback(job_id, "transcript", "caption", "no transcript found");
                material
            })
            .ok_or_else(|| AppError::new(ErrorCode::ResourceNotFound, NO_TRANSCRIPT_MESSAGE))
    }

    async fn material_from_video(&self, job: &mut Job, path: &Path) -> AppResult<SourceMaterial> {
        let asr = self.inner.asr.as_ref().ok_or_else(|| {
            AppError::new(
                ErrorCode::ResourceUnavailable,
                "Speech-to-text is not configured; video uploads cannot be processed",
            )
        })?;

        self.advance(job, JobStage::TranscribingAudio).await?;
        let transcript = with_stage_timeout(
            JobStage::TranscribingAudio.as_str(),
            self.inner.stage_timeout_secs,
            asr.transcribe(path),
        )
        .await?;
        if transcript.is_blank() {
            return Err(AppError::new(
                ErrorCode::ResourceNotFound,
                "No speech was detected in the uploaded video",
            ));
        }
        Ok(SourceMaterial::from_uploaded_video(transcript))
    }

    async fn material_from_image(
        path: &Path,
        original_filename: Option<&str>,
        content_type: Option<&str>,
    ) -> AppResult<SourceMaterial> {
        let bytes = fs::read(path).await.map_err(|e| {
            AppError::storage(format!("Failed to read uploaded image: {e}"))
        })?;
        let mime = content_type
            .filter(|mime| mime.starts_with("image/"))
            .map_or_else(
                || {
                    image_mime_for(
                        original_filename
                            .or_else(|| path.file_name().and_then(|name| name.to_str()))
                            .unwrap_or_default(),
                    )
                    .to_owned()
                },
                ToOwned::to_owned,
            );
        Ok(SourceMaterial::from_image(ImageAttachment::from_bytes(
            mime, &bytes,
        )))
    }
}

async fn remove_work_dir(dir: &Path) {
    if let Err(e) = fs::remove_dir_all(dir).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            debug!(dir = %dir.display(), error = %e, "Could not clean work directory");
        }
    }
}
