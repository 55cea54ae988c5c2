// ABOUTME: Shared server resources handed to every route through axum state
// ABOUTME: Builds the job store, LLM provider, source clients, and job runner from configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

//! # Server Resources
//!
//! Expensive collaborators are created once at startup and shared behind
//! `Arc`. Tests build the same container from fakes with
//! [`ServerResources::new`].

use crate::config::ServerConfig;
use crate::jobs::{create_job_store, JobRunner, JobStore, RunnerComponents};
use crate::llm::{LlmProvider, OpenAiCompatibleProvider};
use crate::recipe_service::RecipeService;
use crate::sources::{
    HttpTranscriptService, LinkResolver, OEmbedClient, SpeechToText, TranscriptProvider,
    VideoDownloader, WhisperTranscriber, YtDlpDownloader,
};
use clipchef_core::errors::{AppError, AppResult};
use clipchef_intelligence::NutritionConfig;
use std::sync::Arc;
use tracing::{info, warn};

/// Resources shared by all handlers
#[derive(Clone)]
pub struct ServerResources {
    /// Server configuration
    pub config: Arc<ServerConfig>,
    /// Job persistence
    pub store: Arc<dyn JobStore>,
    /// Background pipeline
    pub runner: JobRunner,
    /// LLM-backed recipe operations
    pub recipes: RecipeService,
}

impl ServerResources {
    /// Assemble resources from already-built parts
    #[must_use]
    pub fn new(config: Arc<ServerConfig>, runner: JobRunner) -> Self {
        Self {
            store: runner.store().clone(),
            recipes: runner.recipes().clone(),
            runner,
            config,
        }
    }

    /// Build production resources from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the job store or LLM client cannot be created
    pub async fn from_config(config: ServerConfig) -> AppResult<Self> {
        let config = Arc::new(config);
        let store = create_job_store(&config.storage).await?;

        let llm: Arc<dyn LlmProvider> =
            Arc::new(OpenAiCompatibleProvider::from_settings(&config.llm)?);
        let nutrition = NutritionConfig::default();
        nutrition
            .validate()
            .map_err(|e| AppError::config(e.to_string()))?;
        let recipes = RecipeService::new(llm, nutrition);

        let transcripts = config.sources.transcript_service.as_ref().map(|service| {
            Arc::new(HttpTranscriptService::new(service)) as Arc<dyn TranscriptProvider>
        });
        if transcripts.is_none() {
            warn!("TRANSCRIPT_SERVICE_URL not set; link jobs rely on speech-to-text or captions");
        }

        let asr = config
            .sources
            .asr
            .as_ref()
            .map(|asr| Arc::new(WhisperTranscriber::new(asr)) as Arc<dyn SpeechToText>);
        let downloader = asr.as_ref().map(|_| {
            Arc::new(YtDlpDownloader::new(
                config.sources.ytdlp_path.clone(),
                config.sources.download_timeout_secs,
            )) as Arc<dyn VideoDownloader>
        });

        info!(
            store = store.backend_name(),
            llm = recipes.llm().name(),
            transcript_service = transcripts.is_some(),
            speech_to_text = asr.is_some(),
            "Server resources initialized"
        );

        let runner = JobRunner::new(RunnerComponents {
            store,
            recipes,
            resolver: LinkResolver::new(),
            metadata: Arc::new(OEmbedClient::new()),
            transcripts,
            downloader,
            asr,
            work_dir: config.storage.work_dir(),
            stage_timeout_secs: config.limits.pipeline_stage_timeout_secs,
        });

        Ok(Self::new(config, runner))
    }
}
