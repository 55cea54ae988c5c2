// ABOUTME: Builds a full service stack over fakes and a temporary data directory
// ABOUTME: Exposes the router, runner, and job store plus polling helpers for async jobs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

use super::fakes::{FakeMetadata, ScriptedLlm};
use axum::Router;
use clipchef_intelligence::NutritionConfig;
use clipchef_server::config::{LlmProviderType, ServerConfig};
use clipchef_server::jobs::{Job, JobRunner, JobStore, MemoryJobStore, RunnerComponents};
use clipchef_server::recipe_service::RecipeService;
use clipchef_server::resources::ServerResources;
use clipchef_server::server::build_router;
use clipchef_server::sources::{
    LinkResolver, MetadataProvider, SpeechToText, TranscriptProvider, VideoDownloader,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use uuid::Uuid;

/// Builder for [`TestHarness`]
pub struct HarnessBuilder {
    llm: Arc<ScriptedLlm>,
    metadata: Arc<dyn MetadataProvider>,
    transcripts: Option<Arc<dyn TranscriptProvider>>,
    downloader: Option<Arc<dyn VideoDownloader>>,
    asr: Option<Arc<dyn SpeechToText>>,
    max_upload_bytes: u64,
    stage_timeout_secs: u64,
    request_timeout_secs: u64,
}

impl HarnessBuilder {
    pub fn llm(mut self, llm: Arc<ScriptedLlm>) -> Self {
        self.llm = llm;
        self
    }

    pub fn metadata(mut self, metadata: Arc<dyn MetadataProvider>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn transcripts(mut self, transcripts: Arc<dyn TranscriptProvider>) -> Self {
        self.transcripts = Some(transcripts);
        self
    }

    pub fn downloader(mut self, downloader: Arc<dyn VideoDownloader>) -> Self {
        self.downloader = Some(downloader);
        self
    }

    pub fn asr(mut self, asr: Arc<dyn SpeechToText>) -> Self {
        self.asr = Some(asr);
        self
    }

    pub const fn max_upload_bytes(mut self, bytes: u64) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    pub const fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    pub const fn stage_timeout_secs(mut self, secs: u64) -> Self {
        self.stage_timeout_secs = secs;
        self
    }

    pub fn build(self) -> TestHarness {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let mut config = ServerConfig::default();
        config.llm.provider = LlmProviderType::Ollama;
        config.storage.data_dir = temp_dir.path().to_path_buf();
        config.limits.max_upload_bytes = self.max_upload_bytes;
        config.limits.pipeline_stage_timeout_secs = self.stage_timeout_secs;
        config.limits.request_timeout_secs = self.request_timeout_secs;
        config.ensure_data_dirs().expect("Failed to create data dirs");
        let work_dir = config.storage.work_dir();

        let memory_store = Arc::new(MemoryJobStore::new());
        let store: Arc<dyn JobStore> = memory_store.clone();
        let recipes = RecipeService::new(self.llm.clone(), NutritionConfig::default());

        let runner = JobRunner::new(RunnerComponents {
            store,
            recipes,
            resolver: LinkResolver::new(),
            metadata: self.metadata,
            transcripts: self.transcripts,
            downloader: self.downloader,
            asr: self.asr,
            work_dir,
            stage_timeout_secs: self.stage_timeout_secs,
        });

        let resources = Arc::new(ServerResources::new(Arc::new(config), runner.clone()));

        TestHarness {
            llm: self.llm,
            store: memory_store,
            runner,
            resources,
            _temp_dir: temp_dir,
        }
    }
}

/// Service stack wired to fakes
pub struct TestHarness {
    pub llm: Arc<ScriptedLlm>,
    pub store: Arc<MemoryJobStore>,
    pub runner: JobRunner,
    pub resources: Arc<ServerResources>,
    _temp_dir: TempDir,
}

impl TestHarness {
    /// Text-only LLM, no transcript service, no ASR, metadata with a title
    pub fn builder() -> HarnessBuilder {
        HarnessBuilder {
            llm: Arc::new(ScriptedLlm::new()),
            metadata: Arc::new(FakeMetadata::titled("High protein chicken rice bowl")),
            transcripts: None,
            downloader: None,
            asr: None,
            max_upload_bytes: 1024 * 1024,
            stage_timeout_secs: 5,
            request_timeout_secs: 30,
        }
    }

    /// Full application router
    pub fn router(&self) -> Router {
        build_router(&self.resources)
    }

    /// Directory uploads are written to
    pub fn uploads_dir(&self) -> PathBuf {
        self.resources.config.storage.uploads_dir()
    }

    /// Directory downloads are staged in
    pub fn work_dir(&self) -> PathBuf {
        self.resources.config.storage.work_dir()
    }

    /// Insert a job and run it to completion on the current task
    pub async fn run_job(&self, job: Job) -> Job {
        let id = job.id;
        self.store.insert(&job).await.expect("insert job");
        self.runner.run(id).await;
        self.store
            .get(id)
            .await
            .expect("load job")
            .expect("job exists")
    }

    /// Poll until a spawned job reaches a terminal state
    pub async fn wait_for_terminal(&self, id: Uuid) -> Job {
        for _ in 0..500 {
            if let Some(job) = self.store.get(id).await.expect("load job") {
                if job.status.is_terminal() {
                    return job;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {id} did not finish in time");
    }
}
