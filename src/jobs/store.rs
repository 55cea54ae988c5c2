// ABOUTME: Job persistence behind an async trait with file-backed and in-memory backends
// ABOUTME: File store writes one JSON document per job atomically via temp file and rename
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

use super::model::Job;
use crate::config::{JobStoreKind, StorageConfig};
use async_trait::async_trait;
use clipchef_core::errors::{AppError, AppResult};
use dashmap::DashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Key-value storage for job records
///
/// Records are replaced whole on update. Only the runner task that owns a
/// job writes to it after creation, so backends need no compare-and-swap.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Backend name for logs and readiness
    fn backend_name(&self) -> &'static str;

    /// Persist a new job
    ///
    /// # Errors
    ///
    /// Returns an error if a job with the same id exists or storage fails
    async fn insert(&self, job: &Job) -> AppResult<()>;

    /// Load a job, `Ok(None)` if unknown
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be read or parsed
    async fn get(&self, id: Uuid) -> AppResult<Option<Job>>;

    /// Replace an existing job record
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` for unknown ids or an error if storage fails
    async fn update(&self, job: &Job) -> AppResult<()>;

    /// Most recently created jobs first, at most `limit`
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be enumerated
    async fn list_recent(&self, limit: usize) -> AppResult<Vec<Job>>;

    /// Confirm the backend is usable
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable
    async fn health_check(&self) -> AppResult<()>;

    /// Jobs that are still queued or processing
    ///
    /// # Errors
    ///
    /// Propagates [`JobStore::list_recent`] failures
    async fn list_unfinished(&self) -> AppResult<Vec<Job>> {
        let jobs = self.list_recent(usize::MAX).await?;
        Ok(jobs
            .into_iter()
            .filter(|job| !job.status.is_terminal())
            .collect())
    }
}

fn newest_first(jobs: &mut Vec<Job>, limit: usize) {
    jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    jobs.truncate(limit);
}

/// One JSON file per job under a directory
#[derive(Debug, Clone)]
pub struct FileJobStore {
    dir: PathBuf,
}

impl FileJobStore {
    /// Open (and create if needed) a store rooted at `dir`
    ///
    /// # Errors
    ///
    /// Returns a storage error if the directory cannot be created
    pub async fn open(dir: impl Into<PathBuf>) -> AppResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await.map_err(|e| {
            AppError::storage(format!(
                "Failed to create job directory {}: {e}",
                dir.display()
            ))
        })?;
        info!(dir = %dir.display(), "File job store ready");
        Ok(Self { dir })
    }

    /// Directory holding the job files
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    async fn write_atomic(&self, job: &Job) -> AppResult<()> {
        let body = serde_json::to_vec_pretty(job)?;
        let final_path = self.path_for(job.id);
        let temp_path = self.dir.join(format!(".{}.{}.tmp", job.id, Uuid::new_v4()));

        fs::write(&temp_path, &body).await.map_err(|e| {
            AppError::storage(format!("Failed to write job {}: {e}", job.id))
        })?;
        if let Err(e) = fs::rename(&temp_path, &final_path).await {
            if let Err(cleanup) = fs::remove_file(&temp_path).await {
                debug!(error = %cleanup, "Could not remove temp job file");
            }
            return Err(AppError::storage(format!(
                "Failed to commit job {}: {e}",
                job.id
            )));
        }
        Ok(())
    }

    async fn read(path: &Path) -> AppResult<Option<Job>> {
        match fs::read(path).await {
            Ok(bytes) => {
                let job = serde_json::from_slice(&bytes).map_err(|e| {
                    AppError::storage(format!("Corrupt job file {}: {e}", path.display()))
                })?;
                Ok(Some(job))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::storage(format!(
                "Failed to read {}: {e}",
                path.display()
            ))),
        }
    }
}

#[async_trait]
impl JobStore for FileJobStore {
    fn backend_name(&self) -> &'static str {
        "file"
    }

    async fn insert(&self, job: &Job) -> AppResult<()> {
        if fs::try_exists(self.path_for(job.id)).await? {
            return Err(AppError::storage(format!("Job {} already exists", job.id)));
        }
        self.write_atomic(job).await
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<Job>> {
        Self::read(&self.path_for(id)).await
    }

    async fn update(&self, job: &Job) -> AppResult<()> {
        if !fs::try_exists(self.path_for(job.id)).await? {
            return Err(AppError::not_found(format!("Job {}", job.id)));
        }
        self.write_atomic(job).await
    }

    async fn list_recent(&self, limit: usize) -> AppResult<Vec<Job>> {
        let mut entries = fs::read_dir(&self.dir).await.map_err(|e| {
            AppError::storage(format!("Failed to list {}: {e}", self.dir.display()))
        })?;

        let mut jobs = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_job_file = path.extension().is_some_and(|ext| ext == "json")
                && !path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with('.'));
            if !is_job_file {
                continue;
            }
            match Self::read(&path).await {
                Ok(Some(job)) => jobs.push(job),
                Ok(None) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable job file"),
            }
        }

        newest_first(&mut jobs, limit);
        Ok(jobs)
    }

    async fn health_check(&self) -> AppResult<()> {
        let metadata = fs::metadata(&self.dir).await.map_err(|e| {
            AppError::storage(format!("Job directory unavailable: {e}"))
        })?;
        if metadata.is_dir() {
            Ok(())
        } else {
            Err(AppError::storage(format!(
                "{} is not a directory",
                self.dir.display()
            )))
        }
    }
}

/// Process-local store, lost on restart
#[derive(Debug, Clone, Default)]
pub struct MemoryJobStore {
    jobs: Arc<DashMap<Uuid, Job>>,
}

impl MemoryJobStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored jobs
    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// True when no jobs are stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn insert(&self, job: &Job) -> AppResult<()> {
        match self.jobs.entry(job.id) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(AppError::storage(format!("Job {} already exists", job.id)))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(job.clone());
                Ok(())
            }
        }
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<Job>> {
        Ok(self.jobs.get(&id).map(|entry| entry.value().clone()))
    }

    async fn update(&self, job: &Job) -> AppResult<()> {
        let mut entry = self
            .jobs
            .get_mut(&job.id)
            .ok_or_else(|| AppError::not_found(format!("Job {}", job.id)))?;
        *entry = job.clone();
        Ok(())
    }

    async fn list_recent(&self, limit: usize) -> AppResult<Vec<Job>> {
        let mut jobs: Vec<Job> = self.jobs.iter().map(|entry| entry.value().clone()).collect();
        newest_first(&mut jobs, limit);
        Ok(jobs)
    }

    async fn health_check(&self) -> AppResult<()> {
        Ok(())
    }
}

/// Build the configured job store
///
/// # Errors
///
/// Returns an error if the file store directory cannot be created
pub async fn create_job_store(storage: &StorageConfig) -> AppResult<Arc<dyn JobStore>> {
    match storage.job_store {
        JobStoreKind::File => Ok(Arc::new(FileJobStore::open(storage.jobs_dir()).await?)),
        JobStoreKind::Memory => {
            warn!("Using in-memory job store; jobs are lost on restart");
            Ok(Arc::new(MemoryJobStore::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::model::JobSource;
    use crate::sources::VideoLink;

    fn sample_job() -> Job {
        let link = VideoLink::parse("https://www.youtube.com/shorts/dQw4w9WgXcQ").unwrap();
        Job::new(JobSource::from_link(&link), None)
    }

    #[tokio::test]
    async fn test_file_store_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileJobStore::open(dir.path()).await.unwrap();
        let mut job = sample_job();
        store.insert(&job).await.unwrap();
        job.start();
        store.update(&job).await.unwrap();

        let mut names = Vec::new();
        let mut entries = fs::read_dir(dir.path()).await.unwrap();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, vec![format!("{}.json", job.id)]);
    }

    #[tokio::test]
    async fn test_memory_store_rejects_duplicate_insert() {
        let store = MemoryJobStore::new();
        let job = sample_job();
        store.insert(&job).await.unwrap();
        assert!(store.insert(&job).await.is_err());
        assert_eq!(store.len(), 1);
    }
}
