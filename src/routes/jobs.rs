// ABOUTME: Route handlers for recipe job submission, upload, and status polling
// ABOUTME: Accepts links or multipart media, stores a queued job, and hands it to the runner
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

//! Job routes
//!
//! Submissions answer `202 Accepted` immediately with a poll URL; the
//! pipeline runs in the background and the client polls `GET /api/jobs/:id`.

use super::json_body;
use crate::jobs::{Job, JobSource, JobStatus};
use crate::middleware::json_payload_too_large;
use crate::resources::ServerResources;
use crate::sources::{MediaKind, VideoLink};
use axum::{
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        rejection::JsonRejection,
        DefaultBodyLimit, Multipart, Path, Query, State,
    },
    http::StatusCode,
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use clipchef_core::constants::limits::{
    DEFAULT_JOB_LIST_LIMIT, MAX_JOB_LIST_LIMIT, MAX_NOTE_LENGTH, MAX_URL_LENGTH,
};
use clipchef_core::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{debug, info};
use uuid::Uuid;

/// Allowance for multipart boundaries and the note field on top of the file limit
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Request body for `POST /api/jobs`
#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    /// Video link to ingest
    pub url: String,
    /// Optional free-text note passed to extraction
    #[serde(default)]
    pub note: Option<String>,
}

/// Response for an accepted submission
#[derive(Debug, Serialize, Deserialize)]
pub struct JobAccepted {
    /// New job id
    pub job_id: Uuid,
    /// Always `queued`
    pub status: JobStatus,
    /// Where to poll for the result
    pub poll_url: String,
}

impl From<&Job> for JobAccepted {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.id,
            status: job.status,
            poll_url: format!("/api/jobs/{}", job.id),
        }
    }
}

/// Query parameters for `GET /api/jobs`
#[derive(Debug, Deserialize, Default)]
pub struct ListJobsQuery {
    /// Maximum number of jobs to return
    pub limit: Option<usize>,
}

/// Response for `GET /api/jobs`
#[derive(Debug, Serialize, Deserialize)]
pub struct ListJobsResponse {
    /// Most recent jobs first
    pub jobs: Vec<Job>,
    /// Number of jobs returned
    pub count: usize,
}

/// A media file written to the uploads directory
#[derive(Debug)]
struct StoredUpload {
    path: PathBuf,
    media_kind: MediaKind,
    original_filename: Option<String>,
    content_type: Option<String>,
    size: u64,
}

/// Job routes handler
pub struct JobRoutes;

impl JobRoutes {
    /// Link submission and polling routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/jobs", post(Self::handle_create).get(Self::handle_list))
            .route("/api/jobs/:id", get(Self::handle_get))
            .with_state(resources)
    }

    /// Multipart upload route, limited to the configured upload size
    pub fn upload_routes(resources: Arc<ServerResources>) -> Router {
        let max_upload_bytes = resources.config.limits.max_upload_bytes;
        let body_limit = usize::try_from(max_upload_bytes)
            .unwrap_or(usize::MAX)
            .saturating_add(MULTIPART_OVERHEAD_BYTES);

        Router::new()
            .route("/api/jobs/upload", post(Self::handle_upload))
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(body_limit))
            .layer(from_fn_with_state(max_upload_bytes, json_payload_too_large))
            .with_state(resources)
    }

    fn validate_note(note: Option<String>) -> AppResult<Option<String>> {
        match note {
            Some(note) if note.chars().count() > MAX_NOTE_LENGTH => Err(AppError::invalid_input(
                format!("note must be at most {MAX_NOTE_LENGTH} characters"),
            )),
            other => Ok(other),
        }
    }

    fn accepted(job: &Job) -> Response {
        (StatusCode::ACCEPTED, Json(JobAccepted::from(job))).into_response()
    }

    /// Handle POST /api/jobs - Submit a video link
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        payload: Result<Json<CreateJobRequest>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let request = json_body(payload)?;
        if request.url.len() > MAX_URL_LENGTH {
            return Err(AppError::invalid_input(format!(
                "url must be at most {MAX_URL_LENGTH} bytes"
            )));
        }
        let note = Self::validate_note(request.note)?;
        let link = VideoLink::parse(&request.url)?;

        let job = resources
            .runner
            .submit(Job::new(JobSource::from_link(&link), note))
            .await?;
        Ok(Self::accepted(&job))
    }

    /// Handle POST /api/jobs/upload - Submit a video or image file
    async fn handle_upload(
        State(resources): State<Arc<ServerResources>>,
        multipart: Result<Multipart, MultipartRejection>,
    ) -> Result<Response, AppError> {
        let mut multipart =
            multipart.map_err(|rejection| AppError::invalid_input(rejection.body_text()))?;
        let uploads_dir = resources.config.storage.uploads_dir();
        let max_bytes = resources.config.limits.max_upload_bytes;

        let mut stored: Option<StoredUpload> = None;
        let mut note: Option<String> = None;
        let read = Self::read_fields(
            &mut multipart,
            &uploads_dir,
            max_bytes,
            &mut stored,
            &mut note,
        )
        .await;

        let outcome = match (read, stored) {
            (Err(e), stored) => Err((e, stored)),
            (Ok(()), None) => Err((AppError::missing_field("file"), None)),
            (Ok(()), Some(upload)) => match Self::validate_note(note) {
                Ok(note) => Ok((upload, note)),
                Err(e) => Err((e, Some(upload))),
            },
        };

        let (upload, note) = match outcome {
            Ok(parts) => parts,
            Err((e, stored)) => {
                if let Some(upload) = stored {
                    discard(&upload.path).await;
                }
                return Err(e);
            }
        };

        info!(
            media_kind = %upload.media_kind,
            size = upload.size,
            "Upload stored"
        );
        let source = JobSource::Upload {
            path: upload.path.clone(),
            media_kind: upload.media_kind,
            original_filename: upload.original_filename,
            content_type: upload.content_type,
        };
        match resources.runner.submit(Job::new(source, note)).await {
            Ok(job) => Ok(Self::accepted(&job)),
            Err(e) => {
                discard(&upload.path).await;
                Err(e)
            }
        }
    }

    async fn read_fields(
        multipart: &mut Multipart,
        uploads_dir: &FsPath,
        max_bytes: u64,
        stored: &mut Option<StoredUpload>,
        note: &mut Option<String>,
    ) -> AppResult<()> {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(&e, max_bytes))?
        {
            let name = field.name().map(ToOwned::to_owned);
            match name.as_deref() {
                Some("file") => {
                    if stored.is_some() {
                        return Err(AppError::invalid_input("Only one file may be uploaded"));
                    }
                    *stored = Some(save_field(field, uploads_dir, max_bytes).await?);
                }
                Some("note") => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| multipart_error(&e, max_bytes))?;
                    *note = Some(text);
                }
                other => debug!(field = ?other, "Ignoring unknown multipart field"),
            }
        }
        Ok(())
    }

    /// Handle GET /api/jobs/:id - Poll a job
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let job_id = Uuid::parse_str(id.trim())
            .map_err(|_| AppError::invalid_input(format!("'{id}' is not a valid job id")))?;
        let job = resources
            .store
            .get(job_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Job {job_id}")).with_resource_id(id))?;
        Ok((StatusCode::OK, Json(job)).into_response())
    }

    /// Handle GET /api/jobs - Recent jobs
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        Query(query): Query<ListJobsQuery>,
    ) -> Result<Response, AppError> {
        let limit = query
            .limit
            .unwrap_or(DEFAULT_JOB_LIST_LIMIT)
            .clamp(1, MAX_JOB_LIST_LIMIT);
        let jobs = resources.store.list_recent(limit).await?;
        let response = ListJobsResponse {
            count: jobs.len(),
            jobs,
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }
}

fn multipart_error(error: &MultipartError, max_bytes: u64) -> AppError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::payload_too_large(max_bytes)
    } else {
        AppError::invalid_input(format!("Malformed multipart body: {}", error.body_text()))
    }
}

/// Keep a short alphanumeric extension so downstream MIME sniffing still works
fn safe_extension(filename: Option<&str>, kind: MediaKind) -> String {
    filename
        .and_then(|name| FsPath::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|ext| ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| match kind {
            MediaKind::Video => "mp4".to_owned(),
            MediaKind::Image => "jpg".to_owned(),
        })
}

async fn save_field(
    mut field: Field<'_>,
    uploads_dir: &FsPath,
    max_bytes: u64,
) -> AppResult<StoredUpload> {
    let original_filename = field.file_name().map(ToOwned::to_owned);
    let content_type = field.content_type().map(ToOwned::to_owned);
    let media_kind = MediaKind::detect(content_type.as_deref(), original_filename.as_deref())?;

    fs::create_dir_all(uploads_dir).await?;
    let extension = safe_extension(original_filename.as_deref(), media_kind);
    let path = uploads_dir.join(format!("{}.{extension}", Uuid::new_v4()));

    let written = write_chunks(&mut field, &path, max_bytes).await;
    let size = match written {
        Ok(0) => {
            discard(&path).await;
            return Err(AppError::invalid_input("Uploaded file is empty"));
        }
        Ok(size) => size,
        Err(e) => {
            discard(&path).await;
            return Err(e);
        }
    };

    Ok(StoredUpload {
        path,
        media_kind,
        original_filename,
        content_type,
        size,
    })
}

async fn write_chunks(field: &mut Field<'_>, path: &FsPath, max_bytes: u64) -> AppResult<u64> {
    let mut file = fs::File::create(path).await?;
    let mut written: u64 = 0;

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| multipart_error(&e, max_bytes))?
    {
        written = written.saturating_add(chunk.len() as u64);
        if written > max_bytes {
            return Err(AppError::payload_too_large(max_bytes));
        }
        file.write_all(&chunk).await?;
    }

    file.flush().await?;
    Ok(written)
}

async fn discard(path: &FsPath) {
    if let Err(e) = fs::remove_file(path).await {
        debug!(path = %path.display(), error = %e, "Could not remove rejected upload");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_extension() {
        assert_eq!(safe_extension(Some("Dinner.MOV"), MediaKind::Video), "mov");
        assert_eq!(safe_extension(Some("../../etc/passwd"), MediaKind::Image), "jpg");
        assert_eq!(safe_extension(Some("a.p/ng"), MediaKind::Image), "jpg");
        assert_eq!(safe_extension(None, MediaKind::Video), "mp4");
    }
}
