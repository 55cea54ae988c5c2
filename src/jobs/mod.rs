// ABOUTME: Asynchronous recipe ingestion jobs: record model, persistence, and background runner
// ABOUTME: Jobs are created by the API, processed by a spawned task, and polled by clients
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

/// Job record, status, and stage
pub mod model;
/// Background pipeline driver
pub mod runner;
/// Job persistence backends
pub mod store;

pub use model::{Job, JobSource, JobStage, JobStatus};
pub use runner::{JobRunner, RunnerComponents, INTERRUPTED_MESSAGE, NO_TRANSCRIPT_MESSAGE};
pub use store::{create_job_store, FileJobStore, JobStore, MemoryJobStore};
