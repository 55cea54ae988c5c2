// ABOUTME: Main library entry point for the Clipchef recipe API server
// ABOUTME: Turns cooking videos, links, and photos into recipes with macros and goal variants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

#![deny(unsafe_code)]

//! # Clipchef Server
//!
//! An HTTP API that ingests a cooking video link, an uploaded video, or a
//! photo, and produces a structured recipe with estimated macros. Ingestion
//! runs as a background job the client polls. Completed recipes can be
//! re-estimated, rewritten for a nutrition goal (bulk, lean bulk, cut,
//! maintain), or checked against dietary conditions.
//!
//! ## Architecture
//!
//! - **sources**: link normalization, oEmbed metadata, transcripts, audio download, speech-to-text
//! - **llm**: `OpenAI`-compatible chat provider and prompt templates
//! - **`recipe_service`**: LLM extraction and estimation checked by `clipchef_intelligence`
//! - **jobs**: job records, file/memory stores, and the background runner
//! - **routes**: axum handlers; **server** assembles them with tower-http layers
//!
//! The deterministic nutrition math lives in the `clipchef-intelligence`
//! crate and the shared error type in `clipchef-core`.

/// Environment-based configuration
pub mod config;
/// Ingestion jobs: model, storage, and runner
pub mod jobs;
/// LLM provider abstraction
pub mod llm;
/// Structured logging setup and helpers
pub mod logging;
/// HTTP middleware
pub mod middleware;
/// LLM-backed recipe operations
pub mod recipe_service;
/// Shared server resources
pub mod resources;
/// HTTP routes
pub mod routes;
/// Server assembly and lifecycle
pub mod server;
/// Video and media source resolution
pub mod sources;
/// HTTP client and timeout utilities
pub mod utils;

pub use clipchef_core::errors;
