// ABOUTME: Configuration management module for centralized server settings
// ABOUTME: Environment-only configuration with typed enums for provider and store selection
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

//! Configuration module for the Clipchef server
//!
//! - **Environment**: Server configuration from environment variables
//! - **Types**: Environment, LLM provider, and job store enums
//!
//! Nutrition coefficients live in `clipchef_intelligence::config`.

/// Environment and server configuration
pub mod environment;
/// Shared configuration enums
pub mod types;

pub use environment::{
    AsrConfig, LimitsConfig, LlmSettings, ServerConfig, SourcesConfig, StorageConfig,
    TranscriptServiceConfig,
};
pub use types::{Environment, JobStoreKind, LlmProviderType};
