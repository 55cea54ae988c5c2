// ABOUTME: Core configuration type definitions for environment, LLM provider, and job store
// ABOUTME: Contains Environment, LlmProviderType, and JobStoreKind enums used across config modules
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Deployment environment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development (default)
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development, // Default fallback (including "development")
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// LLM backend used for recipe extraction and macro estimates
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderType {
    /// `OpenAI` hosted API (default)
    #[default]
    OpenAi,
    /// Groq `OpenAI`-compatible API
    Groq,
    /// Local Ollama server
    Ollama,
    /// Any other `OpenAI`-compatible endpoint (vLLM, `LocalAI`)
    Local,
}

impl LlmProviderType {
    /// Environment variable name for LLM provider selection
    pub const ENV_VAR: &'static str = "LLM_PROVIDER";

    /// Parse from string with fallback to default
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "groq" => Self::Groq,
            "ollama" => Self::Ollama,
            "local" | "vllm" | "localai" => Self::Local,
            _ => Self::OpenAi, // Default fallback (including "openai")
        }
    }

    /// Default base URL for the provider's `OpenAI`-compatible API
    #[must_use]
    pub const fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Groq => "https://api.groq.com/openai/v1",
            Self::Ollama => "http://localhost:11434/v1",
            Self::Local => "http://localhost:8000/v1",
        }
    }

    /// Default model for the provider
    #[must_use]
    pub const fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o-mini",
            Self::Groq => "llama-3.3-70b-versatile",
            Self::Ollama => "llama3.2-vision",
            Self::Local => "default",
        }
    }

    /// Hosted providers reject requests without a key
    #[must_use]
    pub const fn requires_api_key(&self) -> bool {
        matches!(self, Self::OpenAi | Self::Groq)
    }
}

impl Display for LlmProviderType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::OpenAi => write!(f, "openai"),
            Self::Groq => write!(f, "groq"),
            Self::Ollama => write!(f, "ollama"),
            Self::Local => write!(f, "local"),
        }
    }
}

/// Backing store for job records
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobStoreKind {
    /// One JSON file per job under `DATA_DIR/jobs` (default)
    #[default]
    File,
    /// In-process map, lost on restart
    Memory,
}

impl JobStoreKind {
    /// Parse from string with fallback to default
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "memory" | "mem" => Self::Memory,
            _ => Self::File,
        }
    }
}

impl Display for JobStoreKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::File => write!(f, "file"),
            Self::Memory => write!(f, "memory"),
        }
    }
}
