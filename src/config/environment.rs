// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Reads server, storage, LLM, transcript, and ASR settings from environment variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

//! Environment-based configuration management for production deployment

use super::types::{Environment, JobStoreKind, LlmProviderType};
use anyhow::{anyhow, Context, Result};
use clipchef_core::constants::{defaults, limits};
use serde::{Deserialize, Serialize};
use std::env;
use std::error::Error as StdError;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Complete server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind host
    pub host: String,
    /// HTTP API port
    pub http_port: u16,
    /// Deployment environment
    pub environment: Environment,
    /// Job store and file locations
    pub storage: StorageConfig,
    /// Request and pipeline limits
    pub limits: LimitsConfig,
    /// Allowed CORS origins (`*` allows any)
    pub cors_allowed_origins: Vec<String>,
    /// LLM provider settings
    pub llm: LlmSettings,
    /// Transcript, download, and speech-to-text settings
    pub sources: SourcesConfig,
    /// Meals per day used when splitting daily targets
    pub meals_per_day: u8,
}

/// Job store and data directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root data directory
    pub data_dir: PathBuf,
    /// Job store backend
    pub job_store: JobStoreKind,
}

impl StorageConfig {
    /// Directory holding one JSON file per job
    #[must_use]
    pub fn jobs_dir(&self) -> PathBuf {
        self.data_dir.join("jobs")
    }

    /// Directory holding uploaded media
    #[must_use]
    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }

    /// Scratch directory for downloads and extracted audio
    #[must_use]
    pub fn work_dir(&self) -> PathBuf {
        self.data_dir.join("work")
    }
}

/// Request size and timeout limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Largest accepted upload, in bytes
    pub max_upload_bytes: u64,
    /// Timeout for synchronous API requests
    pub request_timeout_secs: u64,
    /// Deadline for a single pipeline stage
    pub pipeline_stage_timeout_secs: u64,
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Provider preset
    pub provider: LlmProviderType,
    /// Base URL override
    pub base_url: Option<String>,
    /// API key (never logged)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Model override
    pub model: Option<String>,
    /// Sampling temperature
    pub temperature: f32,
}

impl LlmSettings {
    /// Base URL, falling back to the provider preset
    #[must_use]
    pub fn effective_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
    }

    /// Model, falling back to the provider preset
    #[must_use]
    pub fn effective_model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }
}

/// Third-party transcript service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptServiceConfig {
    /// Service base URL
    pub base_url: String,
    /// API key sent as `x-api-key`
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

/// `OpenAI`-compatible speech-to-text endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsrConfig {
    /// API base URL (`/audio/transcriptions` is appended)
    pub base_url: String,
    /// API key
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Transcription model
    pub model: String,
}

/// Source acquisition configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Transcript service, if configured
    pub transcript_service: Option<TranscriptServiceConfig>,
    /// Speech-to-text, if configured
    pub asr: Option<AsrConfig>,
    /// yt-dlp executable
    pub ytdlp_path: String,
    /// Deadline for a media download
    pub download_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::HOST.to_owned(),
            http_port: defaults::HTTP_PORT,
            environment: Environment::default(),
            storage: StorageConfig {
                data_dir: PathBuf::from(defaults::DATA_DIR),
                job_store: JobStoreKind::default(),
            },
            limits: LimitsConfig {
                max_upload_bytes: defaults::MAX_UPLOAD_MB * BYTES_PER_MB,
                request_timeout_secs: defaults::REQUEST_TIMEOUT_SECS,
                pipeline_stage_timeout_secs: defaults::PIPELINE_STAGE_TIMEOUT_SECS,
            },
            cors_allowed_origins: vec!["*".to_owned()],
            llm: LlmSettings {
                provider: LlmProviderType::default(),
                base_url: None,
                api_key: None,
                model: None,
                temperature: defaults::LLM_TEMPERATURE,
            },
            sources: SourcesConfig {
                transcript_service: None,
                asr: None,
                ytdlp_path: defaults::YTDLP_PATH.to_owned(),
                download_timeout_secs: defaults::DOWNLOAD_TIMEOUT_SECS,
            },
            meals_per_day: defaults::MEALS_PER_DAY,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable cannot be parsed or validation fails
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        // Load .env file if it exists
        if let Err(e) = dotenvy::dotenv() {
            warn!("No .env file found or failed to load: {}", e);
        }

        let llm_provider = LlmProviderType::from_str_or_default(&env_var_or(
            LlmProviderType::ENV_VAR,
            "openai",
        ));
        let llm_api_key = optional_env("LLM_API_KEY");

        let config = Self {
            host: env_var_or("HOST", defaults::HOST),
            http_port: parse_env("HTTP_PORT", defaults::HTTP_PORT)?,
            environment: Environment::from_str_or_default(&env_var_or(
                "ENVIRONMENT",
                "development",
            )),
            storage: StorageConfig {
                data_dir: PathBuf::from(env_var_or("DATA_DIR", defaults::DATA_DIR)),
                job_store: JobStoreKind::from_str_or_default(&env_var_or("JOB_STORE", "file")),
            },
            limits: LimitsConfig {
                max_upload_bytes: parse_env::<u64>("MAX_UPLOAD_MB", defaults::MAX_UPLOAD_MB)?
                    .saturating_mul(BYTES_PER_MB),
                request_timeout_secs: parse_env(
                    "REQUEST_TIMEOUT_SECS",
                    defaults::REQUEST_TIMEOUT_SECS,
                )?,
                pipeline_stage_timeout_secs: parse_env(
                    "PIPELINE_STAGE_TIMEOUT_SECS",
                    defaults::PIPELINE_STAGE_TIMEOUT_SECS,
                )?,
            },
            cors_allowed_origins: parse_origins(&env_var_or("CORS_ALLOWED_ORIGINS", "*")),
            llm: LlmSettings {
                provider: llm_provider,
                base_url: optional_env("LLM_BASE_URL"),
                api_key: llm_api_key.clone(),
                model: optional_env("LLM_MODEL"),
                temperature: parse_env("LLM_TEMPERATURE", defaults::LLM_TEMPERATURE)?,
            },
            sources: SourcesConfig {
                transcript_service: optional_env("TRANSCRIPT_SERVICE_URL").map(|base_url| {
                    TranscriptServiceConfig {
                        base_url,
                        api_key: optional_env("TRANSCRIPT_SERVICE_API_KEY"),
                    }
                }),
                asr: asr_from_env(llm_provider, llm_api_key.as_deref()),
                ytdlp_path: env_var_or("YTDLP_PATH", defaults::YTDLP_PATH),
                download_timeout_secs: parse_env(
                    "DOWNLOAD_TIMEOUT_SECS",
                    defaults::DOWNLOAD_TIMEOUT_SECS,
                )?,
            },
            meals_per_day: parse_env("MEALS_PER_DAY", defaults::MEALS_PER_DAY)?,
        };

        config.validate()?;
        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error for zero limits, out-of-range meals per day, or a
    /// hosted LLM provider without an API key
    pub fn validate(&self) -> Result<()> {
        if self.http_port == 0 {
            return Err(anyhow!("HTTP_PORT must not be 0"));
        }
        if self.limits.max_upload_bytes == 0 {
            return Err(anyhow!("MAX_UPLOAD_MB must be greater than 0"));
        }
        if self.limits.request_timeout_secs == 0 || self.limits.pipeline_stage_timeout_secs == 0 {
            return Err(anyhow!(
                "REQUEST_TIMEOUT_SECS and PIPELINE_STAGE_TIMEOUT_SECS must be greater than 0"
            ));
        }
        if !(1..=limits::MAX_MEALS_PER_DAY).contains(&self.meals_per_day) {
            return Err(anyhow!(
                "MEALS_PER_DAY must be between 1 and {}",
                limits::MAX_MEALS_PER_DAY
            ));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(anyhow!("LLM_TEMPERATURE must be between 0.0 and 2.0"));
        }
        if self.llm.provider.requires_api_key() && self.llm.api_key.is_none() {
            return Err(anyhow!(
                "LLM_API_KEY is required for the {} provider",
                self.llm.provider
            ));
        }

        if self.sources.transcript_service.is_none() {
            warn!("TRANSCRIPT_SERVICE_URL not set, link jobs will rely on download + ASR or captions");
        }
        if self.sources.asr.is_none() {
            warn!("ASR not configured, video uploads will fail and link fallback is limited to captions");
        }

        Ok(())
    }

    /// Ensure the data directories exist
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created
    pub fn ensure_data_dirs(&self) -> Result<()> {
        for dir in [
            self.storage.jobs_dir(),
            self.storage.uploads_dir(),
            self.storage.work_dir(),
        ] {
            create_dir(&dir)?;
        }
        Ok(())
    }

    /// Get a summary of the configuration for logging (without secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        let enabled = |on: bool| if on { "Enabled" } else { "Disabled" };
        format!(
            "Clipchef Server Configuration:\n\
             - Bind: {}:{}\n\
             - Environment: {}\n\
             - Data Dir: {}\n\
             - Job Store: {}\n\
             - Max Upload: {} MB\n\
             - Request Timeout: {}s\n\
             - Stage Timeout: {}s\n\
             - LLM: {} ({} @ {})\n\
             - Transcript Service: {}\n\
             - ASR: {}\n\
             - Meals Per Day: {}",
            self.host,
            self.http_port,
            self.environment,
            self.storage.data_dir.display(),
            self.storage.job_store,
            self.limits.max_upload_bytes / BYTES_PER_MB,
            self.limits.request_timeout_secs,
            self.limits.pipeline_stage_timeout_secs,
            self.llm.provider,
            self.llm.effective_model(),
            self.llm.effective_base_url(),
            enabled(self.sources.transcript_service.is_some()),
            enabled(self.sources.asr.is_some()),
            self.meals_per_day,
        )
    }
}

fn create_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory {}", dir.display()))
}

/// ASR is enabled by an explicit base URL or key, or implicitly when the LLM is `OpenAI`
fn asr_from_env(llm_provider: LlmProviderType, llm_api_key: Option<&str>) -> Option<AsrConfig> {
    let base_url = optional_env("ASR_BASE_URL");
    let api_key = optional_env("ASR_API_KEY");
    let model = env_var_or("ASR_MODEL", defaults::ASR_MODEL);

    match (base_url, api_key) {
        (None, None) if llm_provider == LlmProviderType::OpenAi => {
            llm_api_key.map(|key| AsrConfig {
                base_url: llm_provider.default_base_url().to_owned(),
                api_key: Some(key.to_owned()),
                model,
            })
        }
        (None, None) => None,
        (base_url, api_key) => Some(AsrConfig {
            base_url: base_url
                .unwrap_or_else(|| LlmProviderType::OpenAi.default_base_url().to_owned()),
            api_key,
            model,
        }),
    }
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Get a non-empty environment variable
fn optional_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

/// Parse an environment variable, falling back to `default` when unset
fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: StdError + Send + Sync + 'static,
{
    optional_env(key).map_or(Ok(default), |raw| {
        raw.parse()
            .with_context(|| format!("Invalid {key} value: {raw}"))
    })
}

/// Parse comma-separated CORS origins
fn parse_origins(origins_str: &str) -> Vec<String> {
    if origins_str.trim() == "*" {
        vec!["*".to_owned()]
    } else {
        origins_str
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins() {
        assert_eq!(parse_origins("*"), vec!["*"]);
        assert_eq!(
            parse_origins("http://localhost:8081, https://app.example.com,"),
            vec!["http://localhost:8081", "https://app.example.com"]
        );
    }

    #[test]
    fn test_default_config_requires_llm_key() {
        let mut config = ServerConfig::default();
        assert!(config.validate().is_err());

        config.llm.api_key = Some("sk-test".to_owned());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_zero_limits() {
        let mut config = ServerConfig::default();
        config.llm.provider = LlmProviderType::Ollama;
        config.limits.max_upload_bytes = 0;
        assert!(config.validate().is_err());

        config.limits.max_upload_bytes = 1;
        config.meals_per_day = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_data_dirs() {
        let config = ServerConfig::default();
        assert_eq!(config.storage.jobs_dir(), PathBuf::from("./data/jobs"));
        assert_eq!(config.storage.uploads_dir(), PathBuf::from("./data/uploads"));
    }

    #[test]
    fn test_summary_hides_secrets() {
        let mut config = ServerConfig::default();
        config.llm.api_key = Some("sk-secret".to_owned());
        let summary = config.summary();
        assert!(summary.contains("openai"));
        assert!(!summary.contains("sk-secret"));
    }
}
