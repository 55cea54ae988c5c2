// ABOUTME: Unit tests for config environment functionality
// ABOUTME: Validates environment parsing, defaults, ASR inference, and validation errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use clipchef_server::config::{Environment, JobStoreKind, LlmProviderType, ServerConfig};
use serial_test::serial;
use std::env;
use std::path::PathBuf;

const CONFIG_VARS: &[&str] = &[
    "HOST",
    "HTTP_PORT",
    "ENVIRONMENT",
    "DATA_DIR",
    "JOB_STORE",
    "MAX_UPLOAD_MB",
    "REQUEST_TIMEOUT_SECS",
    "PIPELINE_STAGE_TIMEOUT_SECS",
    "CORS_ALLOWED_ORIGINS",
    "LLM_PROVIDER",
    "LLM_BASE_URL",
    "LLM_API_KEY",
    "LLM_MODEL",
    "LLM_TEMPERATURE",
    "TRANSCRIPT_SERVICE_URL",
    "TRANSCRIPT_SERVICE_API_KEY",
    "ASR_BASE_URL",
    "ASR_API_KEY",
    "ASR_MODEL",
    "YTDLP_PATH",
    "DOWNLOAD_TIMEOUT_SECS",
    "MEALS_PER_DAY",
];

fn clear_env() {
    for key in CONFIG_VARS {
        env::remove_var(key);
    }
}

// Tests for public configuration types

#[test]
fn test_environment_parsing() {
    assert_eq!(
        Environment::from_str_or_default("PROD"),
        Environment::Production
    );
    assert_eq!(
        Environment::from_str_or_default("test"),
        Environment::Testing
    );
    assert_eq!(
        Environment::from_str_or_default("invalid"),
        Environment::Development
    );
}

#[test]
fn test_provider_and_store_parsing() {
    assert_eq!(
        LlmProviderType::from_str_or_default("vllm"),
        LlmProviderType::Local
    );
    assert_eq!(
        LlmProviderType::from_str_or_default("unknown"),
        LlmProviderType::OpenAi
    );
    assert!(LlmProviderType::OpenAi.requires_api_key());
    assert!(!LlmProviderType::Ollama.requires_api_key());
    assert_eq!(JobStoreKind::from_str_or_default("mem"), JobStoreKind::Memory);
    assert_eq!(JobStoreKind::from_str_or_default("disk"), JobStoreKind::File);
}

// Tests for loading from the process environment

#[test]
#[serial]
fn test_from_env_with_local_provider_uses_defaults() {
    clear_env();
    env::set_var("LLM_PROVIDER", "ollama");

    let config = ServerConfig::from_env().unwrap();

    assert_eq!(config.http_port, 8080);
    assert_eq!(config.llm.provider, LlmProviderType::Ollama);
    assert_eq!(config.llm.effective_base_url(), "http://localhost:11434/v1");
    assert_eq!(config.storage.job_store, JobStoreKind::File);
    assert_eq!(config.storage.data_dir, PathBuf::from("./data"));
    assert_eq!(config.limits.max_upload_bytes, 200 * 1024 * 1024);
    assert_eq!(config.meals_per_day, 3);
    assert_eq!(config.cors_allowed_origins, vec!["*".to_owned()]);
    assert!(config.sources.transcript_service.is_none());
    assert!(config.sources.asr.is_none());

    clear_env();
}

#[test]
#[serial]
fn test_from_env_reads_overrides() {
    clear_env();
    env::set_var("LLM_PROVIDER", "local");
    env::set_var("LLM_BASE_URL", "http://gpu-box:8000/v1");
    env::set_var("LLM_MODEL", "qwen2.5-vl");
    env::set_var("HTTP_PORT", "9090");
    env::set_var("DATA_DIR", "/var/lib/clipchef");
    env::set_var("JOB_STORE", "memory");
    env::set_var("MAX_UPLOAD_MB", "50");
    env::set_var("CORS_ALLOWED_ORIGINS", "http://localhost:8081, https://app.example.com");
    env::set_var("TRANSCRIPT_SERVICE_URL", "http://transcripts:7000");
    env::set_var("MEALS_PER_DAY", "5");

    let config = ServerConfig::from_env().unwrap();

    assert_eq!(config.http_port, 9090);
    assert_eq!(config.llm.effective_base_url(), "http://gpu-box:8000/v1");
    assert_eq!(config.llm.effective_model(), "qwen2.5-vl");
    assert_eq!(config.storage.jobs_dir(), PathBuf::from("/var/lib/clipchef/jobs"));
    assert_eq!(config.storage.job_store, JobStoreKind::Memory);
    assert_eq!(config.limits.max_upload_bytes, 50 * 1024 * 1024);
    assert_eq!(config.cors_allowed_origins.len(), 2);
    assert_eq!(
        config.sources.transcript_service.as_ref().unwrap().base_url,
        "http://transcripts:7000"
    );
    assert_eq!(config.meals_per_day, 5);

    clear_env();
}

#[test]
#[serial]
fn test_openai_key_enables_speech_to_text() {
    clear_env();
    env::set_var("LLM_PROVIDER", "openai");
    env::set_var("LLM_API_KEY", "sk-test");

    let config = ServerConfig::from_env().unwrap();

    let asr = config.sources.asr.expect("ASR inferred from OpenAI key");
    assert_eq!(asr.base_url, "https://api.openai.com/v1");
    assert_eq!(asr.api_key.as_deref(), Some("sk-test"));

    clear_env();
}

#[test]
#[serial]
fn test_hosted_provider_requires_key() {
    clear_env();
    env::set_var("LLM_PROVIDER", "groq");

    assert!(ServerConfig::from_env().is_err());

    clear_env();
}

#[test]
#[serial]
fn test_invalid_numbers_are_rejected() {
    clear_env();
    env::set_var("LLM_PROVIDER", "ollama");
    env::set_var("HTTP_PORT", "eighty");
    assert!(ServerConfig::from_env().is_err());

    env::set_var("HTTP_PORT", "8080");
    env::set_var("MEALS_PER_DAY", "9");
    assert!(ServerConfig::from_env().is_err());

    clear_env();
}

#[test]
fn test_summary_omits_secrets() {
    let mut config = ServerConfig::default();
    config.llm.api_key = Some("sk-very-secret".to_owned());

    let summary = config.summary();
    assert!(summary.contains("Clipchef Server Configuration"));
    assert!(!summary.contains("sk-very-secret"));
}
