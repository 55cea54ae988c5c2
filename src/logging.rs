// ABOUTME: Logging configuration and structured logging setup for the recipe service
// ABOUTME: Configures log levels, formats, and noise filters plus structured job and LLM events
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

//! Tracing subscriber setup and structured event helpers

use anyhow::Result;
use clipchef_core::constants::service_names;
use std::env;
use std::io;
use std::str::FromStr;
use tracing::{error, info, warn};
use tracing_subscriber::{
    filter::Directive,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

/// Dependencies that are chatty at `info` and below
const QUIET_TARGETS: &[&str] = &[
    "hyper=warn",
    "hyper::proto=warn",
    "h2=warn",
    "reqwest=warn",
    "tower_http=info",
];

/// Output encoding for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line
    Json,
    /// Multi-field human readable lines
    #[default]
    Pretty,
    /// Single-line terse output
    Compact,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Optional detail attached to every event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogDetail {
    /// Source file and line
    pub location: bool,
    /// Thread id and name
    pub thread: bool,
    /// Span open/close events
    pub spans: bool,
}

/// Subscriber settings
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `EnvFilter` directive string, e.g. `info` or `debug,hyper=info`
    pub filter: String,
    /// Output encoding
    pub format: LogFormat,
    /// Extra per-event detail
    pub detail: LogDetail,
    /// Service name reported at startup
    pub service_name: String,
    /// Deployment environment reported at startup
    pub environment: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_owned(),
            format: LogFormat::default(),
            detail: LogDetail::default(),
            service_name: service_names::CLIPCHEF_SERVER.to_owned(),
            environment: "development".to_owned(),
        }
    }
}

/// Read a boolean toggle, falling back when unset or unrecognized
fn env_flag(name: &str, fallback: bool) -> bool {
    match env::var(name).map(|v| v.trim().to_lowercase()).as_deref() {
        Ok("1" | "true" | "yes" | "on") => true,
        Ok("0" | "false" | "no" | "off") => false,
        _ => fallback,
    }
}

impl LoggingConfig {
    /// Build from `RUST_LOG`, `LOG_FORMAT`, `ENVIRONMENT` and the `LOG_INCLUDE_*` toggles
    ///
    /// Production turns on every detail toggle unless explicitly disabled.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let environment = env::var("ENVIRONMENT").unwrap_or(defaults.environment);
        let production = environment.eq_ignore_ascii_case("production");

        let format = match env::var("LOG_FORMAT") {
            Ok(raw) => raw.parse().unwrap_or_default(),
            Err(_) if production => LogFormat::Json,
            Err(_) => LogFormat::Pretty,
        };

        Self {
            filter: env::var("RUST_LOG").unwrap_or(defaults.filter),
            format,
            detail: LogDetail {
                location: env_flag("LOG_INCLUDE_LOCATION", production),
                thread: env_flag("LOG_INCLUDE_THREAD", production),
                spans: env_flag("LOG_INCLUDE_SPANS", production),
            },
            service_name: env::var("SERVICE_NAME").unwrap_or(defaults.service_name),
            environment,
        }
    }

    fn env_filter(&self) -> EnvFilter {
        QUIET_TARGETS
            .iter()
            .filter_map(|target| target.parse::<Directive>().ok())
            .fold(EnvFilter::new(&self.filter), EnvFilter::add_directive)
    }

    fn fmt_layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let span_events = if self.detail.spans {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        let layer = fmt::layer()
            .with_writer(io::stdout)
            .with_file(self.detail.location)
            .with_line_number(self.detail.location)
            .with_thread_ids(self.detail.thread)
            .with_thread_names(self.detail.thread)
            .with_span_events(span_events);

        match self.format {
            LogFormat::Json => layer.json().with_target(true).boxed(),
            LogFormat::Pretty => layer.with_target(true).boxed(),
            LogFormat::Compact => layer.compact().with_target(false).boxed(),
        }
    }

    /// Install the global subscriber
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber is already installed
    pub fn init(&self) -> Result<()> {
        tracing_subscriber::registry()
            .with(self.fmt_layer().with_filter(self.env_filter()))
            .try_init()?;

        info!(
            service.name = %self.service_name,
            service.version = env!("CARGO_PKG_VERSION"),
            environment = %self.environment,
            log.filter = %self.filter,
            log.format = ?self.format,
            log.location = self.detail.location,
            log.thread = self.detail.thread,
            log.spans = self.detail.spans,
            "Logging initialized"
        );
        Ok(())
    }
}

/// Install the global subscriber configured from the environment
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed
pub fn init_from_env() -> Result<()> {
    LoggingConfig::from_env().init()
}


/// Application-specific logging utilities
pub struct AppLogger;

impl AppLogger {
    /// Log a job being accepted by the API
    pub fn log_job_submitted(job_id: &str, source_kind: &str, source: &str) {
        info!(
            job.id = %job_id,
            job.source_kind = %source_kind,
            job.source = %source,
            "Job submitted"
        );
    }

    /// Log a job moving to a new pipeline stage
    pub fn log_job_stage(job_id: &str, stage: &str) {
        info!(
            job.id = %job_id,
            job.stage = %stage,
            "Job stage changed"
        );
    }

    /// Log a job reaching a terminal state
    pub fn log_job_finished(job_id: &str, success: bool, duration_ms: u64, error: Option<&str>) {
        if success {
            info!(
                job.id = %job_id,
                job.success = true,
                job.duration_ms = %duration_ms,
                "Job completed"
            );
        } else {
            error!(
                job.id = %job_id,
                job.success = false,
                job.duration_ms = %duration_ms,
                job.error = error.unwrap_or("unknown"),
                "Job failed"
            );
        }
    }

    /// Log an LLM completion
    pub fn log_llm_call(
        provider: &str,
        model: &str,
        purpose: &str,
        duration_ms: u64,
        tokens: Option<u32>,
    ) {
        info!(
            llm.provider = %provider,
            llm.model = %model,
            llm.purpose = %purpose,
            llm.duration_ms = %duration_ms,
            llm.total_tokens = tokens.unwrap_or(0),
            "LLM call"
        );
    }

    /// Log an external source lookup (transcript, oEmbed, download, ASR)
    pub fn log_source_fetch(source: &str, url: &str, found: bool, duration_ms: u64) {
        info!(
            source.kind = %source,
            source.url = %url,
            source.found = %found,
            source.duration_ms = %duration_ms,
            "Source fetch"
        );
    }

    /// Log a fallback taken inside the pipeline
    pub fn log_fallback(job_id: &str, from: &str, to: &str, reason: &str) {
        warn!(
            job.id = %job_id,
            fallback.from = %from,
            fallback.to = %to,
            fallback.reason = %reason,
            "Pipeline fallback"
        );
    }
}
