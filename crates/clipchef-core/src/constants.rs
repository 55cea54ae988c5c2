// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Pure data constants shared by the calculation and server crates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

//! Constants grouped by domain rather than kept in a single flat list.

/// Service identity used in logs and health responses
pub mod service_names {
    /// Name of the API server
    pub const CLIPCHEF_SERVER: &str = "clipchef-server";
}

/// Atwater energy densities
pub mod energy {
    /// Kilocalories per gram of protein
    pub const KCAL_PER_G_PROTEIN: f64 = 4.0;
    /// Kilocalories per gram of carbohydrate
    pub const KCAL_PER_G_CARBS: f64 = 4.0;
    /// Kilocalories per gram of fat
    pub const KCAL_PER_G_FAT: f64 = 9.0;
}

/// Unit conversion factors for quiz input
pub mod units {
    /// Kilograms per pound
    pub const KG_PER_LB: f64 = 0.453_592_37;
    /// Centimeters per inch
    pub const CM_PER_INCH: f64 = 2.54;
}

/// Request and domain limits
pub mod limits {
    /// Default page size for `GET /api/jobs`
    pub const DEFAULT_JOB_LIST_LIMIT: usize = 20;
    /// Maximum page size for `GET /api/jobs`
    pub const MAX_JOB_LIST_LIMIT: usize = 100;
    /// Upper bound accepted for meals per day
    pub const MAX_MEALS_PER_DAY: u8 = 8;
    /// Longest accepted link, in bytes
    pub const MAX_URL_LENGTH: usize = 2048;
    /// Longest accepted free-text note on a job
    pub const MAX_NOTE_LENGTH: usize = 2000;
    /// Transcript characters forwarded to the LLM
    pub const MAX_TRANSCRIPT_CHARS: usize = 24_000;
    /// Completion token cap for structured extraction calls
    pub const MAX_COMPLETION_TOKENS: u32 = 4096;
}

/// Default values for environment-driven configuration
pub mod defaults {
    /// Default HTTP port
    pub const HTTP_PORT: u16 = 8080;
    /// Default bind host
    pub const HOST: &str = "0.0.0.0";
    /// Default data directory (jobs, uploads, work files)
    pub const DATA_DIR: &str = "./data";
    /// Default upload limit in megabytes
    pub const MAX_UPLOAD_MB: u64 = 200;
    /// Default timeout for synchronous API requests
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
    /// Deadline for the LLM reachability check behind `/ready`
    pub const LLM_HEALTH_TIMEOUT_SECS: u64 = 5;
    /// Default deadline for a single pipeline stage
    pub const PIPELINE_STAGE_TIMEOUT_SECS: u64 = 180;
    /// Default deadline for a yt-dlp download
    pub const DOWNLOAD_TIMEOUT_SECS: u64 = 120;
    /// Default meals per day used to split daily targets
    pub const MEALS_PER_DAY: u8 = 3;
    /// Default ASR model
    pub const ASR_MODEL: &str = "whisper-1";
    /// Default yt-dlp executable
    pub const YTDLP_PATH: &str = "yt-dlp";
    /// Default LLM sampling temperature for structured extraction
    pub const LLM_TEMPERATURE: f32 = 0.2;
}
