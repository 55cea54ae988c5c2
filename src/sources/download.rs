// ABOUTME: Audio download for the speech-to-text fallback using the yt-dlp executable
// ABOUTME: Runs yt-dlp under a deadline and returns the path of the audio file it wrote
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

use super::link::VideoLink;
use async_trait::async_trait;
use clipchef_core::errors::{AppError, ErrorCode};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::fs;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

/// Largest audio file yt-dlp may write
const MAX_AUDIO_FILESIZE: &str = "50M";

/// Fetches a video's audio track to local disk
#[async_trait]
pub trait VideoDownloader: Send + Sync {
    /// Download audio for `link` into `work_dir` and return the file path
    async fn download_audio(&self, link: &VideoLink, work_dir: &Path) -> Result<PathBuf, AppError>;
}

/// `yt-dlp` backed downloader
#[derive(Debug, Clone)]
pub struct YtDlpDownloader {
    executable: String,
    timeout: Duration,
}

impl YtDlpDownloader {
    /// Create a downloader using `executable` with a per-download deadline
    #[must_use]
    pub fn new(executable: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            executable: executable.into(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    fn command(&self, link: &VideoLink, work_dir: &Path) -> TokioCommand {
        let template = work_dir.join("audio.%(ext)s");
        let mut command = TokioCommand::new(&self.executable);
        command
            .arg("--no-playlist")
            .arg("--no-progress")
            .arg("--no-warnings")
            .args(["-f", "bestaudio[ext=m4a]/bestaudio/best"])
            .args(["--max-filesize", MAX_AUDIO_FILESIZE])
            .arg("-o")
            .arg(&template)
            .args(["--print", "after_move:filepath"])
            .arg(&link.normalized)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl VideoDownloader for YtDlpDownloader {
    #[instrument(skip(self, work_dir), fields(url = %link.normalized))]
    async fn download_audio(&self, link: &VideoLink, work_dir: &Path) -> Result<PathBuf, AppError> {
        fs::create_dir_all(work_dir).await?;

        let output = match timeout(self.timeout, self.command(link, work_dir).output()).await {
            Err(_) => {
                return Err(AppError::external_timeout(
                    "yt-dlp",
                    self.timeout.as_secs(),
                ))
            }
            Ok(Err(e)) if e.kind() == ErrorKind::NotFound => {
                return Err(AppError::new(
                    ErrorCode::ExternalServiceUnavailable,
                    format!("yt-dlp executable not found at '{}'", self.executable),
                ))
            }
            Ok(Err(e)) => {
                return Err(AppError::internal(format!("Failed to run yt-dlp: {e}")).with_source(e))
            }
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(status = ?output.status.code(), "yt-dlp failed");
            return Err(AppError::external_service(
                "yt-dlp",
                stderr.lines().last().unwrap_or("download failed").to_owned(),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let path = stdout
            .lines()
            .map(str::trim)
            .rfind(|line| !line.is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| AppError::external_service("yt-dlp", "no output file reported"))?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(AppError::external_service(
                "yt-dlp",
                format!("reported file {} does not exist", path.display()),
            ));
        }

        debug!(path = %path.display(), "Audio downloaded");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_executable_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = YtDlpDownloader::new("/nonexistent/yt-dlp-binary", 5);
        let link = VideoLink::parse("https://youtu.be/dQw4w9WgXcQ").unwrap();

        let error = downloader
            .download_audio(&link, dir.path())
            .await
            .unwrap_err();
        assert_eq!(error.code, ErrorCode::ExternalServiceUnavailable);
    }
}
