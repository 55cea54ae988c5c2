// ABOUTME: Timeout wrappers for pipeline stages and other awaited external calls
// ABOUTME: Converts an elapsed deadline into an ExternalTimeout AppError naming the stage
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

use clipchef_core::errors::{AppError, AppResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

/// Execute an operation under a wall-clock deadline
///
/// # Errors
///
/// Returns `ExternalTimeout` if the deadline passes, otherwise the operation's own error.
///
/// # Example
/// ```rust,no_run
/// use clipchef_server::utils::timeout::with_stage_timeout;
///
/// # async fn example() -> clipchef_core::errors::AppResult<()> {
/// let text = with_stage_timeout("transcript", 30, async {
///     Ok::<_, clipchef_core::errors::AppError>(String::from("..."))
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn with_stage_timeout<F, T, E>(stage: &str, timeout_secs: u64, operation: F) -> AppResult<T>
where
    F: Future<Output = Result<T, E>>,
    E: Into<AppError>,
{
    let duration = Duration::from_secs(timeout_secs);

    (timeout(duration, operation).await).map_or_else(
        |_| Err(AppError::external_timeout(stage, timeout_secs)),
        |result| result.map_err(Into::into),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipchef_core::errors::ErrorCode;

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_deadline_maps_to_timeout() {
        let result: AppResult<()> = with_stage_timeout("slow", 1, async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, AppError>(())
        })
        .await;

        let error = result.unwrap_err();
        assert_eq!(error.code, ErrorCode::ExternalTimeout);
        assert!(error.message.contains("slow"));
    }

    #[tokio::test]
    async fn test_inner_error_passes_through() {
        let result: AppResult<()> =
            with_stage_timeout("fast", 5, async { Err(AppError::invalid_input("nope")) }).await;
        assert_eq!(result.unwrap_err().code, ErrorCode::InvalidInput);
    }
}
