// ABOUTME: Middleware that gives tower-http rejections the JSON error body
// ABOUTME: Rewrites the body-limit 413 and the request-timeout 408 into AppError responses
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use clipchef_core::errors::{AppError, ErrorCode};

fn has_json_body(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"))
}

/// Replace the plain-text 413 sent when `Content-Length` exceeds the upload limit
pub async fn json_payload_too_large(
    State(limit_bytes): State<u64>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    if response.status() == StatusCode::PAYLOAD_TOO_LARGE && !has_json_body(&response) {
        return AppError::payload_too_large(limit_bytes).into_response();
    }
    response
}

/// Replace the empty 408 sent when a handler outlives the request timeout
pub async fn json_request_timeout(
    State(timeout_secs): State<u64>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    if response.status() == StatusCode::REQUEST_TIMEOUT && !has_json_body(&response) {
        return AppError::new(
            ErrorCode::ExternalTimeout,
            format!("Request did not complete within {timeout_secs}s"),
        )
        .into_response();
    }
    response
}
