// ABOUTME: HTTP integration tests for health check routes
// ABOUTME: Tests liveness and readiness payloads against the full router
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

//! HTTP integration tests for `/health` and `/ready`

mod helpers;

use clipchef_server::errors::AppError;
use helpers::axum_test::AxumTestRequest;
use helpers::fakes::{FakeAsr, ScriptedLlm};
use helpers::harness::TestHarness;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// GET /health
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let harness = TestHarness::builder().build();

    let response = AxumTestRequest::get("/health")
        .send(harness.router())
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "clipchef-server");
    assert!(body["version"].is_string());
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_health_rejects_post() {
    let harness = TestHarness::builder().build();

    let response = AxumTestRequest::post("/health")
        .send(harness.router())
        .await;

    assert_eq!(response.status(), 405);
}

// ============================================================================
// GET /ready
// ============================================================================

#[tokio::test]
async fn test_ready_reports_components() {
    let harness = TestHarness::builder().build();

    let response = AxumTestRequest::get("/ready")
        .send(harness.router())
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["status"], "ready");
    assert_eq!(body["job_store"]["backend"], "memory");
    assert_eq!(body["job_store"]["reachable"], true);
    assert!(body["job_store"]["error"].is_null());
    assert_eq!(body["llm"]["provider"], "scripted");
    assert_eq!(body["llm"]["model"], "scripted-model");
    assert_eq!(body["llm"]["vision"], false);
    assert_eq!(body["llm"]["reachable"], true);
    assert_eq!(body["speech_to_text"], false);
}

#[tokio::test]
async fn test_ready_reflects_optional_capabilities() {
    let harness = TestHarness::builder()
        .llm(Arc::new(ScriptedLlm::with_vision()))
        .asr(Arc::new(FakeAsr::saying("hello")))
        .build();

    let body: Value = AxumTestRequest::get("/ready")
        .send(harness.router())
        .await
        .json();

    assert_eq!(body["llm"]["vision"], true);
    assert_eq!(body["speech_to_text"], true);
}

#[tokio::test]
async fn test_ready_reports_unreachable_llm_without_failing() {
    let llm = Arc::new(ScriptedLlm::new());
    llm.fail_health(AppError::external_service("scripted", "connection refused"));
    let harness = TestHarness::builder().llm(llm).build();

    let response = AxumTestRequest::get("/ready")
        .send(harness.router())
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json();
    assert_eq!(body["status"], "ready");
    assert_eq!(body["llm"]["reachable"], false);
    assert!(body["llm"]["error"]
        .as_str()
        .unwrap()
        .contains("connection refused"));
}

#[tokio::test(start_paused = true)]
async fn test_request_timeout_answers_with_json_error() {
    let llm = Arc::new(ScriptedLlm::new());
    llm.stall_health(Duration::from_secs(60));
    let harness = TestHarness::builder()
        .llm(llm)
        .request_timeout_secs(1)
        .build();

    let response = AxumTestRequest::get("/ready")
        .send(harness.router())
        .await;

    assert_eq!(response.status(), 504);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "EXTERNAL_TIMEOUT");
    assert!(body["error"]["message"].as_str().unwrap().contains("1s"));
}
